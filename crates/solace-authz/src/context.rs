// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use serde_json::{Map, Value};
use solace_authz_core::{ActorId, ConditionContext, RoleName};
use tokio::time::Instant;

/// Who is asking, about what, and under which circumstances.
#[derive(Debug, Clone)]
pub struct RequestContext {
	pub actor_id: ActorId,
	pub role: RoleName,
	pub resource_id: Option<String>,
	/// Owner already known to the caller; skips owner resolution.
	pub owner_id: Option<ActorId>,
	/// Free-form attributes consumed by custom predicates.
	pub extras: Map<String, Value>,
	/// Deadline for collaborator calls made on behalf of this request.
	pub deadline: Option<Instant>,
	pub request_id: Option<String>,
}

impl RequestContext {
	pub fn new(actor_id: ActorId, role: impl Into<RoleName>) -> Self {
		Self {
			actor_id,
			role: role.into(),
			resource_id: None,
			owner_id: None,
			extras: Map::new(),
			deadline: None,
			request_id: None,
		}
	}

	pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
		self.resource_id = Some(resource_id.into());
		self
	}

	pub fn with_owner(mut self, owner_id: ActorId) -> Self {
		self.owner_id = Some(owner_id);
		self
	}

	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.extras.insert(key.into(), value.into());
		self
	}

	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(deadline);
		self
	}

	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());
		self
	}

	pub(crate) fn condition_context(&self, owner_id: Option<ActorId>) -> ConditionContext<'_> {
		ConditionContext {
			actor_id: self.actor_id,
			role: self.role.as_str(),
			resource_id: self.resource_id.as_deref(),
			owner_id,
			extras: &self.extras,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_sets_fields() {
		let actor = ActorId::generate();
		let owner = ActorId::generate();
		let ctx = RequestContext::new(actor, "therapist")
			.with_resource_id("note-7")
			.with_owner(owner)
			.with_extra("care_team_member", true)
			.with_request_id("req-1");

		assert_eq!(ctx.role.as_str(), "therapist");
		assert_eq!(ctx.resource_id.as_deref(), Some("note-7"));
		assert_eq!(ctx.owner_id, Some(owner));
		assert_eq!(ctx.extras.get("care_team_member"), Some(&Value::Bool(true)));
		assert!(ctx.deadline.is_none());
	}

	#[test]
	fn condition_context_carries_resolved_owner() {
		let actor = ActorId::generate();
		let ctx = RequestContext::new(actor, "user").with_extra("crisis_active", true);
		let cond = ctx.condition_context(Some(actor));

		assert_eq!(cond.owner_id, Some(actor));
		assert!(cond.flag("crisis_active"));
	}

	#[tokio::test]
	async fn with_timeout_sets_future_deadline() {
		let ctx = RequestContext::new(ActorId::generate(), "user").with_timeout(Duration::from_secs(1));
		assert!(ctx.deadline.is_some_and(|d| d > Instant::now()));
	}
}
