// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grants and their conditions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resource::{Action, Resource};
use crate::types::PredicateId;

/// A predicate narrowing when a [`Grant`] applies.
///
/// Conditions are data only. Custom predicates are referenced by id and
/// resolved through a [`crate::ConditionRegistry`] at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
	/// The actor must be the resolved owner of the resource instance.
	Ownership,
	/// A named predicate from the condition registry must hold.
	Custom { predicate: PredicateId },
}

impl Condition {
	pub fn custom(predicate: impl Into<PredicateId>) -> Self {
		Condition::Custom {
			predicate: predicate.into(),
		}
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Condition::Ownership => f.write_str("ownership"),
			Condition::Custom { predicate } => write!(f, "custom:{predicate}"),
		}
	}
}

/// The (resource, action) pair a grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
	pub resource: Resource,
	pub action: Action,
}

impl PermissionKey {
	pub fn new(resource: Resource, action: Action) -> Self {
		Self { resource, action }
	}
}

impl fmt::Display for PermissionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.resource, self.action)
	}
}

/// A permission unit attached to a role: (resource, action, conditions).
///
/// Conditions combine with AND semantics; an empty list is unconditional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
	pub resource: Resource,
	pub action: Action,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub conditions: Vec<Condition>,
}

impl Grant {
	/// Creates an unconditional grant.
	pub fn new(resource: Resource, action: Action) -> Self {
		Self {
			resource,
			action,
			conditions: Vec::new(),
		}
	}

	/// Creates a grant that only applies to resources the actor owns.
	pub fn owned(resource: Resource, action: Action) -> Self {
		Self::new(resource, action).with_condition(Condition::Ownership)
	}

	/// Creates a grant gated by a named custom predicate.
	pub fn when(resource: Resource, action: Action, predicate: impl Into<PredicateId>) -> Self {
		Self::new(resource, action).with_condition(Condition::custom(predicate))
	}

	pub fn with_condition(mut self, condition: Condition) -> Self {
		self.conditions.push(condition);
		self
	}

	pub fn key(&self) -> PermissionKey {
		PermissionKey::new(self.resource, self.action)
	}

	pub fn is_unconditional(&self) -> bool {
		self.conditions.is_empty()
	}

	pub fn applies_to(&self, resource: Resource, action: Action) -> bool {
		self.resource == resource && self.action == action
	}
}

impl fmt::Display for Grant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.resource, self.action)?;
		if !self.conditions.is_empty() {
			let conditions: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
			write!(f, " [{}]", conditions.join(", "))?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unconditional_grant_has_no_conditions() {
		let grant = Grant::new(Resource::MoodEntry, Action::Create);
		assert!(grant.is_unconditional());
		assert!(grant.applies_to(Resource::MoodEntry, Action::Create));
		assert!(!grant.applies_to(Resource::MoodEntry, Action::Read));
	}

	#[test]
	fn owned_grant_carries_ownership_condition() {
		let grant = Grant::owned(Resource::MoodEntry, Action::Read);
		assert_eq!(grant.conditions, vec![Condition::Ownership]);
		assert_eq!(grant.to_string(), "mood_entry:read [ownership]");
	}

	#[test]
	fn conditions_serialize_as_tagged_variants() {
		let grant = Grant::when(Resource::TherapyNote, Action::Read, "active_crisis");
		let json = serde_json::to_value(&grant).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"resource": "therapy_note",
				"action": "read",
				"conditions": [{ "type": "custom", "predicate": "active_crisis" }]
			})
		);
	}

	#[test]
	fn unconditional_grant_omits_conditions_field() {
		let json = serde_json::to_value(Grant::new(Resource::Report, Action::List)).unwrap();
		assert!(json.get("conditions").is_none());

		let parsed: Grant =
			serde_json::from_str(r#"{"resource":"report","action":"list"}"#).unwrap();
		assert!(parsed.is_unconditional());
	}

	#[test]
	fn permission_key_display() {
		let key = PermissionKey::new(Resource::AuditLog, Action::Export);
		assert_eq!(key.to_string(), "audit_log:export");
	}
}
