// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interfaces to the systems the engine consults but does not own.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use solace_authz_core::{ActorId, Resource};

use crate::error::CollaboratorError;

/// Account state relevant to authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
	pub is_active: bool,
	pub locked_until: Option<DateTime<Utc>>,
}

impl AccountStatus {
	pub fn active() -> Self {
		Self {
			is_active: true,
			locked_until: None,
		}
	}

	pub fn inactive() -> Self {
		Self {
			is_active: false,
			locked_until: None,
		}
	}

	pub fn locked_until(until: DateTime<Utc>) -> Self {
		Self {
			is_active: true,
			locked_until: Some(until),
		}
	}

	/// A lock only counts while its expiry is in the future.
	pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
		self.locked_until.is_some_and(|until| until > now)
	}

	pub fn is_locked(&self) -> bool {
		self.is_locked_at(Utc::now())
	}
}

/// Looks up whether an actor's account may currently act.
#[async_trait]
pub trait AccountStatusProvider: Send + Sync {
	/// Returns `None` for an unknown actor.
	async fn get_status(&self, actor_id: ActorId) -> Result<Option<AccountStatus>, CollaboratorError>;
}

/// Resolves the owner of one resource instance.
///
/// Implementations return `Ok(None)` when the instance does not exist.
#[async_trait]
pub trait ResourceOwnerResolver: Send + Sync {
	async fn resolve_owner(
		&self,
		resource: Resource,
		resource_id: &str,
	) -> Result<Option<ActorId>, CollaboratorError>;
}

/// One owner resolver per resource type.
#[derive(Clone, Default)]
pub struct OwnerResolverRegistry {
	resolvers: HashMap<Resource, Arc<dyn ResourceOwnerResolver>>,
}

impl std::fmt::Debug for OwnerResolverRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut resources: Vec<&Resource> = self.resolvers.keys().collect();
		resources.sort();
		f.debug_struct("OwnerResolverRegistry")
			.field("resources", &resources)
			.finish()
	}
}

impl OwnerResolverRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, resource: Resource, resolver: Arc<dyn ResourceOwnerResolver>) {
		self.resolvers.insert(resource, resolver);
	}

	pub fn with(mut self, resource: Resource, resolver: Arc<dyn ResourceOwnerResolver>) -> Self {
		self.register(resource, resolver);
		self
	}

	pub fn get(&self, resource: Resource) -> Option<&Arc<dyn ResourceOwnerResolver>> {
		self.resolvers.get(&resource)
	}

	pub fn len(&self) -> usize {
		self.resolvers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.resolvers.is_empty()
	}
}

/// Account statuses held in memory.
///
/// Unknown actors get the fallback status when one is configured, which is
/// how the CLI evaluates checks without an account database.
#[derive(Debug, Default)]
pub struct InMemoryAccountStatusProvider {
	statuses: RwLock<HashMap<ActorId, AccountStatus>>,
	fallback: Option<AccountStatus>,
}

impl InMemoryAccountStatusProvider {
	pub fn new() -> Self {
		Self::default()
	}

	/// Treats every unknown actor as active.
	pub fn assume_active() -> Self {
		Self {
			statuses: RwLock::new(HashMap::new()),
			fallback: Some(AccountStatus::active()),
		}
	}

	pub fn set(&self, actor_id: ActorId, status: AccountStatus) {
		self.statuses.write().insert(actor_id, status);
	}

	pub fn remove(&self, actor_id: ActorId) -> Option<AccountStatus> {
		self.statuses.write().remove(&actor_id)
	}
}

#[async_trait]
impl AccountStatusProvider for InMemoryAccountStatusProvider {
	async fn get_status(&self, actor_id: ActorId) -> Result<Option<AccountStatus>, CollaboratorError> {
		Ok(
			self
				.statuses
				.read()
				.get(&actor_id)
				.cloned()
				.or_else(|| self.fallback.clone()),
		)
	}
}

/// Owners held in memory, keyed by resource instance id.
#[derive(Debug, Default)]
pub struct InMemoryOwnerResolver {
	owners: RwLock<HashMap<String, ActorId>>,
}

impl InMemoryOwnerResolver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, resource_id: impl Into<String>, owner: ActorId) {
		self.owners.write().insert(resource_id.into(), owner);
	}
}

#[async_trait]
impl ResourceOwnerResolver for InMemoryOwnerResolver {
	async fn resolve_owner(
		&self,
		_resource: Resource,
		resource_id: &str,
	) -> Result<Option<ActorId>, CollaboratorError> {
		Ok(self.owners.read().get(resource_id).copied())
	}
}
