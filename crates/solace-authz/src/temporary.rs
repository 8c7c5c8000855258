// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Time-bounded, revocable grants for a single actor.
//!
//! A temporary grant lets an authorised grantor delegate one
//! (resource, action) pair to another actor until an expiry. Active grants
//! are merged into the actor's effective permissions as unconditional
//! grants. Every creation and revocation is audited and drops the
//! beneficiary's cached verdicts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use solace_authz_audit::{AuditEventType, AuditLogEntry, AuditOutcome};
use solace_authz_core::{Action, ActorId, Grant, Resource, TemporaryGrantId};
use tracing::{info, instrument, warn};

use crate::context::RequestContext;
use crate::error::{AuthzError, AuthzResult, CollaboratorError};
use crate::service::AuthorizationService;

/// A delegated permission with an expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryGrant {
	pub id: TemporaryGrantId,
	/// Actor receiving the permission.
	pub beneficiary_id: ActorId,
	/// Actor who created the grant.
	pub granted_by: ActorId,
	pub resource: Resource,
	pub action: Action,
	/// Justification recorded with the grant.
	pub reason: String,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	pub revoked_at: Option<DateTime<Utc>>,
	pub revoked_by: Option<ActorId>,
}

impl TemporaryGrant {
	pub fn new(
		beneficiary_id: ActorId,
		granted_by: ActorId,
		resource: Resource,
		action: Action,
		expires_at: DateTime<Utc>,
		reason: impl Into<String>,
	) -> Self {
		Self {
			id: TemporaryGrantId::generate(),
			beneficiary_id,
			granted_by,
			resource,
			action,
			reason: reason.into(),
			created_at: Utc::now(),
			expires_at,
			revoked_at: None,
			revoked_by: None,
		}
	}

	/// Check if the grant is in force at `now` (not revoked, not expired).
	pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
		self.revoked_at.is_none() && now < self.expires_at
	}

	pub fn is_active(&self) -> bool {
		self.is_active_at(Utc::now())
	}

	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	pub fn applies_to(&self, resource: Resource, action: Action) -> bool {
		self.resource == resource && self.action == action
	}

	/// The permission this grant confers. Always unconditional.
	pub fn as_grant(&self) -> Grant {
		Grant::new(self.resource, self.action)
	}

	pub fn revoke(&mut self, by: ActorId, at: DateTime<Utc>) {
		self.revoked_at = Some(at);
		self.revoked_by = Some(by);
	}
}

/// Storage for temporary grant records.
#[async_trait]
pub trait TemporaryGrantStore: Send + Sync {
	async fn create_grant(&self, grant: &TemporaryGrant) -> Result<(), CollaboratorError>;

	async fn get_grant(
		&self,
		id: TemporaryGrantId,
	) -> Result<Option<TemporaryGrant>, CollaboratorError>;

	/// Every record for the actor, active or not, oldest first.
	async fn list_grants_for_actor(
		&self,
		actor_id: ActorId,
	) -> Result<Vec<TemporaryGrant>, CollaboratorError>;

	/// Grants in force for the actor at `now`.
	async fn list_active_grants(
		&self,
		actor_id: ActorId,
		now: DateTime<Utc>,
	) -> Result<Vec<TemporaryGrant>, CollaboratorError> {
		Ok(
			self
				.list_grants_for_actor(actor_id)
				.await?
				.into_iter()
				.filter(|g| g.is_active_at(now))
				.collect(),
		)
	}

	/// Marks the grant revoked. Returns false if it was missing or already revoked.
	async fn revoke_grant(
		&self,
		id: TemporaryGrantId,
		revoked_by: ActorId,
		revoked_at: DateTime<Utc>,
	) -> Result<bool, CollaboratorError>;
}

/// Temporary grants held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTemporaryGrantStore {
	grants: RwLock<HashMap<TemporaryGrantId, TemporaryGrant>>,
}

impl InMemoryTemporaryGrantStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.grants.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.grants.read().is_empty()
	}
}

#[async_trait]
impl TemporaryGrantStore for InMemoryTemporaryGrantStore {
	async fn create_grant(&self, grant: &TemporaryGrant) -> Result<(), CollaboratorError> {
		self.grants.write().insert(grant.id, grant.clone());
		Ok(())
	}

	async fn get_grant(
		&self,
		id: TemporaryGrantId,
	) -> Result<Option<TemporaryGrant>, CollaboratorError> {
		Ok(self.grants.read().get(&id).cloned())
	}

	async fn list_grants_for_actor(
		&self,
		actor_id: ActorId,
	) -> Result<Vec<TemporaryGrant>, CollaboratorError> {
		let mut grants: Vec<TemporaryGrant> = self
			.grants
			.read()
			.values()
			.filter(|g| g.beneficiary_id == actor_id)
			.cloned()
			.collect();
		grants.sort_by_key(|g| g.created_at);
		Ok(grants)
	}

	async fn revoke_grant(
		&self,
		id: TemporaryGrantId,
		revoked_by: ActorId,
		revoked_at: DateTime<Utc>,
	) -> Result<bool, CollaboratorError> {
		let mut grants = self.grants.write();
		match grants.get_mut(&id) {
			Some(grant) if !grant.is_revoked() => {
				grant.revoke(revoked_by, revoked_at);
				Ok(true)
			}
			_ => Ok(false),
		}
	}
}

// =============================================================================
// Lifecycle
// =============================================================================

impl AuthorizationService {
	/// Delegates `(resource, action)` to `beneficiary` until `expires_at`.
	///
	/// The grantor must hold `temporary_grant:create` and, unless they hold
	/// the super role, an unconditional grant for the delegated pair.
	#[instrument(
		skip_all,
		fields(grantor = %grantor.actor_id, %beneficiary, %resource, %action)
	)]
	pub async fn grant_temporary(
		&self,
		grantor: &RequestContext,
		beneficiary: ActorId,
		resource: Resource,
		action: Action,
		expires_at: DateTime<Utc>,
		reason: &str,
	) -> AuthzResult<TemporaryGrantId> {
		let check = self
			.check_permission(grantor, Resource::TemporaryGrant, Action::Create, true)
			.await;
		if !check.allowed {
			warn!(reason = %check.reason, "temporary grant refused");
			return Err(AuthzError::InsufficientPermissions {
				resource: Resource::TemporaryGrant,
				action: Action::Create,
			});
		}

		if !self.is_super_role(grantor.role.as_str()) {
			let held = self.resolver.resolve(grantor.role.as_str());
			if !held.get(resource, action).is_some_and(Grant::is_unconditional) {
				warn!("grantor cannot delegate a permission they do not hold");
				return Err(AuthzError::Forbidden(format!(
					"grantor does not hold {resource}:{action} unconditionally"
				)));
			}
		}

		if reason.trim().is_empty() {
			return Err(AuthzError::MissingReason);
		}

		let now = Utc::now();
		if expires_at <= now {
			return Err(AuthzError::InvalidExpiry(
				"expiry must be in the future".to_string(),
			));
		}
		let max = self.temporary_config.max_duration_secs;
		if (expires_at - now).num_seconds() > max as i64 {
			return Err(AuthzError::InvalidExpiry(format!(
				"expiry exceeds the maximum of {max} seconds"
			)));
		}

		let grant = TemporaryGrant::new(
			beneficiary,
			grantor.actor_id,
			resource,
			action,
			expires_at,
			reason.trim(),
		);
		self
			.call(
				"temporary grant create",
				grantor.deadline,
				self.temporary_grants.create_grant(&grant),
			)
			.await?;

		self.cache.invalidate_actor(beneficiary);

		let mut entry = AuditLogEntry::builder(AuditEventType::TemporaryGrantCreated)
			.outcome(AuditOutcome::Succeeded)
			.actor(grantor.actor_id)
			.role(grantor.role.as_str())
			.resource(resource.as_str(), grant.id.to_string())
			.action(action.as_str())
			.reason(grant.reason.clone())
			.details(json!({
				"grant_id": grant.id,
				"beneficiary_id": beneficiary,
				"expires_at": expires_at,
			}));
		if let Some(request_id) = &grantor.request_id {
			entry = entry.request_id(request_id.clone());
		}
		self.emit(entry.build()).await;

		info!(grant_id = %grant.id, %expires_at, "temporary grant created");
		Ok(grant.id)
	}

	/// Revokes a temporary grant. Allowed for the original grantor or anyone
	/// holding `temporary_grant:delete`.
	#[instrument(skip_all, fields(revoker = %revoker.actor_id, %grant_id))]
	pub async fn revoke_temporary(
		&self,
		revoker: &RequestContext,
		grant_id: TemporaryGrantId,
	) -> AuthzResult<()> {
		let grant = self
			.call(
				"temporary grant lookup",
				revoker.deadline,
				self.temporary_grants.get_grant(grant_id),
			)
			.await?
			.ok_or(AuthzError::NotFound(grant_id))?;

		if grant.is_revoked() {
			return Err(AuthzError::AlreadyRevoked(grant_id));
		}

		if grant.granted_by != revoker.actor_id {
			let check = self
				.check_permission(revoker, Resource::TemporaryGrant, Action::Delete, true)
				.await;
			if !check.allowed {
				warn!(reason = %check.reason, "temporary grant revocation refused");
				return Err(AuthzError::InsufficientPermissions {
					resource: Resource::TemporaryGrant,
					action: Action::Delete,
				});
			}
		}

		let revoked = self
			.call(
				"temporary grant revoke",
				revoker.deadline,
				self
					.temporary_grants
					.revoke_grant(grant_id, revoker.actor_id, Utc::now()),
			)
			.await?;
		if !revoked {
			return Err(AuthzError::AlreadyRevoked(grant_id));
		}

		self.cache.invalidate_actor(grant.beneficiary_id);

		let mut entry = AuditLogEntry::builder(AuditEventType::TemporaryGrantRevoked)
			.outcome(AuditOutcome::Succeeded)
			.actor(revoker.actor_id)
			.role(revoker.role.as_str())
			.resource(grant.resource.as_str(), grant_id.to_string())
			.action(grant.action.as_str())
			.details(json!({
				"grant_id": grant_id,
				"beneficiary_id": grant.beneficiary_id,
				"granted_by": grant.granted_by,
			}));
		if let Some(request_id) = &revoker.request_id {
			entry = entry.request_id(request_id.clone());
		}
		self.emit(entry.build()).await;

		info!(beneficiary = %grant.beneficiary_id, "temporary grant revoked");
		Ok(())
	}

	/// Grants currently in force for the actor, as unconditional grants.
	pub async fn list_active_temporary(&self, actor_id: ActorId) -> AuthzResult<Vec<Grant>> {
		let grants = self
			.call(
				"temporary grant lookup",
				None,
				self.temporary_grants.list_active_grants(actor_id, Utc::now()),
			)
			.await?;
		Ok(grants.iter().map(TemporaryGrant::as_grant).collect())
	}

	/// Every temporary grant record for the actor, including expired and
	/// revoked ones.
	pub async fn list_temporary(&self, actor_id: ActorId) -> AuthzResult<Vec<TemporaryGrant>> {
		Ok(
			self
				.call(
					"temporary grant lookup",
					None,
					self.temporary_grants.list_grants_for_actor(actor_id),
				)
				.await?,
		)
	}

	/// Shared handle to the grant store.
	pub fn temporary_grant_store(&self) -> Arc<dyn TemporaryGrantStore> {
		Arc::clone(&self.temporary_grants)
	}
}
