// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures: collaborators that count their calls, and a harness that
//! wires them into an [`AuthorizationService`] with an in-memory audit sink.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solace_authz::{
	AccountStatus, AccountStatusProvider, AuthorizationService, CollaboratorError,
	InMemoryAccountStatusProvider, InMemoryOwnerResolver, InMemoryTemporaryGrantStore,
	RequestContext, ResourceOwnerResolver, TemporaryGrant, TemporaryGrantStore,
};
use solace_authz_audit::{AuditSink, MemoryAuditSink};
use solace_authz_config::AuthzConfig;
use solace_authz_core::{default_catalog, ActorId, Catalog, Resource, TemporaryGrantId};

// ============================================================================
// Counting collaborators
// ============================================================================

#[derive(Default)]
pub struct CountingAccounts {
	pub inner: InMemoryAccountStatusProvider,
	pub calls: AtomicUsize,
	pub fail: AtomicBool,
	pub delay: Option<Duration>,
}

impl CountingAccounts {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl AccountStatusProvider for CountingAccounts {
	async fn get_status(&self, actor_id: ActorId) -> Result<Option<AccountStatus>, CollaboratorError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if self.fail.load(Ordering::SeqCst) {
			return Err(CollaboratorError::Unavailable("account store down".to_string()));
		}
		self.inner.get_status(actor_id).await
	}
}

#[derive(Default)]
pub struct CountingOwners {
	pub inner: InMemoryOwnerResolver,
	pub calls: AtomicUsize,
	pub fail: AtomicBool,
}

impl CountingOwners {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ResourceOwnerResolver for CountingOwners {
	async fn resolve_owner(
		&self,
		resource: Resource,
		resource_id: &str,
	) -> Result<Option<ActorId>, CollaboratorError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail.load(Ordering::SeqCst) {
			return Err(CollaboratorError::Storage("owner lookup failed".to_string()));
		}
		self.inner.resolve_owner(resource, resource_id).await
	}
}

#[derive(Default)]
pub struct CountingGrants {
	pub inner: InMemoryTemporaryGrantStore,
	pub calls: AtomicUsize,
}

impl CountingGrants {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Inserts a record directly, bypassing lifecycle validation.
	pub async fn seed(&self, grant: &TemporaryGrant) {
		self.inner.create_grant(grant).await.unwrap();
	}
}

#[async_trait]
impl TemporaryGrantStore for CountingGrants {
	async fn create_grant(&self, grant: &TemporaryGrant) -> Result<(), CollaboratorError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.create_grant(grant).await
	}

	async fn get_grant(
		&self,
		id: TemporaryGrantId,
	) -> Result<Option<TemporaryGrant>, CollaboratorError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.get_grant(id).await
	}

	async fn list_grants_for_actor(
		&self,
		actor_id: ActorId,
	) -> Result<Vec<TemporaryGrant>, CollaboratorError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_grants_for_actor(actor_id).await
	}

	async fn list_active_grants(
		&self,
		actor_id: ActorId,
		now: DateTime<Utc>,
	) -> Result<Vec<TemporaryGrant>, CollaboratorError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.list_active_grants(actor_id, now).await
	}

	async fn revoke_grant(
		&self,
		id: TemporaryGrantId,
		revoked_by: ActorId,
		revoked_at: DateTime<Utc>,
	) -> Result<bool, CollaboratorError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.revoke_grant(id, revoked_by, revoked_at).await
	}
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
	pub service: AuthorizationService,
	pub accounts: Arc<CountingAccounts>,
	pub owners: Arc<CountingOwners>,
	pub grants: Arc<CountingGrants>,
	pub audit: Arc<MemoryAuditSink>,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_catalog(default_catalog())
	}

	pub fn with_catalog(catalog: Catalog) -> Self {
		Self::build(catalog, CountingAccounts::default(), AuthzConfig::default())
	}

	pub fn build(catalog: Catalog, accounts: CountingAccounts, config: AuthzConfig) -> Self {
		let accounts = Arc::new(accounts);
		let owners = Arc::new(CountingOwners::default());
		let grants = Arc::new(CountingGrants::default());
		let audit = Arc::new(MemoryAuditSink::default());

		let service = AuthorizationService::builder(Arc::new(catalog), accounts.clone())
			.config(&config)
			.owner_resolver(Resource::MoodEntry, owners.clone())
			.owner_resolver(Resource::JournalEntry, owners.clone())
			.temporary_grants(grants.clone())
			.audit_sink(audit.clone() as Arc<dyn AuditSink>)
			.build();

		Self {
			service,
			accounts,
			owners,
			grants,
			audit,
		}
	}

	/// Registers an active account and returns a context for it.
	pub fn actor(&self, role: &str) -> RequestContext {
		let actor_id = ActorId::generate();
		self.accounts.inner.set(actor_id, AccountStatus::active());
		RequestContext::new(actor_id, role)
	}

	pub fn set_status(&self, actor_id: ActorId, status: AccountStatus) {
		self.accounts.inner.set(actor_id, status);
	}

	pub fn collaborator_calls(&self) -> usize {
		self.accounts.calls() + self.owners.calls() + self.grants.calls()
	}
}
