// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorization façade.
//!
//! Every check runs the same fail-closed sequence:
//!
//! 1. cached verdict, unless the caller skips the cache
//! 2. account status (unknown, inactive or locked accounts are denied)
//! 3. super-role bypass, always audited
//! 4. role grants, with ownership and custom conditions
//! 5. active temporary grants
//!
//! Collaborator failures and panics inside the sequence become a
//! `system error` denial and are audited. A role missing from the catalog is
//! denied before any grant is consulted. Nothing in here returns an error to the caller.

use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use serde_json::json;
use solace_authz_audit::{
	AuditEventType, AuditFilterConfig, AuditLogBuilder, AuditLogEntry, AuditOutcome,
	AuditSeverity, AuditSink, TracingAuditSink,
};
use solace_authz_config::{AuthzConfig, RolesConfig, TemporaryGrantsConfig};
use solace_authz_core::{
	is_sensitive, Action, ActorId, Catalog, Condition, ConditionRegistry, PermissionKey,
	PermissionResolver, Resource, ResourcePermissions,
};
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::cache::{CacheKey, CacheStats, DecisionCache};
use crate::collaborators::{AccountStatusProvider, OwnerResolverRegistry, ResourceOwnerResolver};
use crate::context::RequestContext;
use crate::error::CollaboratorError;
use crate::temporary::{InMemoryTemporaryGrantStore, TemporaryGrantStore};
use crate::verdict::{
	Verdict, REASON_INACTIVE, REASON_LOCKED, REASON_NOT_FOUND, REASON_SUPER_ROLE,
	REASON_SYSTEM_ERROR, REASON_TEMPORARY_GRANT, REASON_UNKNOWN_ACTION, REASON_UNKNOWN_RESOURCE,
};

/// Answers "may this actor do this" and manages delegated access.
///
/// Built with [`AuthorizationService::builder`]. All shared state (catalog,
/// resolver, cache) is owned by the instance; there are no globals.
pub struct AuthorizationService {
	pub(crate) resolver: Arc<PermissionResolver>,
	pub(crate) conditions: ConditionRegistry,
	pub(crate) cache: Arc<DecisionCache>,
	pub(crate) accounts: Arc<dyn AccountStatusProvider>,
	pub(crate) owners: OwnerResolverRegistry,
	pub(crate) temporary_grants: Arc<dyn TemporaryGrantStore>,
	pub(crate) audit: Arc<dyn AuditSink>,
	pub(crate) roles: RolesConfig,
	pub(crate) temporary_config: TemporaryGrantsConfig,
	pub(crate) collaborator_timeout: Duration,
}

/// Outcome of the uncached part of a check.
enum Evaluation {
	/// Actor-wide denial from account state. Audited, never cached.
	Account {
		verdict: Verdict,
		event: AuditEventType,
	},
	/// Super-role bypass. Audited, never cached.
	Privileged(Verdict),
	/// Decision from role or temporary grants.
	Decided {
		verdict: Verdict,
		owner_id: Option<ActorId>,
		/// Set when the verdict rests on a temporary grant that expires sooner
		/// than the cache TTL.
		max_age: Option<Duration>,
	},
}

impl AuthorizationService {
	pub fn builder(
		catalog: Arc<Catalog>,
		accounts: Arc<dyn AccountStatusProvider>,
	) -> AuthorizationServiceBuilder {
		AuthorizationServiceBuilder::new(catalog, accounts)
	}

	pub fn catalog(&self) -> &Catalog {
		self.resolver.catalog()
	}

	pub fn resolver(&self) -> &PermissionResolver {
		&self.resolver
	}

	pub fn roles_config(&self) -> &RolesConfig {
		&self.roles
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats()
	}

	pub(crate) fn is_super_role(&self, role: &str) -> bool {
		role == self.roles.super_role
	}

	// =========================================================================
	// Permission checks
	// =========================================================================

	/// Decides whether the actor in `ctx` may perform `action` on `resource`.
	#[instrument(
		skip_all,
		fields(actor_id = %ctx.actor_id, role = %ctx.role, %resource, %action, skip_cache = skip_cache)
	)]
	pub async fn check_permission(
		&self,
		ctx: &RequestContext,
		resource: Resource,
		action: Action,
		skip_cache: bool,
	) -> Verdict {
		let sensitive = is_sensitive(resource, action);
		let key = CacheKey::new(
			ctx.actor_id,
			ctx.role.clone(),
			resource,
			action,
			ctx.owner_id,
			ctx.resource_id.as_deref(),
			&ctx.extras,
		);

		if !skip_cache {
			if let Some(allowed) = self.cache.get(&key) {
				debug!(allowed, "cache hit");
				let verdict = Verdict::cached(allowed);
				if sensitive {
					self
						.audit_decision(ctx, resource, action, &verdict, ctx.owner_id, true)
						.await;
				}
				return verdict;
			}
		}

		let epoch = self.cache.epoch();
		match self.evaluate(ctx, resource, action).await {
			Ok(Evaluation::Account { verdict, event }) => {
				debug!(reason = %verdict.reason, "account denied");
				self
					.emit(
						self
							.decision_entry(event, ctx, resource, action, &verdict)
							.details(json!({ "sensitive": sensitive }))
							.build(),
					)
					.await;
				verdict
			}
			Ok(Evaluation::Privileged(verdict)) => {
				debug!("super role bypass");
				self
					.emit(
						self
							.decision_entry(AuditEventType::PrivilegedAccess, ctx, resource, action, &verdict)
							.details(json!({ "sensitive": sensitive, "bypass": "super_role" }))
							.build(),
					)
					.await;
				verdict
			}
			Ok(Evaluation::Decided {
				verdict,
				owner_id,
				max_age,
			}) => {
				debug!(allowed = verdict.allowed, reason = %verdict.reason, "permission decided");
				self
					.cache
					.put_checked(key, verdict.allowed, epoch, max_age);
				if sensitive {
					self
						.audit_decision(ctx, resource, action, &verdict, owner_id, false)
						.await;
				}
				verdict
			}
			Err(e) => {
				error!(error = %e, "permission check failed");
				self
					.emit(
						self
							.decision_entry(
								AuditEventType::SystemError,
								ctx,
								resource,
								action,
								&Verdict::deny(REASON_SYSTEM_ERROR),
							)
							.outcome(AuditOutcome::Failed)
							.details(json!({ "error": e.to_string() }))
							.build(),
					)
					.await;
				Verdict::deny(REASON_SYSTEM_ERROR)
			}
		}
	}

	/// Like [`Self::check_permission`] with tags given as strings. Unknown
	/// tags are denied.
	pub async fn check_permission_named(
		&self,
		ctx: &RequestContext,
		resource: &str,
		action: &str,
		skip_cache: bool,
	) -> Verdict {
		let Ok(resource) = resource.parse::<Resource>() else {
			debug!(resource, "unknown resource tag");
			return Verdict::deny(REASON_UNKNOWN_RESOURCE);
		};
		let Ok(action) = action.parse::<Action>() else {
			debug!(action, "unknown action tag");
			return Verdict::deny(REASON_UNKNOWN_ACTION);
		};
		self.check_permission(ctx, resource, action, skip_cache).await
	}

	/// Checks several pairs for one actor. Each pair is decided on its own;
	/// a denial does not stop the others.
	pub async fn check_permissions(
		&self,
		ctx: &RequestContext,
		pairs: &[(Resource, Action)],
	) -> BTreeMap<PermissionKey, Verdict> {
		let checks = pairs.iter().map(|&(resource, action)| async move {
			(
				PermissionKey::new(resource, action),
				self.check_permission(ctx, resource, action, false).await,
			)
		});
		join_all(checks).await.into_iter().collect()
	}

	/// Checks pairs in order until `cancel` fires. Verdicts computed before
	/// cancellation are returned.
	pub async fn check_permissions_cancellable(
		&self,
		ctx: &RequestContext,
		pairs: &[(Resource, Action)],
		cancel: &CancellationToken,
	) -> BTreeMap<PermissionKey, Verdict> {
		let mut results = BTreeMap::new();
		for &(resource, action) in pairs {
			if cancel.is_cancelled() {
				debug!(completed = results.len(), total = pairs.len(), "batch check cancelled");
				break;
			}
			let verdict = self.check_permission(ctx, resource, action, false).await;
			results.insert(PermissionKey::new(resource, action), verdict);
		}
		results
	}

	/// What a role can do, grouped by resource. For UI affordances only;
	/// enforcement always goes through [`Self::check_permission`].
	pub fn get_effective_permissions(&self, role: &str) -> Vec<ResourcePermissions> {
		if self.is_super_role(role) {
			return Resource::all()
				.iter()
				.map(|&resource| ResourcePermissions {
					resource,
					actions: Action::all().to_vec(),
				})
				.collect();
		}
		self.resolver.resolve(role).summarize()
	}

	/// Drops cached verdicts for an actor, e.g. after an account status change.
	pub fn invalidate_actor(&self, actor_id: ActorId) -> usize {
		self.cache.invalidate_actor(actor_id)
	}

	pub fn clear_cache(&self) {
		self.cache.clear();
	}

	// =========================================================================
	// Evaluation
	// =========================================================================

	async fn evaluate(
		&self,
		ctx: &RequestContext,
		resource: Resource,
		action: Action,
	) -> Result<Evaluation, CollaboratorError> {
		let now = Utc::now();

		let status = self
			.call(
				"account status lookup",
				ctx.deadline,
				self.accounts.get_status(ctx.actor_id),
			)
			.await?;
		let denial = match status {
			None => Some((REASON_NOT_FOUND, AuditEventType::AccountNotFound)),
			Some(status) if !status.is_active => Some((REASON_INACTIVE, AuditEventType::AccountInactive)),
			Some(status) if status.is_locked_at(now) => Some((REASON_LOCKED, AuditEventType::AccountLocked)),
			Some(_) => None,
		};
		if let Some((reason, event)) = denial {
			return Ok(Evaluation::Account {
				verdict: Verdict::deny(reason),
				event,
			});
		}

		let role = ctx.role.as_str();
		if self.is_super_role(role) {
			return Ok(Evaluation::Privileged(Verdict::allow(REASON_SUPER_ROLE)));
		}
		if !self.resolver.catalog().contains(role) {
			warn!(role, "unknown role has no permissions");
			return Ok(Evaluation::Decided {
				verdict: Verdict::insufficient(PermissionKey::new(resource, action), Vec::new()),
				owner_id: ctx.owner_id,
				max_age: None,
			});
		}

		let permissions = self.resolver.resolve(role);
		let mut owner_id = ctx.owner_id;
		if let Some(grant) = permissions.get(resource, action) {
			if owner_id.is_none() && grant.conditions.contains(&Condition::Ownership) {
				owner_id = self.resolve_owner(ctx, resource).await?;
			}
			if self
				.conditions
				.evaluate(&grant.conditions, &ctx.condition_context(owner_id))
			{
				return Ok(Evaluation::Decided {
					verdict: Verdict::granted_by_role(role),
					owner_id,
					max_age: None,
				});
			}
		}

		let temporary = self
			.call(
				"temporary grant lookup",
				ctx.deadline,
				self.temporary_grants.list_active_grants(ctx.actor_id, now),
			)
			.await?;
		let covering = temporary
			.iter()
			.filter(|g| g.applies_to(resource, action))
			.map(|g| g.expires_at)
			.max();
		if let Some(expires_at) = covering {
			return Ok(Evaluation::Decided {
				verdict: Verdict::allow(REASON_TEMPORARY_GRANT),
				owner_id,
				max_age: Some((expires_at - now).to_std().unwrap_or(Duration::ZERO)),
			});
		}

		let mut effective = (*permissions).clone();
		for grant in &temporary {
			effective.insert(grant.as_grant());
		}
		Ok(Evaluation::Decided {
			verdict: Verdict::insufficient(PermissionKey::new(resource, action), effective.to_vec()),
			owner_id,
			max_age: None,
		})
	}

	/// Resolves the owner of the targeted instance. A reported failure means
	/// the owner is unknown; a panicking resolver fails the whole check.
	async fn resolve_owner(
		&self,
		ctx: &RequestContext,
		resource: Resource,
	) -> Result<Option<ActorId>, CollaboratorError> {
		let Some(resource_id) = ctx.resource_id.as_deref() else {
			return Ok(None);
		};
		let Some(resolver) = self.owners.get(resource) else {
			debug!(%resource, "no owner resolver registered");
			return Ok(None);
		};

		match self
			.call(
				"owner resolution",
				ctx.deadline,
				resolver.resolve_owner(resource, resource_id),
			)
			.await
		{
			Ok(owner) => Ok(owner),
			Err(e @ CollaboratorError::Panicked { .. }) => Err(e),
			Err(e) => {
				warn!(%resource, resource_id, error = %e, "owner resolution failed, treating owner as unknown");
				Ok(None)
			}
		}
	}

	/// Runs a collaborator call under the request deadline, or the configured
	/// default timeout when the caller supplied none. A panic in the call is
	/// reported as [`CollaboratorError::Panicked`].
	pub(crate) async fn call<T, F>(
		&self,
		operation: &'static str,
		deadline: Option<Instant>,
		fut: F,
	) -> Result<T, CollaboratorError>
	where
		F: Future<Output = Result<T, CollaboratorError>>,
	{
		let started = Instant::now();
		let deadline = deadline.unwrap_or(started + self.collaborator_timeout);
		match timeout_at(deadline, AssertUnwindSafe(fut).catch_unwind()).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => {
				error!(operation, "collaborator panicked");
				Err(CollaboratorError::Panicked { operation })
			}
			Err(_) => Err(CollaboratorError::Timeout {
				operation,
				after: deadline.saturating_duration_since(started),
			}),
		}
	}

	// =========================================================================
	// Audit
	// =========================================================================

	pub(crate) fn decision_entry(
		&self,
		event: AuditEventType,
		ctx: &RequestContext,
		resource: Resource,
		action: Action,
		verdict: &Verdict,
	) -> AuditLogBuilder {
		let mut builder = AuditLogEntry::builder(event)
			.outcome(if verdict.allowed {
				AuditOutcome::Allowed
			} else {
				AuditOutcome::Denied
			})
			.actor(ctx.actor_id)
			.role(ctx.role.as_str())
			.resource_type(resource.as_str())
			.resource_id(ctx.resource_id.clone())
			.action(action.as_str())
			.reason(verdict.reason.clone());
		if let Some(request_id) = &ctx.request_id {
			builder = builder.request_id(request_id.clone());
		}
		builder
	}

	async fn audit_decision(
		&self,
		ctx: &RequestContext,
		resource: Resource,
		action: Action,
		verdict: &Verdict,
		owner_id: Option<ActorId>,
		cached: bool,
	) {
		let (event, severity) = if verdict.allowed {
			(AuditEventType::AccessGranted, AuditSeverity::Notice)
		} else {
			(AuditEventType::AccessDenied, AuditSeverity::Warning)
		};
		let entry = self
			.decision_entry(event, ctx, resource, action, verdict)
			.severity(severity)
			.details(json!({
				"sensitive": true,
				"cached": cached,
				"owner_id": owner_id,
				"required_grant": verdict.required_grant.map(|k| k.to_string()),
				"extras": ctx.extras,
			}))
			.build();
		self.emit(entry).await;
	}

	/// Publishes to the audit sink. Failures, including a panicking sink, are
	/// logged and never affect the caller.
	pub(crate) async fn emit(&self, entry: AuditLogEntry) {
		if !self.audit.filter().allows(&entry) {
			return;
		}

		let event_type = entry.event_type;
		let publish = AssertUnwindSafe(self.audit.publish(Arc::new(entry))).catch_unwind();
		match tokio::time::timeout(self.collaborator_timeout, publish).await {
			Ok(Ok(Ok(()))) => {}
			Ok(Ok(Err(e))) => {
				warn!(sink = self.audit.name(), %event_type, error = %e, "audit publish failed");
			}
			Ok(Err(_)) => {
				warn!(sink = self.audit.name(), %event_type, "audit sink panicked");
			}
			Err(_) => {
				warn!(sink = self.audit.name(), %event_type, "audit publish timed out");
			}
		}
	}
}

/// Assembles an [`AuthorizationService`].
pub struct AuthorizationServiceBuilder {
	catalog: Arc<Catalog>,
	accounts: Arc<dyn AccountStatusProvider>,
	conditions: ConditionRegistry,
	owners: OwnerResolverRegistry,
	temporary_grants: Option<Arc<dyn TemporaryGrantStore>>,
	audit: Option<Arc<dyn AuditSink>>,
	cache: Option<DecisionCache>,
	config: AuthzConfig,
}

impl AuthorizationServiceBuilder {
	fn new(catalog: Arc<Catalog>, accounts: Arc<dyn AccountStatusProvider>) -> Self {
		Self {
			catalog,
			accounts,
			conditions: ConditionRegistry::with_defaults(),
			owners: OwnerResolverRegistry::new(),
			temporary_grants: None,
			audit: None,
			cache: None,
			config: AuthzConfig::default(),
		}
	}

	/// Applies cache sizing, role lists, grant limits and timeouts.
	pub fn config(mut self, config: &AuthzConfig) -> Self {
		self.config = config.clone();
		self
	}

	pub fn conditions(mut self, conditions: ConditionRegistry) -> Self {
		self.conditions = conditions;
		self
	}

	pub fn owner_resolver(mut self, resource: Resource, resolver: Arc<dyn ResourceOwnerResolver>) -> Self {
		self.owners.register(resource, resolver);
		self
	}

	pub fn owner_resolvers(mut self, owners: OwnerResolverRegistry) -> Self {
		self.owners = owners;
		self
	}

	pub fn temporary_grants(mut self, store: Arc<dyn TemporaryGrantStore>) -> Self {
		self.temporary_grants = Some(store);
		self
	}

	pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
		self.audit = Some(sink);
		self
	}

	/// Overrides the cache built from config.
	pub fn cache(mut self, cache: DecisionCache) -> Self {
		self.cache = Some(cache);
		self
	}

	pub fn build(self) -> AuthorizationService {
		for issue in self.catalog.validate() {
			warn!(%issue, "catalog issue");
		}
		for issue in self.conditions.missing_predicates(&self.catalog) {
			warn!(%issue, "catalog references an unregistered predicate");
		}

		let cache = self
			.cache
			.unwrap_or_else(|| DecisionCache::from_config(&self.config.cache));
		let audit = self
			.audit
			.unwrap_or_else(|| Arc::new(TracingAuditSink::new(AuditFilterConfig::default())));
		let temporary_grants = self
			.temporary_grants
			.unwrap_or_else(|| Arc::new(InMemoryTemporaryGrantStore::new()));

		AuthorizationService {
			resolver: Arc::new(PermissionResolver::new(self.catalog)),
			conditions: self.conditions,
			cache: Arc::new(cache),
			accounts: self.accounts,
			owners: self.owners,
			temporary_grants,
			audit,
			roles: self.config.roles,
			temporary_config: self.config.temporary_grants,
			collaborator_timeout: self.config.collaborators.timeout(),
		}
	}
}
