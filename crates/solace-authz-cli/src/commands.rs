// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command implementations. Each returns a serializable report; `main` decides
//! between text and JSON rendering.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use solace_authz::{
	AccountStatus, AssignmentDecision, AssignmentTarget, AuthorizationService,
	InMemoryAccountStatusProvider, RequestContext, TemporaryGrant, Verdict,
};
use solace_authz_config::AuthzConfig;
use solace_authz_core::{
	Action, ActorId, Catalog, ConditionRegistry, Resource, ResourcePermissions, TemporaryGrantId,
};
use solace_authz_db::{
	create_pool, run_migrations, SqliteAccountStatusProvider, SqliteTemporaryGrantStore,
};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::audit;

// =============================================================================
// Service wiring
// =============================================================================

/// Engine with every account treated as active and no persistence.
pub fn dry_run_service(config: &AuthzConfig, catalog: Arc<Catalog>) -> anyhow::Result<AuthorizationService> {
	let sink = audit::build_sink(&config.audit, None)?;
	Ok(
		AuthorizationService::builder(catalog, Arc::new(InMemoryAccountStatusProvider::assume_active()))
			.config(config)
			.audit_sink(sink)
			.build(),
	)
}

/// Opens the configured database, applying migrations first.
pub async fn open_database(config: &AuthzConfig) -> anyhow::Result<SqlitePool> {
	let pool = create_pool(&config.database)
		.await
		.with_context(|| format!("failed to open database {}", config.database.url))?;
	run_migrations(&pool).await.context("failed to run migrations")?;
	Ok(pool)
}

/// Engine backed by the configured database.
pub fn database_service(
	config: &AuthzConfig,
	catalog: Arc<Catalog>,
	pool: &SqlitePool,
) -> anyhow::Result<AuthorizationService> {
	let sink = audit::build_sink(&config.audit, Some(pool))?;
	Ok(
		AuthorizationService::builder(
			catalog,
			Arc::new(SqliteAccountStatusProvider::new(pool.clone())),
		)
		.config(config)
		.temporary_grants(Arc::new(SqliteTemporaryGrantStore::new(pool.clone())))
		.audit_sink(sink)
		.build(),
	)
}

// =============================================================================
// Catalog inspection
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RoleSummary {
	pub name: String,
	pub priority: i32,
	pub inherits: Vec<String>,
	pub grants: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl fmt::Display for RoleSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:<20} {:>4}  {:>3} grants", self.name, self.priority, self.grants)?;
		if !self.inherits.is_empty() {
			write!(f, "  inherits {}", self.inherits.join(", "))?;
		}
		Ok(())
	}
}

/// Roles from most to least privileged.
pub fn roles(catalog: &Catalog) -> Vec<RoleSummary> {
	catalog
		.roles_by_priority()
		.into_iter()
		.map(|role| RoleSummary {
			name: role.name.to_string(),
			priority: role.priority,
			inherits: role.inherits.iter().map(ToString::to_string).collect(),
			grants: role.grants.len(),
			description: role.description.clone(),
		})
		.collect()
}

pub fn effective(service: &AuthorizationService, role: &str) -> anyhow::Result<Vec<ResourcePermissions>> {
	if !service.catalog().contains(role) {
		anyhow::bail!("role '{role}' is not in the catalog");
	}
	Ok(service.get_effective_permissions(role))
}

pub fn render_permissions(permissions: &[ResourcePermissions]) -> String {
	permissions
		.iter()
		.map(|p| {
			let actions: Vec<&str> = p.actions.iter().map(Action::as_str).collect();
			format!("{:<20} {}", p.resource.as_str(), actions.join(", "))
		})
		.collect::<Vec<_>>()
		.join("\n")
}

#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
	pub roles: usize,
	pub errors: Vec<String>,
	pub warnings: Vec<String>,
}

impl ValidationReport {
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}
}

impl fmt::Display for ValidationReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for error in &self.errors {
			writeln!(f, "error: {error}")?;
		}
		for warning in &self.warnings {
			writeln!(f, "warning: {warning}")?;
		}
		if self.is_ok() {
			write!(f, "catalog ok ({} roles)", self.roles)
		} else {
			write!(f, "catalog invalid ({} errors)", self.errors.len())
		}
	}
}

/// Checks the catalog and the role names the configuration refers to.
pub fn validate(config: &AuthzConfig, catalog: &Catalog) -> ValidationReport {
	let mut report = ValidationReport {
		roles: catalog.len(),
		..Default::default()
	};

	report
		.errors
		.extend(catalog.validate().iter().map(ToString::to_string));
	report.errors.extend(
		ConditionRegistry::with_defaults()
			.missing_predicates(catalog)
			.iter()
			.map(ToString::to_string),
	);

	if !catalog.contains(&config.roles.super_role) {
		report.warnings.push(format!(
			"super role '{}' is not in the catalog",
			config.roles.super_role
		));
	}
	let listed = config
		.roles
		.assignment_roles
		.iter()
		.map(|r| ("assignment", r))
		.chain(config.roles.clinical_roles.iter().map(|r| ("clinical", r)));
	for (list, role) in listed {
		if !catalog.contains(role) {
			report
				.warnings
				.push(format!("{list} role '{role}' is not in the catalog"));
		}
	}

	report
}

// =============================================================================
// Decisions
// =============================================================================

/// Parses `key=value`; the value is read as JSON when possible.
pub fn parse_extra(raw: &str) -> Result<(String, Value), String> {
	let (key, value) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
	if key.is_empty() {
		return Err("extra key must not be empty".to_string());
	}
	let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
	Ok((key.to_string(), value))
}

#[derive(Debug, Clone)]
pub struct CheckRequest {
	pub actor: Option<ActorId>,
	pub role: String,
	pub resource: Resource,
	pub action: Action,
	pub resource_id: Option<String>,
	pub owner: Option<ActorId>,
	pub own: bool,
	pub extras: Vec<(String, Value)>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
	pub actor_id: ActorId,
	pub role: String,
	pub resource: Resource,
	pub action: Action,
	#[serde(flatten)]
	pub verdict: Verdict,
}

impl fmt::Display for CheckReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let outcome = if self.verdict.allowed { "ALLOW" } else { "DENY" };
		write!(
			f,
			"{outcome} {} as {} on {}:{} ({})",
			self.actor_id, self.role, self.resource, self.action, self.verdict.reason
		)
	}
}

#[instrument(skip_all, fields(role = %request.role, resource = %request.resource, action = %request.action))]
pub async fn check(service: &AuthorizationService, request: CheckRequest) -> CheckReport {
	let actor_id = request.actor.unwrap_or_else(ActorId::generate);
	let mut ctx = RequestContext::new(actor_id, request.role.as_str());
	if let Some(resource_id) = request.resource_id {
		ctx = ctx.with_resource_id(resource_id);
	}
	match (request.owner, request.own) {
		(Some(owner), _) => ctx = ctx.with_owner(owner),
		(None, true) => ctx = ctx.with_owner(actor_id),
		(None, false) => {}
	}
	for (key, value) in request.extras {
		ctx = ctx.with_extra(key, value);
	}

	let verdict = service
		.check_permission(&ctx, request.resource, request.action, true)
		.await;

	CheckReport {
		actor_id,
		role: request.role,
		resource: request.resource,
		action: request.action,
		verdict,
	}
}

pub async fn validate_assignment(
	service: &AuthorizationService,
	assigner_role: &str,
	new_role: &str,
	current_role: Option<&str>,
) -> AssignmentDecision {
	let assigner = RequestContext::new(ActorId::generate(), assigner_role);
	let mut target = AssignmentTarget::new(ActorId::generate());
	if let Some(current) = current_role {
		target = target.with_current_role(current);
	}
	service.validate_assignment(&target, new_role, &assigner).await
}

pub fn render_assignment(decision: &AssignmentDecision) -> String {
	let mut out = if decision.valid {
		"valid".to_string()
	} else {
		format!(
			"rejected: {}",
			decision.reason.as_deref().unwrap_or("no reason recorded")
		)
	};
	if decision.requires_credential_verification {
		out.push_str(" (clinical credentials must be verified)");
	}
	out
}

// =============================================================================
// Persistent state
// =============================================================================

#[derive(Debug, Clone)]
pub struct GrantRequest {
	pub grantor: ActorId,
	pub grantor_role: String,
	pub beneficiary: ActorId,
	pub resource: Resource,
	pub action: Action,
	pub hours: i64,
	pub reason: String,
}

pub async fn grant(
	service: &AuthorizationService,
	request: GrantRequest,
) -> anyhow::Result<TemporaryGrantId> {
	let grantor = RequestContext::new(request.grantor, request.grantor_role.as_str());
	let expires_at = Utc::now() + Duration::hours(request.hours);
	let id = service
		.grant_temporary(
			&grantor,
			request.beneficiary,
			request.resource,
			request.action,
			expires_at,
			&request.reason,
		)
		.await?;
	info!(grant_id = %id, %expires_at, "temporary grant stored");
	Ok(id)
}

pub async fn revoke(
	service: &AuthorizationService,
	revoker: ActorId,
	revoker_role: &str,
	grant_id: TemporaryGrantId,
) -> anyhow::Result<()> {
	let ctx = RequestContext::new(revoker, revoker_role);
	service.revoke_temporary(&ctx, grant_id).await?;
	Ok(())
}

pub async fn list_grants(
	service: &AuthorizationService,
	actor: ActorId,
	include_inactive: bool,
) -> anyhow::Result<Vec<TemporaryGrant>> {
	let now = Utc::now();
	let grants = service.list_temporary(actor).await?;
	Ok(grants
		.into_iter()
		.filter(|g| include_inactive || g.is_active_at(now))
		.collect())
}

pub fn render_grants(grants: &[TemporaryGrant]) -> String {
	if grants.is_empty() {
		return "no temporary grants".to_string();
	}
	grants
		.iter()
		.map(|g| {
			let state = match g.revoked_at {
				Some(_) => "revoked",
				None if g.is_active() => "active",
				None => "expired",
			};
			format!(
				"{} {}:{} {state} until {} ({})",
				g.id,
				g.resource,
				g.action,
				g.expires_at.to_rfc3339(),
				g.reason
			)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

#[derive(Debug, Clone)]
pub enum AccountUpdate {
	Set {
		active: bool,
		locked_until: Option<DateTime<Utc>>,
	},
	Remove,
}

/// Writes account status and returns what is stored afterwards.
pub async fn update_account(
	pool: &SqlitePool,
	actor: ActorId,
	update: AccountUpdate,
) -> anyhow::Result<Option<AccountStatus>> {
	let accounts = SqliteAccountStatusProvider::new(pool.clone());
	match update {
		AccountUpdate::Set {
			active,
			locked_until,
		} => {
			let status = AccountStatus {
				is_active: active,
				locked_until,
			};
			accounts.upsert(actor, &status).await?;
		}
		AccountUpdate::Remove => {
			accounts.delete(actor).await?;
		}
	}
	Ok(accounts.find(actor).await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use solace_authz_config::load_catalog;
	use solace_authz_core::{default_catalog, roles, Grant, Role};

	fn config() -> AuthzConfig {
		AuthzConfig::default()
	}

	mod inspection {
		use super::*;

		#[test]
		fn roles_are_listed_most_privileged_first() {
			let summaries = roles(&default_catalog());
			assert_eq!(summaries.first().unwrap().name, roles::SUPER_ADMIN);
			assert_eq!(summaries.last().unwrap().name, roles::GUEST);
			assert!(summaries
				.windows(2)
				.all(|w| w[0].priority >= w[1].priority));
		}

		#[test]
		fn effective_rejects_unknown_role() {
			let service = dry_run_service(&config(), Arc::new(default_catalog())).unwrap();
			assert!(effective(&service, "wizard").is_err());

			let perms = effective(&service, roles::GUEST).unwrap();
			assert_eq!(render_permissions(&perms), format!("{:<20} create", "user_profile"));
		}

		#[test]
		fn default_catalog_validates() {
			let config = config();
			let report = validate(&config, &load_catalog(&config.roles).unwrap());
			assert!(report.is_ok(), "{report}");
			assert!(report.warnings.is_empty());
		}

		#[test]
		fn broken_catalog_reports_errors_and_warnings() {
			let catalog = Catalog::builder()
				.role(Role::new("a", 1).inherit("b"))
				.role(Role::new("b", 2).inherit("a"))
				.role(Role::new("c", 3).grant(Grant::when(Resource::Report, Action::Read, "moon_phase")))
				.build();

			let report = validate(&config(), &catalog);
			assert!(!report.is_ok());
			assert!(report.errors.iter().any(|e| e.contains("cycle")));
			assert!(report.errors.iter().any(|e| e.contains("moon_phase")));
			assert!(report.warnings.iter().any(|w| w.contains("super role")));
		}
	}

	mod decisions {
		use super::*;

		#[test]
		fn parse_extra_reads_json_values() {
			assert_eq!(
				parse_extra("active_crisis=true").unwrap(),
				("active_crisis".to_string(), Value::Bool(true))
			);
			assert_eq!(
				parse_extra("note=hello world").unwrap(),
				("note".to_string(), Value::String("hello world".to_string()))
			);
			assert!(parse_extra("no-separator").is_err());
			assert!(parse_extra("=1").is_err());
		}

		fn request(role: &str, resource: Resource, action: Action) -> CheckRequest {
			CheckRequest {
				actor: None,
				role: role.to_string(),
				resource,
				action,
				resource_id: None,
				owner: None,
				own: false,
				extras: Vec::new(),
			}
		}

		#[tokio::test]
		async fn check_own_resource() {
			let service = dry_run_service(&config(), Arc::new(default_catalog())).unwrap();

			let foreign = check(&service, request(roles::USER, Resource::MoodEntry, Action::Read)).await;
			assert!(!foreign.verdict.allowed);

			let mut own = request(roles::USER, Resource::MoodEntry, Action::Read);
			own.own = true;
			let own = check(&service, own).await;
			assert!(own.verdict.allowed, "{own}");
			assert!(own.to_string().starts_with("ALLOW"));
		}

		#[tokio::test]
		async fn check_with_extras() {
			let service = dry_run_service(&config(), Arc::new(default_catalog())).unwrap();
			let mut req = request(roles::CRISIS_COUNSELOR, Resource::Assessment, Action::Read);
			req.extras.push(parse_extra("active_crisis=true").unwrap());

			assert!(check(&service, req).await.verdict.allowed);
		}

		#[tokio::test]
		async fn assignment_rendering() {
			let service = dry_run_service(&config(), Arc::new(default_catalog())).unwrap();

			let ok = validate_assignment(&service, roles::ADMIN, roles::THERAPIST, Some(roles::USER)).await;
			assert_eq!(
				render_assignment(&ok),
				"valid (clinical credentials must be verified)"
			);

			let rejected = validate_assignment(&service, roles::THERAPIST, roles::USER, None).await;
			assert!(render_assignment(&rejected).starts_with("rejected: "));
		}
	}

	mod persistence {
		use super::*;

		async fn database() -> (tempfile::TempDir, AuthzConfig, SqlitePool) {
			let dir = tempfile::tempdir().unwrap();
			let mut config = config();
			config.database.url = format!("sqlite:{}", dir.path().join("authz.db").display());
			let pool = open_database(&config).await.unwrap();
			(dir, config, pool)
		}

		#[tokio::test]
		async fn grant_check_revoke_round() {
			let (_dir, config, pool) = database().await;
			let service = database_service(&config, Arc::new(default_catalog()), &pool).unwrap();

			let admin = ActorId::generate();
			let staff = ActorId::generate();
			for actor in [admin, staff] {
				update_account(
					&pool,
					actor,
					AccountUpdate::Set {
						active: true,
						locked_until: None,
					},
				)
				.await
				.unwrap();
			}

			let id = grant(
				&service,
				GrantRequest {
					grantor: admin,
					grantor_role: roles::ADMIN.to_string(),
					beneficiary: staff,
					resource: Resource::Report,
					action: Action::Read,
					hours: 2,
					reason: "audit prep".to_string(),
				},
			)
			.await
			.unwrap();

			let req = CheckRequest {
				actor: Some(staff),
				role: roles::SUPPORT_STAFF.to_string(),
				resource: Resource::Report,
				action: Action::Read,
				resource_id: None,
				owner: None,
				own: false,
				extras: Vec::new(),
			};
			assert!(check(&service, req.clone()).await.verdict.allowed);

			revoke(&service, admin, roles::ADMIN, id).await.unwrap();
			assert!(!check(&service, req).await.verdict.allowed);

			assert!(list_grants(&service, staff, false).await.unwrap().is_empty());
			let all = list_grants(&service, staff, true).await.unwrap();
			assert_eq!(all.len(), 1);
			assert!(render_grants(&all).contains("revoked"));
		}

		#[tokio::test]
		async fn account_updates() {
			let (_dir, _config, pool) = database().await;
			let actor = ActorId::generate();
			let until = Utc::now() + Duration::minutes(30);

			let stored = update_account(
				&pool,
				actor,
				AccountUpdate::Set {
					active: true,
					locked_until: Some(until),
				},
			)
			.await
			.unwrap()
			.unwrap();
			assert!(stored.is_locked());

			let removed = update_account(&pool, actor, AccountUpdate::Remove).await.unwrap();
			assert!(removed.is_none());
		}
	}
}
