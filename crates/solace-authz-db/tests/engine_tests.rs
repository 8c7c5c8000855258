// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The engine running against SQLite-backed collaborators.

use std::sync::Arc;

use chrono::{Duration, Utc};
use solace_authz::{AccountStatus, AuthorizationService, RequestContext};
use solace_authz_audit::{AuditFilterConfig, AuditSink, SqliteAuditSink};
use solace_authz_core::{default_catalog, roles, Action, ActorId, Resource};
use solace_authz_db::{
	create_memory_pool, run_migrations, SqliteAccountStatusProvider, SqliteTemporaryGrantStore,
};
use sqlx::SqlitePool;

struct Fixture {
	pool: SqlitePool,
	accounts: Arc<SqliteAccountStatusProvider>,
	service: AuthorizationService,
}

async fn fixture() -> Fixture {
	let pool = create_memory_pool().await.unwrap();
	run_migrations(&pool).await.unwrap();

	let accounts = Arc::new(SqliteAccountStatusProvider::new(pool.clone()));
	let grants = Arc::new(SqliteTemporaryGrantStore::new(pool.clone()));
	let audit = Arc::new(SqliteAuditSink::new(pool.clone(), AuditFilterConfig::allow_all()));

	let service = AuthorizationService::builder(Arc::new(default_catalog()), accounts.clone())
		.temporary_grants(grants)
		.audit_sink(audit as Arc<dyn AuditSink>)
		.build();

	Fixture {
		pool,
		accounts,
		service,
	}
}

impl Fixture {
	async fn actor(&self, role: &str) -> RequestContext {
		let actor_id = ActorId::generate();
		self
			.accounts
			.upsert(actor_id, &AccountStatus::active())
			.await
			.unwrap();
		RequestContext::new(actor_id, role)
	}

	async fn audit_rows(&self, event_type: &str) -> i64 {
		sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE event_type = ?")
			.bind(event_type)
			.fetch_one(&self.pool)
			.await
			.unwrap()
	}
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_unknown_account_in_database_is_denied() {
	let f = fixture().await;
	let ctx = RequestContext::new(ActorId::generate(), roles::THERAPIST);

	let verdict = f
		.service
		.check_permission(&ctx, Resource::Appointment, Action::Read, false)
		.await;

	assert!(!verdict.allowed);
	assert_eq!(verdict.reason, "account not found");
	assert_eq!(f.audit_rows("account_not_found").await, 1);
}

#[tokio::test]
async fn test_locked_account_in_database_is_denied() {
	let f = fixture().await;
	let ctx = f.actor(roles::THERAPIST).await;
	f.accounts
		.upsert(
			ctx.actor_id,
			&AccountStatus::locked_until(Utc::now() + Duration::hours(1)),
		)
		.await
		.unwrap();

	let verdict = f
		.service
		.check_permission(&ctx, Resource::Appointment, Action::Read, true)
		.await;

	assert!(!verdict.allowed);
	assert_eq!(verdict.reason, "account is locked");
}

// ============================================================================
// Temporary grants
// ============================================================================

#[tokio::test]
async fn test_temporary_grant_lifecycle_persists() {
	let f = fixture().await;
	let admin = f.actor(roles::ADMIN).await;
	let staff = f.actor(roles::SUPPORT_STAFF).await;

	let id = f
		.service
		.grant_temporary(
			&admin,
			staff.actor_id,
			Resource::Report,
			Action::Read,
			Utc::now() + Duration::hours(8),
			"month-end reporting",
		)
		.await
		.unwrap();

	assert!(
		f.service
			.check_permission(&staff, Resource::Report, Action::Read, false)
			.await
			.allowed
	);

	let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM temporary_grants WHERE id = ?")
		.bind(id.to_string())
		.fetch_one(&f.pool)
		.await
		.unwrap();
	assert_eq!(stored, 1);

	f.service.revoke_temporary(&admin, id).await.unwrap();
	assert!(
		!f.service
			.check_permission(&staff, Resource::Report, Action::Read, false)
			.await
			.allowed
	);

	assert_eq!(f.audit_rows("temporary_grant_created").await, 1);
	assert_eq!(f.audit_rows("temporary_grant_revoked").await, 1);
}
