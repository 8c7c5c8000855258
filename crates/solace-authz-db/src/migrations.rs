// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Forward-only schema migrations, tracked in `schema_migrations`.

use chrono::Utc;
use solace_authz_audit::AUDIT_LOGS_SCHEMA;
use sqlx::sqlite::SqlitePool;
use tracing::{info, instrument};

use crate::error::{DbError, Result};

const TEMPORARY_GRANTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS temporary_grants (
	id TEXT PRIMARY KEY,
	beneficiary_id TEXT NOT NULL,
	granted_by TEXT NOT NULL,
	resource TEXT NOT NULL,
	action TEXT NOT NULL,
	reason TEXT NOT NULL,
	created_at TEXT NOT NULL,
	expires_at TEXT NOT NULL,
	revoked_at TEXT,
	revoked_by TEXT
);
CREATE INDEX IF NOT EXISTS idx_temporary_grants_beneficiary
	ON temporary_grants(beneficiary_id, expires_at);
"#;

const ACCOUNT_STATUS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS account_status (
	actor_id TEXT PRIMARY KEY,
	is_active INTEGER NOT NULL DEFAULT 1,
	locked_until TEXT,
	updated_at TEXT NOT NULL
);
"#;

struct Migration {
	version: i64,
	name: &'static str,
	sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
	Migration {
		version: 1,
		name: "temporary_grants",
		sql: TEMPORARY_GRANTS_SCHEMA,
	},
	Migration {
		version: 2,
		name: "account_status",
		sql: ACCOUNT_STATUS_SCHEMA,
	},
	Migration {
		version: 3,
		name: "audit_logs",
		sql: AUDIT_LOGS_SCHEMA,
	},
];

/// Applies pending migrations and returns how many ran.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS schema_migrations (
			version INTEGER PRIMARY KEY,
			name TEXT NOT NULL,
			applied_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	let applied: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations")
		.fetch_all(pool)
		.await?;

	let mut ran = 0;
	for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
		let mut tx = pool.begin().await?;
		sqlx::raw_sql(migration.sql)
			.execute(&mut *tx)
			.await
			.map_err(|source| DbError::Migration {
				version: migration.version,
				source,
			})?;
		sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)")
			.bind(migration.version)
			.bind(migration.name)
			.bind(Utc::now().to_rfc3339())
			.execute(&mut *tx)
			.await?;
		tx.commit().await?;

		info!(version = migration.version, name = migration.name, "migration applied");
		ran += 1;
	}

	Ok(ran)
}
