// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::AuditSinkError;
use crate::event::AuditLogEntry;
use crate::filter::AuditFilterConfig;
use crate::sink::AuditSink;

/// Schema of the table written by [`SqliteAuditSink`].
pub const AUDIT_LOGS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_logs (
	id TEXT PRIMARY KEY,
	timestamp TEXT NOT NULL,
	event_type TEXT NOT NULL,
	category TEXT NOT NULL,
	severity TEXT NOT NULL,
	outcome TEXT NOT NULL,
	actor_id TEXT,
	role TEXT,
	resource_type TEXT,
	resource_id TEXT,
	action TEXT NOT NULL,
	reason TEXT,
	request_id TEXT,
	details TEXT NOT NULL,
	created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_logs_actor ON audit_logs(actor_id);
CREATE INDEX IF NOT EXISTS idx_audit_logs_event_type ON audit_logs(event_type);
"#;

pub struct SqliteAuditSink {
	pool: SqlitePool,
	filter: AuditFilterConfig,
}

impl SqliteAuditSink {
	pub fn new(pool: SqlitePool, filter: AuditFilterConfig) -> Self {
		Self { pool, filter }
	}
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
	fn name(&self) -> &str {
		"sqlite"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let details_json = serde_json::to_string(&event.details)
			.map_err(|e| AuditSinkError::Permanent(format!("failed to serialize details: {e}")))?;

		let now = chrono::Utc::now();

		sqlx::query(
			r#"
			INSERT INTO audit_logs (
				id, timestamp, event_type, category, severity, outcome,
				actor_id, role, resource_type, resource_id, action, reason,
				request_id, details, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(event.id.to_string())
		.bind(event.timestamp.to_rfc3339())
		.bind(event.event_type.to_string())
		.bind(event.category.to_string())
		.bind(event.severity.to_string())
		.bind(event.outcome.to_string())
		.bind(event.actor_id.as_ref().map(|a| a.to_string()))
		.bind(&event.role)
		.bind(&event.resource_type)
		.bind(&event.resource_id)
		.bind(&event.action)
		.bind(&event.reason)
		.bind(&event.request_id)
		.bind(&details_json)
		.bind(now.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| {
			if is_transient_error(&e) {
				AuditSinkError::Transient(format!("database error: {e}"))
			} else {
				AuditSinkError::Permanent(format!("database error: {e}"))
			}
		})?;

		Ok(())
	}

	async fn health_check(&self) -> Result<(), AuditSinkError> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map_err(|e| AuditSinkError::Transient(format!("health check failed: {e}")))?;
		Ok(())
	}
}

fn is_transient_error(e: &sqlx::Error) -> bool {
	match e {
		sqlx::Error::Io(_) => true,
		sqlx::Error::PoolTimedOut => true,
		sqlx::Error::PoolClosed => true,
		sqlx::Error::Database(db_err) => {
			let msg = db_err.message().to_lowercase();
			msg.contains("busy") || msg.contains("locked") || msg.contains("timeout")
		}
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditEventType;
	use solace_authz_core::ActorId;
	use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
	use std::str::FromStr;

	async fn empty_pool() -> SqlitePool {
		let options = SqliteConnectOptions::from_str(":memory:")
			.unwrap()
			.create_if_missing(true);

		SqlitePoolOptions::new()
			.max_connections(1)
			.connect_with(options)
			.await
			.expect("Failed to create test pool")
	}

	async fn pool() -> SqlitePool {
		let pool = empty_pool().await;
		sqlx::raw_sql(AUDIT_LOGS_SCHEMA).execute(&pool).await.unwrap();
		pool
	}

	#[tokio::test]
	async fn test_publish_inserts_row() {
		let pool = pool().await;
		let sink = SqliteAuditSink::new(pool.clone(), AuditFilterConfig::default());
		let actor = ActorId::generate();

		let entry = AuditLogEntry::builder(AuditEventType::AccessDenied)
			.actor(actor)
			.resource_type("audit_log")
			.action("export")
			.reason("insufficient permissions")
			.build();
		sink.publish(Arc::new(entry)).await.unwrap();

		let row: (String, String, Option<String>) =
			sqlx::query_as("SELECT event_type, severity, actor_id FROM audit_logs")
				.fetch_one(&pool)
				.await
				.unwrap();
		assert_eq!(row.0, "access_denied");
		assert_eq!(row.1, "warning");
		assert_eq!(row.2, Some(actor.to_string()));
	}

	#[tokio::test]
	async fn test_missing_table_is_permanent_error() {
		let sink = SqliteAuditSink::new(empty_pool().await, AuditFilterConfig::default());

		let err = sink
			.publish(Arc::new(AuditLogEntry::builder(AuditEventType::SystemError).build()))
			.await
			.unwrap_err();
		assert!(!err.is_transient());
	}

	#[tokio::test]
	async fn test_health_check() {
		let sink = SqliteAuditSink::new(pool().await, AuditFilterConfig::default());
		assert!(sink.health_check().await.is_ok());
	}
}
