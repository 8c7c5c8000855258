// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use solace_authz_config::DatabaseConfig;
use std::str::FromStr;

use crate::error::DbError;

/// Create a SqlitePool with WAL mode and the configured pool size and busy
/// timeout.
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(config), fields(max_connections = config.pool_size()))]
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(&config.url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(config.busy_timeout())
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(config.pool_size())
		.connect_with(options)
		.await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Single-connection in-memory pool. Every connection to `:memory:` opens a
/// fresh database, so the pool must never hold more than one.
pub async fn create_memory_pool() -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(":memory:")
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await?;
	Ok(pool)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(url: impl Into<String>) -> DatabaseConfig {
		DatabaseConfig {
			url: url.into(),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn file_pool_uses_wal() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("authz.db").display());
		let pool = create_pool(&config(url)).await.unwrap();

		let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(mode.to_lowercase(), "wal");
		assert_eq!(pool.options().get_max_connections(), 5);
	}

	#[tokio::test]
	async fn busy_timeout_is_applied() {
		let dir = tempfile::tempdir().unwrap();
		let mut config = config(format!("sqlite:{}", dir.path().join("authz.db").display()));
		config.busy_timeout_ms = 1234;
		let pool = create_pool(&config).await.unwrap();

		let timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(timeout, 1234);
	}

	#[tokio::test]
	async fn memory_url_gets_one_connection() {
		let pool = create_pool(&config("sqlite::memory:")).await.unwrap();
		assert_eq!(pool.options().get_max_connections(), 1);
	}

	#[tokio::test]
	async fn unknown_url_parameter_is_internal_error() {
		let err = create_pool(&config("sqlite::memory:?flavour=strawberry"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Internal(_)));
	}

	#[tokio::test]
	async fn memory_pool_keeps_state_across_queries() {
		let pool = create_memory_pool().await.unwrap();
		sqlx::query("CREATE TABLE t (x INTEGER)")
			.execute(&pool)
			.await
			.unwrap();
		sqlx::query("INSERT INTO t VALUES (1)")
			.execute(&pool)
			.await
			.unwrap();
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(count, 1);
	}
}
