// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage for temporary grants, account status and the audit log.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./solace-authz.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub max_connections: Option<u32>,
	#[serde(default)]
	pub busy_timeout_ms: Option<u64>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.max_connections.is_some() {
			self.max_connections = other.max_connections;
		}
		if other.busy_timeout_ms.is_some() {
			self.busy_timeout_ms = other.busy_timeout_ms;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
			max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
			busy_timeout_ms: self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
		}
	}
}

/// Resolved SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
	pub url: String,
	pub max_connections: u32,
	/// How long a writer waits on a locked database before failing.
	pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
	/// Only SQLite URLs are served by the storage crate.
	pub fn is_sqlite(&self) -> bool {
		self.url.starts_with("sqlite:")
	}

	/// Each connection to an in-memory database sees a different database.
	pub fn is_memory(&self) -> bool {
		self.url.contains(":memory:") || self.url.contains("mode=memory")
	}

	/// Connections the pool may open; always one for in-memory databases.
	pub fn pool_size(&self) -> u32 {
		if self.is_memory() {
			1
		} else {
			self.max_connections
		}
	}

	pub fn busy_timeout(&self) -> Duration {
		Duration::from_millis(self.busy_timeout_ms)
	}
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		DatabaseConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = DatabaseConfig::default();
		assert_eq!(config.url, "sqlite:./solace-authz.db");
		assert!(config.is_sqlite());
		assert_eq!(config.pool_size(), 5);
		assert_eq!(config.busy_timeout(), Duration::from_secs(5));
	}

	#[test]
	fn test_memory_database_uses_single_connection() {
		let config = DatabaseConfigLayer {
			url: Some("sqlite::memory:".to_string()),
			max_connections: Some(8),
			..Default::default()
		}
		.finalize();
		assert!(config.is_memory());
		assert_eq!(config.pool_size(), 1);
	}

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = DatabaseConfigLayer {
			url: Some("sqlite:/var/lib/solace/authz.db".to_string()),
			max_connections: Some(2),
			busy_timeout_ms: None,
		};
		base.merge(DatabaseConfigLayer {
			busy_timeout_ms: Some(250),
			..Default::default()
		});

		let config = base.finalize();
		assert_eq!(config.url, "sqlite:/var/lib/solace/authz.db");
		assert_eq!(config.max_connections, 2);
		assert_eq!(config.busy_timeout_ms, 250);
	}

	#[test]
	fn test_non_sqlite_url_is_detected() {
		let config = DatabaseConfigLayer {
			url: Some("postgres://localhost/solace".to_string()),
			..Default::default()
		}
		.finalize();
		assert!(!config.is_sqlite());
	}
}
