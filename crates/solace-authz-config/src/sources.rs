// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::AuthzConfigLayer;
use crate::sections::{
	AuditConfigLayer, CacheConfigLayer, CollaboratorsConfigLayer, DatabaseConfigLayer, LogFormat,
	LoggingConfigLayer, QueueOverflowPolicy, RolesConfigLayer, TemporaryGrantsConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AuthzConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AuthzConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AuthzConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/solace/authz.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AuthzConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AuthzConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AuthzConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: SOLACE_AUTHZ_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AuthzConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(AuthzConfigLayer {
			cache: Some(load_cache_from_env()?),
			roles: Some(load_roles_from_env()),
			temporary_grants: Some(load_temporary_grants_from_env()?),
			collaborators: Some(load_collaborators_from_env()?),
			logging: Some(load_logging_from_env()?),
			audit: Some(load_audit_from_env()?),
			database: Some(load_database_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| parse_bool(&v))
}

fn env_parse<T: FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::invalid(name, format!("invalid {kind} value '{v}'"))),
		None => Ok(None),
	}
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|v| split_list(&v))
}

fn parse_bool(value: &str) -> bool {
	value.eq_ignore_ascii_case("true") || value == "1"
}

fn split_list(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
		.collect()
}

fn load_cache_from_env() -> Result<CacheConfigLayer, ConfigError> {
	Ok(CacheConfigLayer {
		enabled: env_bool("SOLACE_AUTHZ_CACHE_ENABLED"),
		ttl_secs: env_parse("SOLACE_AUTHZ_CACHE_TTL_SECS", "u64")?,
		max_entries: env_parse("SOLACE_AUTHZ_CACHE_MAX_ENTRIES", "usize")?,
	})
}

fn load_roles_from_env() -> RolesConfigLayer {
	RolesConfigLayer {
		super_role: env_var("SOLACE_AUTHZ_SUPER_ROLE"),
		assignment_roles: env_list("SOLACE_AUTHZ_ASSIGNMENT_ROLES"),
		clinical_roles: env_list("SOLACE_AUTHZ_CLINICAL_ROLES"),
		catalog_path: env_var("SOLACE_AUTHZ_CATALOG_PATH").map(PathBuf::from),
	}
}

fn load_temporary_grants_from_env() -> Result<TemporaryGrantsConfigLayer, ConfigError> {
	Ok(TemporaryGrantsConfigLayer {
		max_duration_secs: env_parse("SOLACE_AUTHZ_TEMP_GRANT_MAX_DURATION_SECS", "u64")?,
	})
}

fn load_collaborators_from_env() -> Result<CollaboratorsConfigLayer, ConfigError> {
	Ok(CollaboratorsConfigLayer {
		timeout_ms: env_parse("SOLACE_AUTHZ_COLLABORATOR_TIMEOUT_MS", "u64")?,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("SOLACE_AUTHZ_LOG_FORMAT") {
		Some(v) => Some(
			LogFormat::from_str(&v)
				.map_err(|message| ConfigError::invalid("SOLACE_AUTHZ_LOG_FORMAT", message))?,
		),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("SOLACE_AUTHZ_LOG_LEVEL"),
		format,
	})
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	Ok(AuditConfigLayer {
		enabled: env_bool("SOLACE_AUTHZ_AUDIT_ENABLED"),
		queue_capacity: env_parse("SOLACE_AUTHZ_AUDIT_QUEUE_CAPACITY", "usize")?,
		queue_overflow_policy: env_var("SOLACE_AUTHZ_AUDIT_QUEUE_OVERFLOW_POLICY")
			.map(|v| QueueOverflowPolicy::from(v.as_str())),
		min_severity: env_var("SOLACE_AUTHZ_AUDIT_MIN_SEVERITY"),
		tracing_sink: env_bool("SOLACE_AUTHZ_AUDIT_TRACING_SINK"),
		sqlite_sink: env_bool("SOLACE_AUTHZ_AUDIT_SQLITE_SINK"),
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("SOLACE_AUTHZ_DATABASE_URL"),
		max_connections: env_parse("SOLACE_AUTHZ_DATABASE_MAX_CONNECTIONS", "u32")?,
		busy_timeout_ms: env_parse("SOLACE_AUTHZ_DATABASE_BUSY_TIMEOUT_MS", "u64")?,
	})
}
