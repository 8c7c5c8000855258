// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Solace authorization engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SOLACE_AUTHZ_*`)
//! - Loading of the permission catalog from a TOML file
//!
//! # Usage
//!
//! ```ignore
//! use solace_authz_config::{load_catalog, load_config};
//!
//! let config = load_config()?;
//! let catalog = load_catalog(&config.roles)?;
//! ```

pub mod catalog;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use catalog::{load_catalog, load_catalog_file, parse_catalog};
pub use error::ConfigError;
pub use layer::AuthzConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved authorization configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthzConfig {
	pub cache: CacheConfig,
	pub roles: RolesConfig,
	pub temporary_grants: TemporaryGrantsConfig,
	pub collaborators: CollaboratorsConfig,
	pub logging: LoggingConfig,
	pub audit: AuditConfig,
	pub database: DatabaseConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SOLACE_AUTHZ_*`)
/// 2. Config file (`/etc/solace/authz.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<AuthzConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<AuthzConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<AuthzConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<AuthzConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AuthzConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: AuthzConfigLayer) -> Result<AuthzConfig, ConfigError> {
	let config = AuthzConfig {
		cache: layer.cache.unwrap_or_default().finalize(),
		roles: layer.roles.unwrap_or_default().finalize(),
		temporary_grants: layer.temporary_grants.unwrap_or_default().finalize(),
		collaborators: layer.collaborators.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		audit: layer.audit.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		cache_enabled = config.cache.enabled,
		cache_ttl_secs = config.cache.ttl_secs,
		cache_max_entries = config.cache.max_entries,
		super_role = %config.roles.super_role,
		custom_catalog = config.roles.catalog_path.is_some(),
		audit_enabled = config.audit.enabled,
		"Authorization configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
pub fn validate_config(config: &AuthzConfig) -> Result<(), ConfigError> {
	if config.cache.enabled && config.cache.ttl_secs == 0 {
		return Err(ConfigError::Validation(
			"cache.ttl_secs must be greater than zero when the cache is enabled".to_string(),
		));
	}
	if config.cache.enabled && config.cache.max_entries == 0 {
		return Err(ConfigError::Validation(
			"cache.max_entries must be greater than zero when the cache is enabled".to_string(),
		));
	}
	if config.roles.super_role.trim().is_empty() {
		return Err(ConfigError::Validation(
			"roles.super_role must not be empty".to_string(),
		));
	}
	if config.roles.is_clinical(&config.roles.super_role) {
		return Err(ConfigError::Validation(format!(
			"super role '{}' must not be listed as a clinical role",
			config.roles.super_role
		)));
	}
	if config.temporary_grants.max_duration_secs == 0 {
		return Err(ConfigError::Validation(
			"temporary_grants.max_duration_secs must be greater than zero".to_string(),
		));
	}
	if config.collaborators.timeout_ms == 0 {
		return Err(ConfigError::Validation(
			"collaborators.timeout_ms must be greater than zero".to_string(),
		));
	}
	if config.audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit.queue_capacity must be greater than zero".to_string(),
		));
	}
	if !config.database.is_sqlite() {
		return Err(ConfigError::invalid(
			"database.url",
			format!("'{}' is not a sqlite URL", config.database.url),
		));
	}
	if config.database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database.max_connections must be greater than zero".to_string(),
		));
	}
	let severity = config.audit.min_severity.to_lowercase();
	if !SEVERITY_NAMES.contains(&severity.as_str()) {
		return Err(ConfigError::invalid(
			"audit.min_severity",
			format!("unknown severity '{}'", config.audit.min_severity),
		));
	}

	Ok(())
}
