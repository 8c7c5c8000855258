// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading the permission catalog from deploy-time configuration.
//!
//! Catalog files use the serialized form of [`CatalogDocument`]:
//!
//! ```toml
//! [[roles]]
//! name = "user"
//! priority = 10
//! inherits = ["guest"]
//! grants = [
//!   { resource = "mood_entry", action = "read", conditions = [{ type = "ownership" }] },
//! ]
//! ```

use std::path::Path;

use solace_authz_core::{default_catalog, Catalog, CatalogDocument};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::sections::RolesConfig;

/// Loads the configured catalog, or the built-in one when no path is set.
pub fn load_catalog(roles: &RolesConfig) -> Result<Catalog, ConfigError> {
	match &roles.catalog_path {
		Some(path) => load_catalog_file(path),
		None => {
			debug!("using built-in permission catalog");
			Ok(default_catalog())
		}
	}
}

pub fn load_catalog_file(path: &Path) -> Result<Catalog, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
		path: path.to_path_buf(),
		source: e,
	})?;
	let catalog = parse_catalog(&content).map_err(|e| ConfigError::TomlParse {
		path: path.to_path_buf(),
		source: e,
	})?;

	info!(path = %path.display(), roles = catalog.len(), "permission catalog loaded");
	Ok(catalog)
}

pub fn parse_catalog(content: &str) -> Result<Catalog, toml::de::Error> {
	let document: CatalogDocument = toml::from_str(content)?;
	Ok(Catalog::from_document(document))
}

#[cfg(test)]
mod tests {
	use super::*;
	use solace_authz_core::{Action, Condition, Resource};
	use std::io::Write;

	const CATALOG: &str = r#"
[[roles]]
name = "guest"
priority = 0

[[roles]]
name = "user"
priority = 10
inherits = ["guest"]
grants = [
	{ resource = "mood_entry", action = "create" },
	{ resource = "mood_entry", action = "read", conditions = [{ type = "ownership" }] },
	{ resource = "therapy_note", action = "read", conditions = [{ type = "custom", predicate = "care_team_member" }] },
]
"#;

	#[test]
	fn test_parse_catalog() {
		let catalog = parse_catalog(CATALOG).unwrap();
		assert_eq!(catalog.len(), 2);

		let user = catalog.get("user").unwrap();
		assert_eq!(user.priority, 10);
		assert_eq!(user.grants[1].resource, Resource::MoodEntry);
		assert_eq!(user.grants[1].action, Action::Read);
		assert_eq!(user.grants[1].conditions, vec![Condition::Ownership]);
		assert_eq!(
			user.grants[2].conditions,
			vec![Condition::custom("care_team_member")]
		);
	}

	#[test]
	fn test_unknown_resource_rejected() {
		let content = r#"
[[roles]]
name = "x"
priority = 1
grants = [{ resource = "chart", action = "read" }]
"#;
		assert!(parse_catalog(content).is_err());
	}

	#[test]
	fn test_default_when_no_path() {
		let catalog = load_catalog(&RolesConfig::default()).unwrap();
		assert!(catalog.contains("super_admin"));
	}

	#[test]
	fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(CATALOG.as_bytes()).unwrap();

		let roles = RolesConfig {
			catalog_path: Some(file.path().to_path_buf()),
			..Default::default()
		};
		let catalog = load_catalog(&roles).unwrap();
		assert!(catalog.contains("user"));
		assert!(!catalog.contains("super_admin"));
	}

	#[test]
	fn test_missing_file_is_error() {
		let roles = RolesConfig {
			catalog_path: Some("/nonexistent/catalog.toml".into()),
			..Default::default()
		};
		assert!(matches!(
			load_catalog(&roles),
			Err(ConfigError::FileRead { .. })
		));
	}

	#[test]
	fn test_default_catalog_roundtrips_through_toml() {
		let document = default_catalog().to_document();
		let content = toml::to_string(&document).unwrap();
		let catalog = parse_catalog(&content).unwrap();
		assert_eq!(catalog.len(), default_catalog().len());
	}
}
