// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role policy configuration section.

use serde::{Deserialize, Serialize};
use solace_authz_core::roles;
use std::path::PathBuf;

fn default_super_role() -> String {
	roles::SUPER_ADMIN.to_string()
}

fn default_assignment_roles() -> Vec<String> {
	vec![roles::SUPER_ADMIN.to_string(), roles::ADMIN.to_string()]
}

fn default_clinical_roles() -> Vec<String> {
	[
		roles::THERAPIST,
		roles::PSYCHIATRIST,
		roles::CLINICAL_SUPERVISOR,
		roles::CRISIS_COUNSELOR,
	]
	.into_iter()
	.map(String::from)
	.collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RolesConfigLayer {
	pub super_role: Option<String>,
	pub assignment_roles: Option<Vec<String>>,
	pub clinical_roles: Option<Vec<String>>,
	pub catalog_path: Option<PathBuf>,
}

impl RolesConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.super_role.is_some() {
			self.super_role = other.super_role;
		}
		if other.assignment_roles.is_some() {
			self.assignment_roles = other.assignment_roles;
		}
		if other.clinical_roles.is_some() {
			self.clinical_roles = other.clinical_roles;
		}
		if other.catalog_path.is_some() {
			self.catalog_path = other.catalog_path;
		}
	}

	pub fn finalize(self) -> RolesConfig {
		RolesConfig {
			super_role: self.super_role.unwrap_or_else(default_super_role),
			assignment_roles: self
				.assignment_roles
				.unwrap_or_else(default_assignment_roles),
			clinical_roles: self.clinical_roles.unwrap_or_else(default_clinical_roles),
			catalog_path: self.catalog_path,
		}
	}
}

/// Role policy: the bypass role, who may assign roles, and which roles are clinical.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RolesConfig {
	pub super_role: String,
	pub assignment_roles: Vec<String>,
	pub clinical_roles: Vec<String>,
	/// TOML catalog file; the built-in catalog is used when unset.
	pub catalog_path: Option<PathBuf>,
}

impl RolesConfig {
	pub fn is_clinical(&self, role: &str) -> bool {
		self.clinical_roles.iter().any(|r| r == role)
	}

	pub fn may_assign(&self, role: &str) -> bool {
		self.assignment_roles.iter().any(|r| r == role)
	}
}

impl Default for RolesConfig {
	fn default() -> Self {
		RolesConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = RolesConfig::default();
		assert_eq!(config.super_role, "super_admin");
		assert!(config.may_assign("admin"));
		assert!(!config.may_assign("therapist"));
		assert!(config.is_clinical("psychiatrist"));
		assert!(!config.is_clinical("support_staff"));
		assert!(config.catalog_path.is_none());
	}

	#[test]
	fn test_list_override_replaces_whole_list() {
		let mut base = RolesConfigLayer::default();
		base.merge(RolesConfigLayer {
			assignment_roles: Some(vec!["super_admin".to_string()]),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.assignment_roles, vec!["super_admin".to_string()]);
	}

	#[test]
	fn test_deserialize_catalog_path() {
		let layer: RolesConfigLayer =
			toml::from_str(r#"catalog_path = "/etc/solace/catalog.toml""#).unwrap();
		assert_eq!(
			layer.catalog_path,
			Some(PathBuf::from("/etc/solace/catalog.toml"))
		);
	}
}
