// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role definitions.

use serde::{Deserialize, Serialize};

use crate::grant::Grant;
use crate::types::RoleName;

/// A role in the permission catalog.
///
/// Roles are plain data: a name, a priority used for hierarchy enforcement
/// (higher is more privileged), the names of inherited roles and an explicit
/// grant list. Inheritance is resolved by [`crate::PermissionResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	pub name: RoleName,
	pub priority: i32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub inherits: Vec<RoleName>,
	#[serde(default)]
	pub grants: Vec<Grant>,
}

impl Role {
	pub fn new(name: impl Into<RoleName>, priority: i32) -> Self {
		Self {
			name: name.into(),
			priority,
			description: None,
			inherits: Vec::new(),
			grants: Vec::new(),
		}
	}

	pub fn describe(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn inherit(mut self, role: impl Into<RoleName>) -> Self {
		self.inherits.push(role.into());
		self
	}

	pub fn grant(mut self, grant: Grant) -> Self {
		self.grants.push(grant);
		self
	}

	pub fn grants(mut self, grants: impl IntoIterator<Item = Grant>) -> Self {
		self.grants.extend(grants);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Action, Resource};

	#[test]
	fn builder_collects_inheritance_and_grants() {
		let role = Role::new("therapist", 60)
			.inherit("user")
			.grant(Grant::new(Resource::TherapyNote, Action::Create));

		assert_eq!(role.name.as_str(), "therapist");
		assert_eq!(role.inherits, vec![RoleName::new("user")]);
		assert_eq!(role.grants.len(), 1);
	}

	#[test]
	fn deserializes_with_defaults() {
		let role: Role = serde_json::from_str(r#"{"name":"guest","priority":0}"#).unwrap();
		assert!(role.inherits.is_empty());
		assert!(role.grants.is_empty());
		assert!(role.description.is_none());
	}
}
