// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The permission catalog: an immutable table of roles.
//!
//! A catalog is built once at process start, either from the built-in
//! [`default_catalog`](crate::default_catalog) or from deploy-time
//! configuration, and never mutated afterwards. Misconfiguration never
//! prevents construction; [`Catalog::validate`] reports it so deployments can
//! refuse to start, while the resolver treats affected roles as having no
//! permissions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

use crate::error::CatalogIssue;
use crate::grant::Condition;
use crate::role::Role;
use crate::types::{PredicateId, RoleName};

/// Serializable form of a catalog, as loaded from configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
	#[serde(default)]
	pub roles: Vec<Role>,
}

/// Immutable role table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	roles: BTreeMap<RoleName, Role>,
	duplicates: Vec<RoleName>,
}

impl Catalog {
	pub fn builder() -> CatalogBuilder {
		CatalogBuilder::default()
	}

	pub fn from_document(document: CatalogDocument) -> Self {
		Self::builder().roles(document.roles).build()
	}

	pub fn to_document(&self) -> CatalogDocument {
		CatalogDocument {
			roles: self.roles_by_priority().into_iter().cloned().collect(),
		}
	}

	pub fn get(&self, name: &str) -> Option<&Role> {
		self.roles.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.roles.contains_key(name)
	}

	pub fn priority(&self, name: &str) -> Option<i32> {
		self.get(name).map(|r| r.priority)
	}

	/// Roles ordered by name.
	pub fn roles(&self) -> impl Iterator<Item = &Role> {
		self.roles.values()
	}

	/// Roles ordered from most to least privileged, ties broken by name.
	pub fn roles_by_priority(&self) -> Vec<&Role> {
		let mut roles: Vec<&Role> = self.roles.values().collect();
		roles.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
		roles
	}

	pub fn len(&self) -> usize {
		self.roles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.roles.is_empty()
	}

	/// Every custom predicate id referenced by any grant, with the role that references it.
	pub fn referenced_predicates(&self) -> Vec<(RoleName, PredicateId)> {
		let mut refs = Vec::new();
		for role in self.roles.values() {
			for grant in &role.grants {
				for condition in &grant.conditions {
					if let Condition::Custom { predicate } = condition {
						refs.push((role.name.clone(), predicate.clone()));
					}
				}
			}
		}
		refs
	}

	/// Reports duplicate definitions, dangling inheritance edges and cycles.
	pub fn validate(&self) -> Vec<CatalogIssue> {
		let mut issues: Vec<CatalogIssue> = self
			.duplicates
			.iter()
			.map(|role| CatalogIssue::DuplicateRole { role: role.clone() })
			.collect();

		for role in self.roles.values() {
			for inherited in &role.inherits {
				if !self.contains(inherited.as_str()) {
					issues.push(CatalogIssue::UnknownInheritedRole {
						role: role.name.clone(),
						inherited: inherited.clone(),
					});
				}
			}
		}

		issues.extend(self.find_cycles());
		issues
	}

	fn find_cycles(&self) -> Vec<CatalogIssue> {
		let mut done: HashSet<&RoleName> = HashSet::new();
		let mut seen_cycles: HashSet<Vec<RoleName>> = HashSet::new();
		let mut issues = Vec::new();

		for name in self.roles.keys() {
			let mut stack: Vec<&RoleName> = Vec::new();
			self.walk_for_cycles(name, &mut stack, &mut done, &mut seen_cycles, &mut issues);
		}
		issues
	}

	fn walk_for_cycles<'a>(
		&'a self,
		name: &'a RoleName,
		stack: &mut Vec<&'a RoleName>,
		done: &mut HashSet<&'a RoleName>,
		seen_cycles: &mut HashSet<Vec<RoleName>>,
		issues: &mut Vec<CatalogIssue>,
	) {
		if done.contains(name) {
			return;
		}
		if let Some(start) = stack.iter().position(|n| *n == name) {
			let mut path: Vec<RoleName> = stack[start..].iter().map(|n| (*n).clone()).collect();
			let mut canonical = path.clone();
			canonical.sort();
			if seen_cycles.insert(canonical) {
				path.push(name.clone());
				issues.push(CatalogIssue::InheritanceCycle { path });
			}
			return;
		}
		let Some(role) = self.roles.get(name) else {
			return;
		};

		stack.push(name);
		for inherited in &role.inherits {
			if let Some((key, _)) = self.roles.get_key_value(inherited.as_str()) {
				self.walk_for_cycles(key, stack, done, seen_cycles, issues);
			}
		}
		stack.pop();
		done.insert(name);
	}
}

/// Collects role definitions into a [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
	roles: Vec<Role>,
}

impl CatalogBuilder {
	pub fn role(mut self, role: Role) -> Self {
		self.roles.push(role);
		self
	}

	pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
		self.roles.extend(roles);
		self
	}

	/// Builds the catalog. For duplicate names the first definition wins.
	pub fn build(self) -> Catalog {
		let mut roles = BTreeMap::new();
		let mut duplicates = Vec::new();
		let mut counts: HashMap<RoleName, usize> = HashMap::new();

		for role in self.roles {
			*counts.entry(role.name.clone()).or_default() += 1;
			if roles.contains_key(&role.name) {
				warn!(role = %role.name, "duplicate role definition ignored");
				if counts[&role.name] == 2 {
					duplicates.push(role.name.clone());
				}
				continue;
			}
			roles.insert(role.name.clone(), role);
		}

		Catalog { roles, duplicates }
	}
}
