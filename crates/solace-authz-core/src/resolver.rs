// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Effective permission resolution.
//!
//! The resolver walks the inheritance graph of every role once, at
//! construction, and keeps the result. Resolution rules:
//!
//! 1. A role's own grants are visited first, then inherited roles in
//!    declaration order.
//! 2. Grants are de-duplicated on (resource, action). The first grant seen for
//!    a pair is kept, except that an unconditional grant always replaces a
//!    conditional one.
//! 3. Unknown roles resolve to the empty set. Unknown inherited roles
//!    contribute nothing.
//! 4. A role whose inheritance closure contains a cycle resolves to the empty
//!    set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, warn};

use crate::catalog::Catalog;
use crate::error::CatalogIssue;
use crate::grant::{Grant, PermissionKey};
use crate::resource::{Action, Resource};
use crate::types::RoleName;

/// The fully resolved, de-duplicated grants of a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissions {
	grants: BTreeMap<PermissionKey, Grant>,
}

impl EffectivePermissions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a grant, applying the unconditional-wins de-duplication rule.
	pub fn insert(&mut self, grant: Grant) {
		match self.grants.get(&grant.key()) {
			Some(existing) if existing.is_unconditional() || !grant.is_unconditional() => {}
			_ => {
				self.grants.insert(grant.key(), grant);
			}
		}
	}

	pub fn merge(&mut self, other: &EffectivePermissions) {
		for grant in other.grants.values() {
			self.insert(grant.clone());
		}
	}

	pub fn get(&self, resource: Resource, action: Action) -> Option<&Grant> {
		self.grants.get(&PermissionKey::new(resource, action))
	}

	pub fn contains(&self, resource: Resource, action: Action) -> bool {
		self.get(resource, action).is_some()
	}

	pub fn grants(&self) -> impl Iterator<Item = &Grant> {
		self.grants.values()
	}

	pub fn to_vec(&self) -> Vec<Grant> {
		self.grants.values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.grants.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grants.is_empty()
	}

	/// Groups actions per resource, for driving UI affordances.
	pub fn summarize(&self) -> Vec<ResourcePermissions> {
		let mut grouped: BTreeMap<Resource, Vec<Action>> = BTreeMap::new();
		for key in self.grants.keys() {
			grouped.entry(key.resource).or_default().push(key.action);
		}
		grouped
			.into_iter()
			.map(|(resource, actions)| ResourcePermissions { resource, actions })
			.collect()
	}
}

impl FromIterator<Grant> for EffectivePermissions {
	fn from_iter<I: IntoIterator<Item = Grant>>(iter: I) -> Self {
		let mut perms = EffectivePermissions::new();
		for grant in iter {
			perms.insert(grant);
		}
		perms
	}
}

/// Actions available on one resource. Not an enforcement point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermissions {
	pub resource: Resource,
	pub actions: Vec<Action>,
}

/// Resolves role names to their effective permissions.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
	catalog: Arc<Catalog>,
	resolved: HashMap<RoleName, Arc<EffectivePermissions>>,
	empty: Arc<EffectivePermissions>,
}

impl PermissionResolver {
	pub fn new(catalog: Arc<Catalog>) -> Self {
		let mut walk = Walk {
			catalog: &catalog,
			memo: HashMap::new(),
			poisoned: HashMap::new(),
		};

		let names: Vec<RoleName> = catalog.roles().map(|r| r.name.clone()).collect();
		for name in &names {
			let mut visiting = Vec::new();
			if let Err(issue) = walk.resolve(name, &mut visiting) {
				error!(role = %name, issue = %issue, "role resolves to no permissions");
				walk.poisoned.insert(name.clone(), issue);
				walk.memo.remove(name);
			}
		}

		let empty = Arc::new(EffectivePermissions::new());
		let mut resolved = walk.memo;
		for name in walk.poisoned.keys() {
			resolved.insert(name.clone(), Arc::clone(&empty));
		}

		Self {
			catalog,
			resolved,
			empty,
		}
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	pub fn catalog_arc(&self) -> Arc<Catalog> {
		Arc::clone(&self.catalog)
	}

	/// Returns the effective permissions of a role; empty for unknown roles.
	pub fn resolve(&self, role: &str) -> Arc<EffectivePermissions> {
		self
			.resolved
			.get(role)
			.cloned()
			.unwrap_or_else(|| Arc::clone(&self.empty))
	}
}

struct Walk<'a> {
	catalog: &'a Catalog,
	memo: HashMap<RoleName, Arc<EffectivePermissions>>,
	poisoned: HashMap<RoleName, CatalogIssue>,
}

impl Walk<'_> {
	fn resolve(
		&mut self,
		name: &RoleName,
		visiting: &mut Vec<RoleName>,
	) -> Result<Arc<EffectivePermissions>, CatalogIssue> {
		if let Some(issue) = self.poisoned.get(name) {
			return Err(issue.clone());
		}
		if let Some(done) = self.memo.get(name) {
			return Ok(Arc::clone(done));
		}
		if visiting.contains(name) {
			let mut path = visiting.clone();
			path.push(name.clone());
			return Err(CatalogIssue::InheritanceCycle { path });
		}
		let Some(role) = self.catalog.get(name.as_str()) else {
			return Ok(Arc::new(EffectivePermissions::new()));
		};

		visiting.push(name.clone());
		let mut perms: EffectivePermissions = role.grants.iter().cloned().collect();
		for inherited in &role.inherits {
			if !self.catalog.contains(inherited.as_str()) {
				warn!(role = %name, inherited = %inherited, "ignoring unknown inherited role");
				continue;
			}
			let parent = self.resolve(inherited, visiting)?;
			perms.merge(&parent);
		}
		visiting.pop();

		let perms = Arc::new(perms);
		self.memo.insert(name.clone(), Arc::clone(&perms));
		Ok(perms)
	}
}
