// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Condition evaluation.
//!
//! Conditions are evaluated with AND semantics against a [`ConditionContext`].
//! Evaluation never fails: a missing owner, an unregistered predicate, a
//! predicate error or a predicate panic all evaluate to `false`.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::default_catalog::predicates;
use crate::error::{CatalogIssue, PredicateError};
use crate::grant::Condition;
use crate::types::{ActorId, PredicateId};

/// Inputs available to conditions for a single check.
#[derive(Debug, Clone, Copy)]
pub struct ConditionContext<'a> {
	pub actor_id: ActorId,
	pub role: &'a str,
	pub resource_id: Option<&'a str>,
	/// The resolved owner of the resource instance, if known.
	pub owner_id: Option<ActorId>,
	pub extras: &'a Map<String, Value>,
}

impl ConditionContext<'_> {
	/// Returns true only if the extra field is present and JSON `true`.
	pub fn flag(&self, key: &str) -> bool {
		matches!(self.extras.get(key), Some(Value::Bool(true)))
	}
}

/// A named predicate referenced by [`Condition::Custom`].
pub trait ConditionPredicate: Send + Sync {
	fn evaluate(&self, context: &ConditionContext<'_>) -> Result<bool, PredicateError>;
}

/// True iff the named extra field is the boolean `true`.
#[derive(Debug, Clone)]
pub struct ExtraFlagPredicate {
	key: String,
}

impl ExtraFlagPredicate {
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into() }
	}
}

impl ConditionPredicate for ExtraFlagPredicate {
	fn evaluate(&self, context: &ConditionContext<'_>) -> Result<bool, PredicateError> {
		Ok(context.flag(&self.key))
	}
}

/// Registry of custom predicates, keyed by id.
#[derive(Clone, Default)]
pub struct ConditionRegistry {
	predicates: HashMap<PredicateId, Arc<dyn ConditionPredicate>>,
}

impl fmt::Debug for ConditionRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut ids: Vec<&str> = self.predicates.keys().map(PredicateId::as_str).collect();
		ids.sort_unstable();
		f.debug_struct("ConditionRegistry")
			.field("predicates", &ids)
			.finish()
	}
}

impl ConditionRegistry {
	/// An empty registry; every custom condition evaluates to false.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry holding the predicates used by the built-in catalog.
	pub fn with_defaults() -> Self {
		Self::new()
			.with(
				predicates::ACTIVE_CRISIS,
				ExtraFlagPredicate::new("crisis_active"),
			)
			.with(
				predicates::CARE_TEAM_MEMBER,
				ExtraFlagPredicate::new("care_team_member"),
			)
	}

	pub fn register<P>(&mut self, id: impl Into<PredicateId>, predicate: P)
	where
		P: ConditionPredicate + 'static,
	{
		self.predicates.insert(id.into(), Arc::new(predicate));
	}

	pub fn with<P>(mut self, id: impl Into<PredicateId>, predicate: P) -> Self
	where
		P: ConditionPredicate + 'static,
	{
		self.register(id, predicate);
		self
	}

	pub fn get(&self, id: &str) -> Option<&Arc<dyn ConditionPredicate>> {
		self.predicates.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.predicates.contains_key(id)
	}

	/// Custom predicates referenced by the catalog but absent from this registry.
	pub fn missing_predicates(&self, catalog: &Catalog) -> Vec<CatalogIssue> {
		catalog
			.referenced_predicates()
			.into_iter()
			.filter(|(_, predicate)| !self.contains(predicate.as_str()))
			.map(|(role, predicate)| CatalogIssue::UnknownPredicate { role, predicate })
			.collect()
	}

	/// Evaluates all conditions with AND semantics.
	pub fn evaluate(&self, conditions: &[Condition], context: &ConditionContext<'_>) -> bool {
		conditions.iter().all(|c| self.evaluate_one(c, context))
	}

	fn evaluate_one(&self, condition: &Condition, context: &ConditionContext<'_>) -> bool {
		match condition {
			Condition::Ownership => context.owner_id == Some(context.actor_id),
			Condition::Custom { predicate } => self.evaluate_custom(predicate, context),
		}
	}

	fn evaluate_custom(&self, id: &PredicateId, context: &ConditionContext<'_>) -> bool {
		let Some(predicate) = self.predicates.get(id) else {
			debug!(predicate = %id, "unregistered predicate evaluates to false");
			return false;
		};

		match catch_unwind(AssertUnwindSafe(|| predicate.evaluate(context))) {
			Ok(Ok(result)) => result,
			Ok(Err(e)) => {
				warn!(predicate = %id, error = %e, "predicate error treated as false");
				false
			}
			Err(_) => {
				warn!(predicate = %id, "predicate panicked, treated as false");
				false
			}
		}
	}
}
