// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Catalog-level error types.
//!
//! None of these are ever raised from a permission check. Tag parse errors are
//! converted into denials by the service, and catalog issues only affect the
//! roles involved, which resolve to an empty permission set.

use thiserror::Error;

use crate::types::{PredicateId, RoleName};

/// A resource or action tag that is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagParseError {
	#[error("unknown resource: {0}")]
	UnknownResource(String),

	#[error("unknown action: {0}")]
	UnknownAction(String),
}

/// A structural problem found in a permission catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogIssue {
	/// Two roles share a name; only the first definition is kept.
	#[error("role '{role}' is defined more than once")]
	DuplicateRole { role: RoleName },

	/// A role inherits from a role that is not in the catalog.
	#[error("role '{role}' inherits unknown role '{inherited}'")]
	UnknownInheritedRole { role: RoleName, inherited: RoleName },

	/// The inheritance graph contains a cycle.
	#[error("inheritance cycle: {}", format_path(.path))]
	InheritanceCycle { path: Vec<RoleName> },

	/// A grant references a custom predicate that is not registered.
	#[error("role '{role}' references unregistered predicate '{predicate}'")]
	UnknownPredicate {
		role: RoleName,
		predicate: PredicateId,
	},
}

/// A custom predicate could not reach a decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("predicate '{predicate}' failed: {message}")]
pub struct PredicateError {
	pub predicate: PredicateId,
	pub message: String,
}

impl PredicateError {
	pub fn new(predicate: impl Into<PredicateId>, message: impl Into<String>) -> Self {
		Self {
			predicate: predicate.into(),
			message: message.into(),
		}
	}
}

fn format_path(path: &[RoleName]) -> String {
	path
		.iter()
		.map(RoleName::as_str)
		.collect::<Vec<_>>()
		.join(" -> ")
}
