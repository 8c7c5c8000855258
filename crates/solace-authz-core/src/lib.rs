// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core permission model for the Solace authorization engine.
//!
//! This crate is pure data and pure functions; it performs no I/O.
//!
//! # Overview
//!
//! - [`Resource`] and [`Action`]: the closed sets of protected entity classes and verbs
//! - [`Grant`] and [`Condition`]: what a role may do, and when
//! - [`Role`] and [`Catalog`]: the immutable role table, with [`default_catalog`]
//! - [`PermissionResolver`]: inheritance resolution into [`EffectivePermissions`]
//! - [`ConditionRegistry`]: evaluation of ownership and named custom predicates
//! - [`is_sensitive`]: which checks are always audited
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use solace_authz_core::{default_catalog, roles, Action, PermissionResolver, Resource};
//!
//! let resolver = PermissionResolver::new(Arc::new(default_catalog()));
//! let perms = resolver.resolve(roles::COMPLIANCE_OFFICER);
//! assert!(perms.contains(Resource::AuditLog, Action::Export));
//! assert!(resolver.resolve("no_such_role").is_empty());
//! ```

pub mod catalog;
pub mod condition;
pub mod default_catalog;
pub mod error;
pub mod grant;
pub mod resolver;
pub mod resource;
pub mod role;
pub mod sensitivity;
pub mod types;

pub use catalog::{Catalog, CatalogBuilder, CatalogDocument};
pub use condition::{ConditionContext, ConditionPredicate, ConditionRegistry, ExtraFlagPredicate};
pub use default_catalog::{default_catalog, predicates, roles};
pub use error::{CatalogIssue, PredicateError, TagParseError};
pub use grant::{Condition, Grant, PermissionKey};
pub use resolver::{EffectivePermissions, PermissionResolver, ResourcePermissions};
pub use resource::{Action, Resource};
pub use role::Role;
pub use sensitivity::{is_sensitive, SENSITIVE_ACTIONS, SENSITIVE_RESOURCES};
pub use types::{ActorId, PredicateId, RoleName, TemporaryGrantId};
