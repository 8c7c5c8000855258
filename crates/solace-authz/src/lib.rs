// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role-based authorization for the Solace platform.
//!
//! [`AuthorizationService`] answers "may this actor do this" for a
//! [`RequestContext`], caches verdicts in a [`DecisionCache`], manages
//! [`TemporaryGrant`]s and validates role assignments. Decisions that matter
//! for compliance are published to an
//! [`AuditSink`](solace_authz_audit::AuditSink).
//!
//! Permission checks always return a [`Verdict`]; failures inside the engine
//! deny rather than propagate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use solace_authz::{
//! 	AuthorizationService, InMemoryAccountStatusProvider, RequestContext,
//! };
//! use solace_authz_core::{default_catalog, Action, ActorId, Resource};
//!
//! # tokio_test::block_on(async {
//! let service = AuthorizationService::builder(
//! 	Arc::new(default_catalog()),
//! 	Arc::new(InMemoryAccountStatusProvider::assume_active()),
//! )
//! .build();
//!
//! let ctx = RequestContext::new(ActorId::generate(), "therapist");
//! let verdict = service
//! 	.check_permission(&ctx, Resource::Appointment, Action::Read, false)
//! 	.await;
//! assert!(verdict.allowed);
//! # });
//! ```

pub mod assignment;
pub mod cache;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod service;
pub mod temporary;
pub mod verdict;

pub use assignment::{AssignmentDecision, AssignmentRejection, AssignmentTarget};
pub use cache::{CacheKey, CacheStats, DecisionCache};
pub use collaborators::{
	AccountStatus, AccountStatusProvider, InMemoryAccountStatusProvider, InMemoryOwnerResolver,
	OwnerResolverRegistry, ResourceOwnerResolver,
};
pub use context::RequestContext;
pub use error::{AuthzError, AuthzResult, CollaboratorError};
pub use service::{AuthorizationService, AuthorizationServiceBuilder};
pub use temporary::{InMemoryTemporaryGrantStore, TemporaryGrant, TemporaryGrantStore};
pub use verdict::Verdict;
