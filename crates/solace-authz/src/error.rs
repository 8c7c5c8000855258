// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization engine error types.
//!
//! Permission checks never return these: every check ends in a
//! [`Verdict`](crate::Verdict). They surface from the temporary grant
//! lifecycle and from collaborator implementations.

use std::time::Duration;

use solace_authz_core::{Action, Resource, TemporaryGrantId};
use thiserror::Error;

/// Failure reported by an external collaborator (account store, owner
/// resolver, temporary grant store).
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
	/// The backing service could not be reached.
	#[error("collaborator unavailable: {0}")]
	Unavailable(String),

	/// The call did not complete before its deadline.
	#[error("{operation} timed out after {after:?}")]
	Timeout {
		operation: &'static str,
		after: Duration,
	},

	/// The backing store failed.
	#[error("storage error: {0}")]
	Storage(String),

	/// The collaborator panicked while serving the call.
	#[error("{operation} panicked")]
	Panicked { operation: &'static str },
}

impl CollaboratorError {
	pub fn storage(err: impl std::fmt::Display) -> Self {
		Self::Storage(err.to_string())
	}
}

/// Errors returned by administrative operations on the engine.
#[derive(Debug, Error)]
pub enum AuthzError {
	// =========================================================================
	// Authorization Errors
	// =========================================================================
	/// Forbidden operation with a specific reason.
	#[error("forbidden: {0}")]
	Forbidden(String),

	/// The caller lacks the permission required for this operation.
	#[error("insufficient permissions: requires {resource}:{action}")]
	InsufficientPermissions { resource: Resource, action: Action },

	// =========================================================================
	// Temporary Grant Errors
	// =========================================================================
	/// The temporary grant was not found.
	#[error("temporary grant not found: {0}")]
	NotFound(TemporaryGrantId),

	/// The temporary grant was already revoked.
	#[error("temporary grant already revoked: {0}")]
	AlreadyRevoked(TemporaryGrantId),

	/// The requested expiry is in the past or too far in the future.
	#[error("invalid expiry: {0}")]
	InvalidExpiry(String),

	/// A justification is required.
	#[error("a reason is required")]
	MissingReason,

	// =========================================================================
	// Infrastructure Errors
	// =========================================================================
	/// A collaborator failed.
	#[error(transparent)]
	Collaborator(#[from] CollaboratorError),

	/// Internal error.
	#[error("internal error: {0}")]
	Internal(String),
}

impl AuthzError {
	/// Returns true if this error should be logged at error level.
	pub fn is_internal(&self) -> bool {
		matches!(self, AuthzError::Collaborator(_) | AuthzError::Internal(_))
	}

	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			// 403 Forbidden
			AuthzError::Forbidden(_) | AuthzError::InsufficientPermissions { .. } => 403,

			// 404 Not Found
			AuthzError::NotFound(_) => 404,

			// 409 Conflict
			AuthzError::AlreadyRevoked(_) => 409,

			// 422 Unprocessable Entity
			AuthzError::InvalidExpiry(_) | AuthzError::MissingReason => 422,

			// 503 Service Unavailable
			AuthzError::Collaborator(CollaboratorError::Unavailable(_))
			| AuthzError::Collaborator(CollaboratorError::Timeout { .. }) => 503,

			// 500 Internal Server Error
			AuthzError::Collaborator(CollaboratorError::Storage(_))
			| AuthzError::Collaborator(CollaboratorError::Panicked { .. })
			| AuthzError::Internal(_) => 500,
		}
	}
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn forbidden_is_403() {
		assert_eq!(AuthzError::Forbidden("no".into()).status_code(), 403);
		assert_eq!(
			AuthzError::InsufficientPermissions {
				resource: Resource::TemporaryGrant,
				action: Action::Create,
			}
			.status_code(),
			403
		);
	}

	#[test]
	fn grant_lifecycle_statuses() {
		let id = TemporaryGrantId::generate();
		assert_eq!(AuthzError::NotFound(id).status_code(), 404);
		assert_eq!(AuthzError::AlreadyRevoked(id).status_code(), 409);
		assert_eq!(AuthzError::MissingReason.status_code(), 422);
	}

	#[test]
	fn timeouts_are_unavailable() {
		let err: AuthzError = CollaboratorError::Timeout {
			operation: "account status lookup",
			after: Duration::from_millis(5),
		}
		.into();
		assert_eq!(err.status_code(), 503);
		assert!(err.is_internal());
	}

	#[test]
	fn internal_errors_are_flagged() {
		assert!(AuthzError::Internal("test".into()).is_internal());
		assert!(AuthzError::Collaborator(CollaboratorError::storage("disk")).is_internal());
		assert!(!AuthzError::MissingReason.is_internal());
	}

	#[test]
	fn collaborator_panics_are_internal() {
		let err: AuthzError = CollaboratorError::Panicked {
			operation: "owner resolution",
		}
		.into();
		assert_eq!(err.status_code(), 500);
		assert!(err.is_internal());
		assert_eq!(err.to_string(), "owner resolution panicked");
	}

	#[test]
	fn insufficient_permissions_names_the_pair() {
		let err = AuthzError::InsufficientPermissions {
			resource: Resource::TemporaryGrant,
			action: Action::Delete,
		};
		assert_eq!(
			err.to_string(),
			"insufficient permissions: requires temporary_grant:delete"
		);
	}
}
