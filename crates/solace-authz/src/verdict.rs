// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;
use solace_authz_core::{Grant, PermissionKey};

pub(crate) const REASON_SUPER_ROLE: &str = "super role bypass";
pub(crate) const REASON_TEMPORARY_GRANT: &str = "granted by temporary grant";
pub(crate) const REASON_INACTIVE: &str = "account is inactive";
pub(crate) const REASON_LOCKED: &str = "account is locked";
pub(crate) const REASON_NOT_FOUND: &str = "account not found";
pub(crate) const REASON_SYSTEM_ERROR: &str = "system error";
pub(crate) const REASON_UNKNOWN_RESOURCE: &str = "unknown resource";
pub(crate) const REASON_UNKNOWN_ACTION: &str = "unknown action";

/// The outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
	pub allowed: bool,
	pub reason: String,
	/// The pair that was required, set on permission denials.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub required_grant: Option<PermissionKey>,
	/// What the actor does hold, set on permission denials.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub effective_grants: Option<Vec<Grant>>,
}

impl Verdict {
	pub fn allow(reason: impl Into<String>) -> Self {
		Self {
			allowed: true,
			reason: reason.into(),
			required_grant: None,
			effective_grants: None,
		}
	}

	pub fn deny(reason: impl Into<String>) -> Self {
		Self {
			allowed: false,
			reason: reason.into(),
			required_grant: None,
			effective_grants: None,
		}
	}

	/// A denial for lack of a matching grant.
	pub fn insufficient(required: PermissionKey, effective: Vec<Grant>) -> Self {
		Self {
			allowed: false,
			reason: format!("insufficient permissions for {required}"),
			required_grant: Some(required),
			effective_grants: Some(effective),
		}
	}

	pub(crate) fn granted_by_role(role: &str) -> Self {
		Self::allow(format!("granted by role '{role}'"))
	}

	pub(crate) fn cached(allowed: bool) -> Self {
		if allowed {
			Self::allow("allowed (cached)")
		} else {
			Self::deny("denied (cached)")
		}
	}

	pub fn is_cached(&self) -> bool {
		self.reason.ends_with("(cached)")
	}
}
