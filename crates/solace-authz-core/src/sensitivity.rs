// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Classification of security-sensitive permission checks.

use crate::resource::{Action, Resource};

/// Resources whose every access decision is audited.
pub const SENSITIVE_RESOURCES: &[Resource] =
	&[Resource::TherapyNote, Resource::AuditLog, Resource::SystemConfig];

/// Actions whose every decision is audited, on any resource.
pub const SENSITIVE_ACTIONS: &[Action] = &[
	Action::Delete,
	Action::Export,
	Action::Override,
	Action::Configure,
];

/// Whether a check on this pair must produce an audit event regardless of outcome.
pub fn is_sensitive(resource: Resource, action: Action) -> bool {
	SENSITIVE_RESOURCES.contains(&resource) || SENSITIVE_ACTIONS.contains(&action)
}
