// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role assignment validation.
//!
//! Only decides whether an assignment may happen; persisting the new role is
//! the caller's job.

use std::fmt;

use serde::Serialize;
use serde_json::json;
use solace_authz_audit::{AuditEventType, AuditLogEntry, AuditOutcome};
use solace_authz_core::{ActorId, RoleName};
use tracing::{debug, info, instrument};

use crate::context::RequestContext;
use crate::service::AuthorizationService;

/// The actor whose role would change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentTarget {
	pub actor_id: ActorId,
	/// The role the target holds today, if any.
	pub current_role: Option<RoleName>,
}

impl AssignmentTarget {
	pub fn new(actor_id: ActorId) -> Self {
		Self {
			actor_id,
			current_role: None,
		}
	}

	pub fn with_current_role(mut self, role: impl Into<RoleName>) -> Self {
		self.current_role = Some(role.into());
		self
	}
}

/// Why an assignment was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRejection {
	/// The new role is not in the catalog.
	UnknownRole,
	/// The assigner's role may not assign roles at all.
	AssignerNotPrivileged,
	/// The new role outranks the assigner.
	ExceedsAssignerPriority,
	/// The target currently outranks the assigner.
	TargetOutranksAssigner,
}

impl fmt::Display for AssignmentRejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			AssignmentRejection::UnknownRole => "unknown_role",
			AssignmentRejection::AssignerNotPrivileged => "assigner_not_privileged",
			AssignmentRejection::ExceedsAssignerPriority => "exceeds_assigner_priority",
			AssignmentRejection::TargetOutranksAssigner => "target_outranks_assigner",
		})
	}
}

/// Result of [`AuthorizationService::validate_assignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentDecision {
	pub valid: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rejection: Option<AssignmentRejection>,
	/// Set for clinical roles, whose credentials must be verified externally.
	pub requires_credential_verification: bool,
}

impl AssignmentDecision {
	fn accept(requires_credential_verification: bool) -> Self {
		Self {
			valid: true,
			reason: None,
			rejection: None,
			requires_credential_verification,
		}
	}

	fn reject(rejection: AssignmentRejection, reason: String) -> Self {
		Self {
			valid: false,
			reason: Some(reason),
			rejection: Some(rejection),
			requires_credential_verification: false,
		}
	}
}

impl AuthorizationService {
	/// Decides whether `assigner` may give `new_role` to `target`.
	///
	/// Rules, first failure wins: the role exists; the assigner's role is on
	/// the assignment allow-list; the assigner's priority is at least the new
	/// role's and at least the target's current role's. Every outcome is
	/// audited.
	#[instrument(
		skip_all,
		fields(target = %target.actor_id, new_role = %new_role, assigner = %assigner.actor_id)
	)]
	pub async fn validate_assignment(
		&self,
		target: &AssignmentTarget,
		new_role: &str,
		assigner: &RequestContext,
	) -> AssignmentDecision {
		let catalog = self.catalog();
		let assigner_role = assigner.role.as_str();
		let new_priority = catalog.priority(new_role);
		let assigner_priority = catalog.priority(assigner_role);
		let current_priority = target
			.current_role
			.as_ref()
			.and_then(|role| catalog.priority(role.as_str()));

		let decision = match (new_priority, assigner_priority) {
			(None, _) => AssignmentDecision::reject(
				AssignmentRejection::UnknownRole,
				format!("role '{new_role}' does not exist"),
			),
			_ if !self.roles.may_assign(assigner_role) => AssignmentDecision::reject(
				AssignmentRejection::AssignerNotPrivileged,
				format!("role '{assigner_role}' may not assign roles"),
			),
			(Some(new), assigner_priority) if assigner_priority.map_or(true, |p| p < new) => {
				AssignmentDecision::reject(
					AssignmentRejection::ExceedsAssignerPriority,
					format!("role '{new_role}' outranks the assigner's role '{assigner_role}'"),
				)
			}
			(_, Some(assigner_priority)) if current_priority.is_some_and(|p| p > assigner_priority) => {
				AssignmentDecision::reject(
					AssignmentRejection::TargetOutranksAssigner,
					"target currently holds a role that outranks the assigner".to_string(),
				)
			}
			_ => AssignmentDecision::accept(self.roles.is_clinical(new_role)),
		};

		let details = json!({
			"target_id": target.actor_id,
			"new_role": new_role,
			"current_role": target.current_role,
			"new_role_priority": new_priority,
			"assigner_priority": assigner_priority,
			"rejection": decision.rejection,
		});

		let mut entry = if decision.valid {
			AuditLogEntry::builder(AuditEventType::RoleAssignmentValidated)
				.outcome(AuditOutcome::Succeeded)
		} else {
			AuditLogEntry::builder(AuditEventType::RoleAssignmentRejected)
				.outcome(AuditOutcome::Rejected)
		}
		.actor(assigner.actor_id)
		.role(assigner_role)
		.resource_type("role_assignment")
		.resource_id(Some(target.actor_id.to_string()))
		.action("assign")
		.details(details.clone());
		if let Some(reason) = &decision.reason {
			entry = entry.reason(reason.clone());
		}
		if let Some(request_id) = &assigner.request_id {
			entry = entry.request_id(request_id.clone());
		}
		self.emit(entry.build()).await;

		if decision.requires_credential_verification {
			let mut entry =
				AuditLogEntry::builder(AuditEventType::ClinicalCredentialVerificationRequired)
					.outcome(AuditOutcome::Succeeded)
					.actor(assigner.actor_id)
					.role(assigner_role)
					.resource_type("role_assignment")
					.resource_id(Some(target.actor_id.to_string()))
					.reason(format!(
						"clinical role '{new_role}' requires external credential verification"
					))
					.details(details);
			if let Some(request_id) = &assigner.request_id {
				entry = entry.request_id(request_id.clone());
			}
			self.emit(entry.build()).await;
			info!(new_role, "clinical role assignment needs credential verification");
		}

		debug!(valid = decision.valid, rejection = ?decision.rejection, "assignment validated");
		decision
	}
}
