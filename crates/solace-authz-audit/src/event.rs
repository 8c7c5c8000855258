// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core event types for authorization auditing.
//!
//! This module provides the foundational types for the audit system:
//!
//! - [`AuditEventType`]: Enumeration of all auditable authorization events
//! - [`AuditCategory`]: Coarse grouping used by compliance reports
//! - [`AuditOutcome`]: What the engine decided
//! - [`AuditSeverity`]: RFC 5424-compatible severity levels
//! - [`AuditLogEntry`]: Complete audit record with the decision context
//! - [`AuditLogBuilder`]: Fluent API for constructing entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solace_authz_core::ActorId;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Types of events that can be recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	// Permission checks
	AccessGranted,
	AccessDenied,
	PrivilegedAccess,

	// Account status denials
	AccountInactive,
	AccountLocked,
	AccountNotFound,

	// Temporary grants
	TemporaryGrantCreated,
	TemporaryGrantRevoked,

	// Role assignment
	RoleAssignmentValidated,
	RoleAssignmentRejected,
	ClinicalCredentialVerificationRequired,

	// Internal failures
	SystemError,
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditEventType::AccessGranted => "access_granted",
			AuditEventType::AccessDenied => "access_denied",
			AuditEventType::PrivilegedAccess => "privileged_access",
			AuditEventType::AccountInactive => "account_inactive",
			AuditEventType::AccountLocked => "account_locked",
			AuditEventType::AccountNotFound => "account_not_found",
			AuditEventType::TemporaryGrantCreated => "temporary_grant_created",
			AuditEventType::TemporaryGrantRevoked => "temporary_grant_revoked",
			AuditEventType::RoleAssignmentValidated => "role_assignment_validated",
			AuditEventType::RoleAssignmentRejected => "role_assignment_rejected",
			AuditEventType::ClinicalCredentialVerificationRequired => {
				"clinical_credential_verification_required"
			}
			AuditEventType::SystemError => "system_error",
		};
		write!(f, "{s}")
	}
}

impl AuditEventType {
	/// Returns the default severity level for this event type.
	pub fn default_severity(&self) -> AuditSeverity {
		match self {
			AuditEventType::AccessGranted => AuditSeverity::Info,

			AuditEventType::PrivilegedAccess | AuditEventType::RoleAssignmentValidated => {
				AuditSeverity::Notice
			}

			AuditEventType::AccessDenied
			| AuditEventType::AccountInactive
			| AuditEventType::AccountLocked
			| AuditEventType::AccountNotFound
			| AuditEventType::RoleAssignmentRejected
			| AuditEventType::ClinicalCredentialVerificationRequired => AuditSeverity::Warning,

			AuditEventType::TemporaryGrantCreated
			| AuditEventType::TemporaryGrantRevoked
			| AuditEventType::SystemError => AuditSeverity::Error,
		}
	}

	/// Events every decision path must record. Filters never drop these.
	pub fn is_mandatory(&self) -> bool {
		matches!(
			self,
			AuditEventType::AccessGranted
				| AuditEventType::AccessDenied
				| AuditEventType::PrivilegedAccess
				| AuditEventType::AccountInactive
				| AuditEventType::AccountLocked
				| AuditEventType::AccountNotFound
				| AuditEventType::TemporaryGrantCreated
				| AuditEventType::TemporaryGrantRevoked
				| AuditEventType::SystemError
		)
	}

	pub fn category(&self) -> AuditCategory {
		match self {
			AuditEventType::AccessGranted
			| AuditEventType::AccessDenied
			| AuditEventType::PrivilegedAccess => AuditCategory::Authorization,
			AuditEventType::AccountInactive
			| AuditEventType::AccountLocked
			| AuditEventType::AccountNotFound => AuditCategory::AccountStatus,
			AuditEventType::TemporaryGrantCreated | AuditEventType::TemporaryGrantRevoked => {
				AuditCategory::PermissionChange
			}
			AuditEventType::RoleAssignmentValidated
			| AuditEventType::RoleAssignmentRejected
			| AuditEventType::ClinicalCredentialVerificationRequired => AuditCategory::RoleChange,
			AuditEventType::SystemError => AuditCategory::System,
		}
	}
}

/// Coarse grouping of audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
	Authorization,
	AccountStatus,
	PermissionChange,
	RoleChange,
	System,
}

impl fmt::Display for AuditCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditCategory::Authorization => "authorization",
			AuditCategory::AccountStatus => "account_status",
			AuditCategory::PermissionChange => "permission_change",
			AuditCategory::RoleChange => "role_change",
			AuditCategory::System => "system",
		};
		write!(f, "{s}")
	}
}

/// The result recorded with an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
	Allowed,
	#[default]
	Denied,
	Succeeded,
	Rejected,
	Failed,
}

impl fmt::Display for AuditOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditOutcome::Allowed => "allowed",
			AuditOutcome::Denied => "denied",
			AuditOutcome::Succeeded => "succeeded",
			AuditOutcome::Rejected => "rejected",
			AuditOutcome::Failed => "failed",
		};
		write!(f, "{s}")
	}
}

/// Severity levels following RFC 5424 syslog conventions.
///
/// The numeric values correspond to syslog severity codes, allowing
/// direct mapping when forwarding to syslog-based SIEM systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Debug = 7,
	#[default]
	Info = 6,
	Notice = 5,
	Warning = 4,
	Error = 3,
	Critical = 2,
}

impl AuditSeverity {
	/// Returns the RFC 5424 numeric severity code.
	pub fn as_syslog_code(&self) -> u8 {
		*self as u8
	}

	/// Returns all severity levels from most to least severe.
	pub fn all() -> &'static [AuditSeverity] {
		&[
			AuditSeverity::Critical,
			AuditSeverity::Error,
			AuditSeverity::Warning,
			AuditSeverity::Notice,
			AuditSeverity::Info,
			AuditSeverity::Debug,
		]
	}
}

impl PartialOrd for AuditSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for AuditSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		// Lower numeric value = higher severity (Critical=2 > Debug=7)
		(*other as u8).cmp(&(*self as u8))
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Debug => "debug",
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
			AuditSeverity::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

impl FromStr for AuditSeverity {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		AuditSeverity::all()
			.iter()
			.copied()
			.find(|level| level.to_string().eq_ignore_ascii_case(s))
			.ok_or_else(|| format!("unknown severity '{s}'"))
	}
}

/// An entry in the audit log recording a security-relevant decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
	/// Unique identifier for this audit entry.
	pub id: Uuid,
	/// When the event occurred.
	pub timestamp: DateTime<Utc>,
	pub event_type: AuditEventType,
	pub category: AuditCategory,
	pub severity: AuditSeverity,
	pub outcome: AuditOutcome,

	/// The actor whose request was decided (if known).
	pub actor_id: Option<ActorId>,
	/// The role the actor presented.
	pub role: Option<String>,

	/// The resource tag (e.g., "therapy_note", "audit_log").
	pub resource_type: Option<String>,
	/// The resource instance id, when the check targeted one.
	pub resource_id: Option<String>,

	/// The action tag, or a short description for lifecycle events.
	pub action: String,
	/// The reason attached to the decision.
	pub reason: Option<String>,
	/// Additional event-specific details.
	pub details: serde_json::Value,

	/// Application-level request ID for correlation.
	pub request_id: Option<String>,
}

impl AuditLogEntry {
	/// Create a new audit log builder for the given event type.
	pub fn builder(event_type: AuditEventType) -> AuditLogBuilder {
		AuditLogBuilder::new(event_type)
	}
}

/// Builder for constructing audit log entries with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	event_type: AuditEventType,
	severity: Option<AuditSeverity>,
	outcome: Option<AuditOutcome>,
	actor_id: Option<ActorId>,
	role: Option<String>,
	resource_type: Option<String>,
	resource_id: Option<String>,
	action: Option<String>,
	reason: Option<String>,
	details: serde_json::Value,
	request_id: Option<String>,
}

impl AuditLogBuilder {
	/// Create a new builder for the given event type.
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			event_type,
			severity: None,
			outcome: None,
			actor_id: None,
			role: None,
			resource_type: None,
			resource_id: None,
			action: None,
			reason: None,
			details: serde_json::Value::Null,
			request_id: None,
		}
	}

	/// Set the severity level. Defaults to the event type's default severity.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
		self.outcome = Some(outcome);
		self
	}

	pub fn actor(mut self, actor_id: ActorId) -> Self {
		self.actor_id = Some(actor_id);
		self
	}

	pub fn role(mut self, role: impl Into<String>) -> Self {
		self.role = Some(role.into());
		self
	}

	/// Set the resource type, without an instance id.
	pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
		self.resource_type = Some(resource_type.into());
		self
	}

	/// Set the resource type and instance id affected by this event.
	pub fn resource(
		mut self,
		resource_type: impl Into<String>,
		resource_id: impl Into<String>,
	) -> Self {
		self.resource_type = Some(resource_type.into());
		self.resource_id = Some(resource_id.into());
		self
	}

	pub fn resource_id(mut self, resource_id: Option<String>) -> Self {
		self.resource_id = resource_id;
		self
	}

	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	/// Set additional event-specific details.
	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	/// Set the application-level request ID.
	pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
		self.request_id = Some(request_id.into());
		self
	}

	/// Build the audit log entry.
	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			category: self.event_type.category(),
			severity: self
				.severity
				.unwrap_or_else(|| self.event_type.default_severity()),
			outcome: self.outcome.unwrap_or_default(),
			actor_id: self.actor_id,
			role: self.role,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			action: self.action.unwrap_or_else(|| self.event_type.to_string()),
			reason: self.reason,
			details: self.details,
			request_id: self.request_id,
		}
	}
}
