// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource and action tags.
//!
//! Both sets are closed: adding a protected entity class or an operation class
//! means adding a variant here. Parsing an unknown tag fails, which callers at
//! the service boundary turn into a denial.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TagParseError;

/// Protected entity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
	TherapyNote,
	MoodEntry,
	JournalEntry,
	Appointment,
	Assessment,
	TreatmentPlan,
	Medication,
	Message,
	CrisisAlert,
	UserProfile,
	RoleAssignment,
	TemporaryGrant,
	Report,
	AuditLog,
	SystemConfig,
}

impl Resource {
	/// Returns every resource tag.
	pub fn all() -> &'static [Resource] {
		&[
			Resource::TherapyNote,
			Resource::MoodEntry,
			Resource::JournalEntry,
			Resource::Appointment,
			Resource::Assessment,
			Resource::TreatmentPlan,
			Resource::Medication,
			Resource::Message,
			Resource::CrisisAlert,
			Resource::UserProfile,
			Resource::RoleAssignment,
			Resource::TemporaryGrant,
			Resource::Report,
			Resource::AuditLog,
			Resource::SystemConfig,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Resource::TherapyNote => "therapy_note",
			Resource::MoodEntry => "mood_entry",
			Resource::JournalEntry => "journal_entry",
			Resource::Appointment => "appointment",
			Resource::Assessment => "assessment",
			Resource::TreatmentPlan => "treatment_plan",
			Resource::Medication => "medication",
			Resource::Message => "message",
			Resource::CrisisAlert => "crisis_alert",
			Resource::UserProfile => "user_profile",
			Resource::RoleAssignment => "role_assignment",
			Resource::TemporaryGrant => "temporary_grant",
			Resource::Report => "report",
			Resource::AuditLog => "audit_log",
			Resource::SystemConfig => "system_config",
		}
	}
}

impl fmt::Display for Resource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Resource {
	type Err = TagParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Resource::all()
			.iter()
			.copied()
			.find(|r| r.as_str() == s)
			.ok_or_else(|| TagParseError::UnknownResource(s.to_string()))
	}
}

/// Operation classes, orthogonal to [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	Create,
	Read,
	Update,
	Delete,
	List,
	Search,
	Export,
	Approve,
	Assign,
	Execute,
	Override,
	Configure,
	Audit,
}

impl Action {
	/// Returns every action tag.
	pub fn all() -> &'static [Action] {
		&[
			Action::Create,
			Action::Read,
			Action::Update,
			Action::Delete,
			Action::List,
			Action::Search,
			Action::Export,
			Action::Approve,
			Action::Assign,
			Action::Execute,
			Action::Override,
			Action::Configure,
			Action::Audit,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Create => "create",
			Action::Read => "read",
			Action::Update => "update",
			Action::Delete => "delete",
			Action::List => "list",
			Action::Search => "search",
			Action::Export => "export",
			Action::Approve => "approve",
			Action::Assign => "assign",
			Action::Execute => "execute",
			Action::Override => "override",
			Action::Configure => "configure",
			Action::Audit => "audit",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Action {
	type Err = TagParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Action::all()
			.iter()
			.copied()
			.find(|a| a.as_str() == s)
			.ok_or_else(|| TagParseError::UnknownAction(s.to_string()))
	}
}
