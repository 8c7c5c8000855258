// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::event::{AuditCategory, AuditEventType, AuditLogEntry, AuditSeverity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFilterConfig {
	pub min_severity: AuditSeverity,
	pub include_events: Option<Vec<AuditEventType>>,
	pub exclude_events: Option<Vec<AuditEventType>>,
	pub include_categories: Option<Vec<AuditCategory>>,
}

impl Default for AuditFilterConfig {
	fn default() -> Self {
		Self {
			min_severity: AuditSeverity::Info,
			include_events: None,
			exclude_events: None,
			include_categories: None,
		}
	}
}

impl AuditFilterConfig {
	/// A filter that lets every event through.
	pub fn allow_all() -> Self {
		Self {
			min_severity: AuditSeverity::Debug,
			..Default::default()
		}
	}

	pub fn with_min_severity(min_severity: AuditSeverity) -> Self {
		Self {
			min_severity,
			..Default::default()
		}
	}

	/// Mandatory events always pass; the rules below only route optional ones.
	pub fn allows(&self, entry: &AuditLogEntry) -> bool {
		if entry.event_type.is_mandatory() {
			return true;
		}

		if entry.severity < self.min_severity {
			return false;
		}

		if let Some(ref exclude) = self.exclude_events {
			if exclude.contains(&entry.event_type) {
				return false;
			}
		}

		if let Some(ref include) = self.include_events {
			if !include.contains(&entry.event_type) {
				return false;
			}
		}

		if let Some(ref categories) = self.include_categories {
			if !categories.contains(&entry.category) {
				return false;
			}
		}

		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn make_entry(event_type: AuditEventType, severity: AuditSeverity) -> AuditLogEntry {
		AuditLogEntry::builder(event_type).severity(severity).build()
	}

	#[test]
	fn test_default_config_allows_info_and_above() {
		let config = AuditFilterConfig::default();

		assert!(config.allows(&make_entry(
			AuditEventType::RoleAssignmentValidated,
			AuditSeverity::Info
		)));
		assert!(config.allows(&make_entry(
			AuditEventType::RoleAssignmentRejected,
			AuditSeverity::Warning
		)));
		assert!(!config.allows(&make_entry(
			AuditEventType::RoleAssignmentValidated,
			AuditSeverity::Debug
		)));
	}

	#[test]
	fn test_mandatory_events_ignore_every_rule() {
		let config = AuditFilterConfig {
			min_severity: AuditSeverity::Critical,
			include_events: Some(vec![AuditEventType::RoleAssignmentRejected]),
			exclude_events: Some(vec![
				AuditEventType::PrivilegedAccess,
				AuditEventType::TemporaryGrantCreated,
			]),
			include_categories: Some(vec![AuditCategory::RoleChange]),
		};

		for event in [
			AuditEventType::PrivilegedAccess,
			AuditEventType::AccessGranted,
			AuditEventType::AccountLocked,
			AuditEventType::TemporaryGrantCreated,
			AuditEventType::SystemError,
		] {
			assert!(config.allows(&make_entry(event, AuditSeverity::Debug)), "{event} dropped");
		}
		assert!(!config.allows(&AuditLogEntry::builder(AuditEventType::RoleAssignmentValidated).build()));
	}

	#[test]
	fn test_exclude_wins_over_include() {
		let config = AuditFilterConfig {
			include_events: Some(vec![AuditEventType::RoleAssignmentRejected]),
			exclude_events: Some(vec![AuditEventType::RoleAssignmentRejected]),
			..Default::default()
		};
		assert!(!config.allows(&AuditLogEntry::builder(AuditEventType::RoleAssignmentRejected).build()));
	}

	#[test]
	fn test_include_events_restricts() {
		let config = AuditFilterConfig {
			include_events: Some(vec![AuditEventType::RoleAssignmentRejected]),
			..Default::default()
		};
		assert!(config.allows(&AuditLogEntry::builder(AuditEventType::RoleAssignmentRejected).build()));
		assert!(!config.allows(&AuditLogEntry::builder(AuditEventType::RoleAssignmentValidated).build()));
	}

	#[test]
	fn test_include_categories_restricts() {
		let config = AuditFilterConfig {
			include_categories: Some(vec![AuditCategory::System]),
			..Default::default()
		};
		assert!(!config.allows(&AuditLogEntry::builder(
			AuditEventType::ClinicalCredentialVerificationRequired
		)
		.build()));
	}
}
