// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Built-in permission catalog for the Solace platform.
//!
//! ```text
//! super_admin (100)
//!   └── admin (90) ── support_staff (40) ── user (10) ── guest (0)
//!          └── compliance_officer (80) ── user
//! clinical_supervisor (70) ── therapist (60) ── user
//! psychiatrist (65) ── therapist
//! crisis_counselor (55) ── user
//! peer_supporter (30) ── user
//! ```
//!
//! Clients own their mood entries, journal entries, appointments and
//! assessments; clinical staff reach client data through the
//! `care_team_member` and `active_crisis` predicates.

use crate::catalog::Catalog;
use crate::grant::Grant;
use crate::resource::{Action, Resource};
use crate::role::Role;

/// Role names of the built-in catalog.
pub mod roles {
	pub const SUPER_ADMIN: &str = "super_admin";
	pub const ADMIN: &str = "admin";
	pub const COMPLIANCE_OFFICER: &str = "compliance_officer";
	pub const CLINICAL_SUPERVISOR: &str = "clinical_supervisor";
	pub const PSYCHIATRIST: &str = "psychiatrist";
	pub const THERAPIST: &str = "therapist";
	pub const CRISIS_COUNSELOR: &str = "crisis_counselor";
	pub const SUPPORT_STAFF: &str = "support_staff";
	pub const PEER_SUPPORTER: &str = "peer_supporter";
	pub const USER: &str = "user";
	pub const GUEST: &str = "guest";
}

/// Predicate ids referenced by the built-in catalog.
pub mod predicates {
	/// The request carries an active crisis escalation for the client.
	pub const ACTIVE_CRISIS: &str = "active_crisis";
	/// The actor is on the client's care team.
	pub const CARE_TEAM_MEMBER: &str = "care_team_member";
}

use predicates::{ACTIVE_CRISIS, CARE_TEAM_MEMBER};
use Action::*;
use Resource::*;

fn unconditional(resource: Resource, actions: &[Action]) -> Vec<Grant> {
	actions.iter().map(|a| Grant::new(resource, *a)).collect()
}

fn owned(resource: Resource, actions: &[Action]) -> Vec<Grant> {
	actions.iter().map(|a| Grant::owned(resource, *a)).collect()
}

fn care_team(resource: Resource, actions: &[Action]) -> Vec<Grant> {
	actions
		.iter()
		.map(|a| Grant::when(resource, *a, CARE_TEAM_MEMBER))
		.collect()
}

/// Builds the built-in catalog.
pub fn default_catalog() -> Catalog {
	Catalog::builder()
		.role(
			Role::new(roles::GUEST, 0)
				.describe("Unauthenticated visitor completing signup")
				.grants(unconditional(UserProfile, &[Create])),
		)
		.role(
			Role::new(roles::USER, 10)
				.describe("Client of the platform")
				.inherit(roles::GUEST)
				.grants(unconditional(MoodEntry, &[Create]))
				.grants(owned(MoodEntry, &[Read, Update, Delete, List, Export]))
				.grants(unconditional(JournalEntry, &[Create]))
				.grants(owned(JournalEntry, &[Read, Update, Delete, List]))
				.grants(unconditional(Appointment, &[Create]))
				.grants(owned(Appointment, &[Read, Update, Delete]))
				.grants(unconditional(Assessment, &[Create]))
				.grants(owned(Assessment, &[Read]))
				.grants(owned(TreatmentPlan, &[Read]))
				.grants(owned(Medication, &[Read]))
				.grants(unconditional(Message, &[Create]))
				.grants(owned(Message, &[Read, Delete]))
				.grants(unconditional(CrisisAlert, &[Create]))
				.grants(owned(UserProfile, &[Read, Update, Delete])),
		)
		.role(
			Role::new(roles::PEER_SUPPORTER, 30)
				.describe("Trained peer offering non-clinical support")
				.inherit(roles::USER)
				.grants(care_team(Message, &[Read, List]))
				.grants(care_team(MoodEntry, &[Read]))
				.grants(unconditional(CrisisAlert, &[Read])),
		)
		.role(
			Role::new(roles::SUPPORT_STAFF, 40)
				.describe("Platform support and scheduling staff")
				.inherit(roles::USER)
				.grants(unconditional(UserProfile, &[Read, List, Search]))
				.grants(unconditional(Appointment, &[Read, Update, List, Search]))
				.grants(unconditional(Message, &[List])),
		)
		.role(
			Role::new(roles::CRISIS_COUNSELOR, 55)
				.describe("Responds to crisis alerts")
				.inherit(roles::USER)
				.grants(unconditional(CrisisAlert, &[Read, Update, List, Approve]))
				.grant(Grant::when(TherapyNote, Read, ACTIVE_CRISIS))
				.grant(Grant::when(MoodEntry, Read, ACTIVE_CRISIS))
				.grant(Grant::when(Assessment, Read, ACTIVE_CRISIS))
				.grant(Grant::when(UserProfile, Read, ACTIVE_CRISIS)),
		)
		.role(
			Role::new(roles::THERAPIST, 60)
				.describe("Licensed therapist")
				.inherit(roles::USER)
				.grants(unconditional(TherapyNote, &[Create]))
				.grants(care_team(TherapyNote, &[Read, Update, List]))
				.grants(care_team(MoodEntry, &[Read, List]))
				.grants(care_team(JournalEntry, &[Read]))
				.grants(care_team(Assessment, &[Read, Update]))
				.grants(unconditional(TreatmentPlan, &[Create]))
				.grants(care_team(TreatmentPlan, &[Read, Update]))
				.grants(care_team(UserProfile, &[Read]))
				.grants(unconditional(Appointment, &[Read, Update, List, Approve]))
				.grants(unconditional(CrisisAlert, &[Read, Update]))
				.grants(care_team(Message, &[Read]))
				.grants(unconditional(Report, &[Create])),
		)
		.role(
			Role::new(roles::PSYCHIATRIST, 65)
				.describe("Prescribing psychiatrist")
				.inherit(roles::THERAPIST)
				.grants(care_team(Medication, &[Create, Read, Update, Delete]))
				.grants(care_team(Assessment, &[Approve])),
		)
		.role(
			Role::new(roles::CLINICAL_SUPERVISOR, 70)
				.describe("Supervises clinical staff and reviews care quality")
				.inherit(roles::THERAPIST)
				.grants(unconditional(TherapyNote, &[Read, List, Approve]))
				.grants(unconditional(TreatmentPlan, &[Read, Approve]))
				.grants(unconditional(Assessment, &[Read, List]))
				.grants(unconditional(RoleAssignment, &[Read, List]))
				.grants(unconditional(TemporaryGrant, &[Create, Read, List]))
				.grants(unconditional(Report, &[Read, List, Export])),
		)
		.role(
			Role::new(roles::COMPLIANCE_OFFICER, 80)
				.describe("Reviews access and regulatory compliance")
				.inherit(roles::USER)
				.grants(unconditional(AuditLog, &[Read, List, Search, Export, Audit]))
				.grants(unconditional(Report, &[Read, List, Export]))
				.grants(unconditional(TherapyNote, &[Audit]))
				.grants(unconditional(RoleAssignment, &[Read, List]))
				.grants(unconditional(TemporaryGrant, &[Read, List])),
		)
		.role(
			Role::new(roles::ADMIN, 90)
				.describe("Platform administrator")
				.inherit(roles::SUPPORT_STAFF)
				.inherit(roles::COMPLIANCE_OFFICER)
				.grants(unconditional(
					RoleAssignment,
					&[Create, Read, Update, Delete, List, Assign],
				))
				.grants(unconditional(TemporaryGrant, &[Create, Read, List, Delete]))
				.grants(unconditional(UserProfile, &[Update, Delete]))
				.grants(unconditional(SystemConfig, &[Read, Update]))
				.grants(unconditional(Report, &[Create, Delete])),
		)
		.role(
			Role::new(roles::SUPER_ADMIN, 100)
				.describe("Unrestricted operator account")
				.inherit(roles::ADMIN)
				.grants(unconditional(SystemConfig, &[Configure, Override, Execute])),
		)
		.build()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_catalog_is_valid() {
		assert!(default_catalog().validate().is_empty());
	}

	#[test]
	fn default_catalog_contains_every_role() {
		let catalog = default_catalog();
		for name in [
			roles::SUPER_ADMIN,
			roles::ADMIN,
			roles::COMPLIANCE_OFFICER,
			roles::CLINICAL_SUPERVISOR,
			roles::PSYCHIATRIST,
			roles::THERAPIST,
			roles::CRISIS_COUNSELOR,
			roles::SUPPORT_STAFF,
			roles::PEER_SUPPORTER,
			roles::USER,
			roles::GUEST,
		] {
			assert!(catalog.contains(name), "missing role {name}");
		}
		assert_eq!(catalog.len(), 11);
	}

	#[test]
	fn super_admin_is_most_privileged() {
		let catalog = default_catalog();
		let top = catalog.roles_by_priority()[0];
		assert_eq!(top.name.as_str(), roles::SUPER_ADMIN);
	}

	#[test]
	fn user_reads_mood_entries_only_when_owner() {
		let catalog = default_catalog();
		let user = catalog.get(roles::USER).unwrap();
		assert!(user
			.grants
			.contains(&Grant::owned(Resource::MoodEntry, Action::Read)));
	}
}
