// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for the temporary grant lifecycle.

mod common;

use chrono::{Duration, Utc};
use common::Harness;
use solace_authz::{AccountStatus, AuthzError};
use solace_authz_audit::{AuditCategory, AuditEventType, AuditSeverity};
use solace_authz_core::{roles, Action, ActorId, Grant, Resource, TemporaryGrantId};

fn in_hours(hours: i64) -> chrono::DateTime<Utc> {
	Utc::now() + Duration::hours(hours)
}

// ============================================================================
// Granting
// ============================================================================

#[tokio::test]
async fn test_grant_allows_beneficiary_and_is_audited() {
	let h = Harness::new();
	let supervisor = h.actor(roles::CLINICAL_SUPERVISOR);
	let staff = h.actor(roles::SUPPORT_STAFF);

	let id = h
		.service
		.grant_temporary(
			&supervisor,
			staff.actor_id,
			Resource::Report,
			Action::Read,
			in_hours(4),
			"quarterly review cover",
		)
		.await
		.unwrap();

	let verdict = h
		.service
		.check_permission(&staff, Resource::Report, Action::Read, false)
		.await;
	assert!(verdict.allowed);

	let created = h.audit.events_of(AuditEventType::TemporaryGrantCreated);
	assert_eq!(created.len(), 1);
	assert_eq!(created[0].category, AuditCategory::PermissionChange);
	assert_eq!(created[0].severity, AuditSeverity::Error);
	assert_eq!(created[0].actor_id, Some(supervisor.actor_id));
	assert_eq!(created[0].resource_id.as_deref(), Some(id.to_string().as_str()));
	assert_eq!(created[0].reason.as_deref(), Some("quarterly review cover"));

	let active = h.service.list_active_temporary(staff.actor_id).await.unwrap();
	assert_eq!(active, vec![Grant::new(Resource::Report, Action::Read)]);
}

#[tokio::test]
async fn test_grant_invalidates_cached_denial() {
	let h = Harness::new();
	let admin = h.actor(roles::ADMIN);
	let staff = h.actor(roles::SUPPORT_STAFF);

	let before = h
		.service
		.check_permission(&staff, Resource::Report, Action::Read, false)
		.await;
	assert!(!before.allowed);

	h.service
		.grant_temporary(
			&admin,
			staff.actor_id,
			Resource::Report,
			Action::Read,
			in_hours(1),
			"incident follow-up",
		)
		.await
		.unwrap();

	let after = h
		.service
		.check_permission(&staff, Resource::Report, Action::Read, false)
		.await;
	assert!(after.allowed);
	assert_eq!(after.reason, "granted by temporary grant");
}

#[tokio::test]
async fn test_grantor_needs_create_permission() {
	let h = Harness::new();
	let therapist = h.actor(roles::THERAPIST);
	let user = h.actor(roles::USER);

	let err = h
		.service
		.grant_temporary(
			&therapist,
			user.actor_id,
			Resource::Appointment,
			Action::Read,
			in_hours(1),
			"cover",
		)
		.await
		.unwrap_err();

	assert!(matches!(
		err,
		AuthzError::InsufficientPermissions {
			resource: Resource::TemporaryGrant,
			action: Action::Create,
		}
	));
	assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn test_grantor_cannot_delegate_what_they_lack() {
	let h = Harness::new();
	let supervisor = h.actor(roles::CLINICAL_SUPERVISOR);
	let staff = h.actor(roles::SUPPORT_STAFF);

	let err = h
		.service
		.grant_temporary(
			&supervisor,
			staff.actor_id,
			Resource::SystemConfig,
			Action::Configure,
			in_hours(1),
			"escalation",
		)
		.await
		.unwrap_err();

	assert!(matches!(err, AuthzError::Forbidden(_)));
	assert!(h.grants.inner.is_empty());
}

#[tokio::test]
async fn test_conditional_grants_cannot_be_delegated() {
	let h = Harness::new();
	let supervisor = h.actor(roles::CLINICAL_SUPERVISOR);
	let staff = h.actor(roles::SUPPORT_STAFF);

	// Supervisors hold mood_entry:read only for their care team.
	let err = h
		.service
		.grant_temporary(
			&supervisor,
			staff.actor_id,
			Resource::MoodEntry,
			Action::Read,
			in_hours(1),
			"handover",
		)
		.await
		.unwrap_err();

	assert!(matches!(err, AuthzError::Forbidden(_)));
}

#[tokio::test]
async fn test_super_role_may_delegate_anything() {
	let h = Harness::new();
	let root = h.actor(roles::SUPER_ADMIN);
	let staff = h.actor(roles::SUPPORT_STAFF);

	h.service
		.grant_temporary(
			&root,
			staff.actor_id,
			Resource::SystemConfig,
			Action::Configure,
			in_hours(1),
			"maintenance window",
		)
		.await
		.unwrap();

	assert!(
		h.service
			.check_permission(&staff, Resource::SystemConfig, Action::Configure, false)
			.await
			.allowed
	);
}

#[tokio::test]
async fn test_locked_grantor_is_refused() {
	let h = Harness::new();
	let admin = h.actor(roles::ADMIN);
	h.set_status(admin.actor_id, AccountStatus::locked_until(in_hours(1)));

	let err = h
		.service
		.grant_temporary(
			&admin,
			ActorId::generate(),
			Resource::Report,
			Action::Read,
			in_hours(1),
			"cover",
		)
		.await
		.unwrap_err();

	assert!(matches!(err, AuthzError::InsufficientPermissions { .. }));
}

#[tokio::test]
async fn test_expiry_and_reason_validation() {
	let h = Harness::new();
	let admin = h.actor(roles::ADMIN);
	let beneficiary = ActorId::generate();

	let past = h
		.service
		.grant_temporary(
			&admin,
			beneficiary,
			Resource::Report,
			Action::Read,
			Utc::now() - Duration::minutes(1),
			"cover",
		)
		.await;
	assert!(matches!(past, Err(AuthzError::InvalidExpiry(_))));

	let too_far = h
		.service
		.grant_temporary(
			&admin,
			beneficiary,
			Resource::Report,
			Action::Read,
			Utc::now() + Duration::days(31),
			"cover",
		)
		.await;
	assert!(matches!(too_far, Err(AuthzError::InvalidExpiry(_))));

	let blank = h
		.service
		.grant_temporary(
			&admin,
			beneficiary,
			Resource::Report,
			Action::Read,
			in_hours(1),
			"   ",
		)
		.await;
	assert!(matches!(blank, Err(AuthzError::MissingReason)));

	assert!(h.grants.inner.is_empty());
	assert!(h
		.audit
		.events_of(AuditEventType::TemporaryGrantCreated)
		.is_empty());
}

// ============================================================================
// Revocation
// ============================================================================

#[tokio::test]
async fn test_revoke_is_observed_by_next_check_despite_cache() {
	let h = Harness::new();
	let admin = h.actor(roles::ADMIN);
	let staff = h.actor(roles::SUPPORT_STAFF);

	let id = h
		.service
		.grant_temporary(
			&admin,
			staff.actor_id,
			Resource::Report,
			Action::Read,
			in_hours(2),
			"audit support",
		)
		.await
		.unwrap();

	// Warm the cache with the allowed verdict.
	for _ in 0..2 {
		assert!(
			h.service
				.check_permission(&staff, Resource::Report, Action::Read, false)
				.await
				.allowed
		);
	}

	h.service.revoke_temporary(&admin, id).await.unwrap();

	let verdict = h
		.service
		.check_permission(&staff, Resource::Report, Action::Read, false)
		.await;
	assert!(!verdict.allowed);
	assert!(!verdict.reason.ends_with("(cached)"));

	let revoked = h.audit.events_of(AuditEventType::TemporaryGrantRevoked);
	assert_eq!(revoked.len(), 1);
	assert_eq!(revoked[0].severity, AuditSeverity::Error);
	assert!(h
		.service
		.list_active_temporary(staff.actor_id)
		.await
		.unwrap()
		.is_empty());

	let records = h.service.list_temporary(staff.actor_id).await.unwrap();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].revoked_by, Some(admin.actor_id));
}

#[tokio::test]
async fn test_original_grantor_may_revoke_without_delete_permission() {
	let h = Harness::new();
	let supervisor = h.actor(roles::CLINICAL_SUPERVISOR);
	let staff = h.actor(roles::SUPPORT_STAFF);

	let id = h
		.service
		.grant_temporary(
			&supervisor,
			staff.actor_id,
			Resource::Report,
			Action::Read,
			in_hours(1),
			"cover",
		)
		.await
		.unwrap();

	h.service.revoke_temporary(&supervisor, id).await.unwrap();
}

#[tokio::test]
async fn test_other_actor_needs_delete_permission_to_revoke() {
	let h = Harness::new();
	let supervisor = h.actor(roles::CLINICAL_SUPERVISOR);
	let other_supervisor = h.actor(roles::CLINICAL_SUPERVISOR);
	let admin = h.actor(roles::ADMIN);
	let staff = h.actor(roles::SUPPORT_STAFF);

	let id = h
		.service
		.grant_temporary(
			&supervisor,
			staff.actor_id,
			Resource::Report,
			Action::Read,
			in_hours(1),
			"cover",
		)
		.await
		.unwrap();

	let err = h
		.service
		.revoke_temporary(&other_supervisor, id)
		.await
		.unwrap_err();
	assert!(matches!(
		err,
		AuthzError::InsufficientPermissions {
			resource: Resource::TemporaryGrant,
			action: Action::Delete,
		}
	));

	h.service.revoke_temporary(&admin, id).await.unwrap();
}

#[tokio::test]
async fn test_revoke_errors() {
	let h = Harness::new();
	let admin = h.actor(roles::ADMIN);

	let missing = TemporaryGrantId::generate();
	let err = h.service.revoke_temporary(&admin, missing).await.unwrap_err();
	assert!(matches!(err, AuthzError::NotFound(id) if id == missing));
	assert_eq!(err.status_code(), 404);

	let id = h
		.service
		.grant_temporary(
			&admin,
			ActorId::generate(),
			Resource::Report,
			Action::Read,
			in_hours(1),
			"cover",
		)
		.await
		.unwrap();
	h.service.revoke_temporary(&admin, id).await.unwrap();

	let err = h.service.revoke_temporary(&admin, id).await.unwrap_err();
	assert!(matches!(err, AuthzError::AlreadyRevoked(_)));
	assert_eq!(h.audit.events_of(AuditEventType::TemporaryGrantRevoked).len(), 1);
}
