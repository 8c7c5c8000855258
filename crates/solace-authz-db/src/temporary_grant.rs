// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use solace_authz::{CollaboratorError, TemporaryGrant, TemporaryGrantStore};
use solace_authz_core::{ActorId, TemporaryGrantId};
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row,
};

use crate::error::{DbError, Result};

const COLUMNS: &str = "id, beneficiary_id, granted_by, resource, action, reason, \
	created_at, expires_at, revoked_at, revoked_by";

/// Fixed-width UTC timestamps so that string comparison in SQL orders them.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
	at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Corrupt(format!("{column}: {e}")))
}

fn parse<T>(column: &str, value: &str) -> Result<T>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	value
		.parse()
		.map_err(|e| DbError::Corrupt(format!("{column}: {e}")))
}

fn row_to_grant(row: &SqliteRow) -> Result<TemporaryGrant> {
	let id: String = row.get("id");
	let beneficiary_id: String = row.get("beneficiary_id");
	let granted_by: String = row.get("granted_by");
	let resource: String = row.get("resource");
	let action: String = row.get("action");
	let created_at: String = row.get("created_at");
	let expires_at: String = row.get("expires_at");
	let revoked_at: Option<String> = row.get("revoked_at");
	let revoked_by: Option<String> = row.get("revoked_by");

	Ok(TemporaryGrant {
		id: parse("id", &id)?,
		beneficiary_id: parse("beneficiary_id", &beneficiary_id)?,
		granted_by: parse("granted_by", &granted_by)?,
		resource: parse("resource", &resource)?,
		action: parse("action", &action)?,
		reason: row.get("reason"),
		created_at: parse_timestamp("created_at", &created_at)?,
		expires_at: parse_timestamp("expires_at", &expires_at)?,
		revoked_at: revoked_at
			.as_deref()
			.map(|v| parse_timestamp("revoked_at", v))
			.transpose()?,
		revoked_by: revoked_by
			.as_deref()
			.map(|v| parse("revoked_by", v))
			.transpose()?,
	})
}

/// Temporary grants persisted in the `temporary_grants` table.
#[derive(Clone)]
pub struct SqliteTemporaryGrantStore {
	pool: SqlitePool,
}

impl SqliteTemporaryGrantStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, grant), fields(grant_id = %grant.id))]
	pub async fn insert(&self, grant: &TemporaryGrant) -> Result<()> {
		sqlx::query(&format!(
			"INSERT INTO temporary_grants ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
		))
		.bind(grant.id.to_string())
		.bind(grant.beneficiary_id.to_string())
		.bind(grant.granted_by.to_string())
		.bind(grant.resource.as_str())
		.bind(grant.action.as_str())
		.bind(&grant.reason)
		.bind(timestamp(grant.created_at))
		.bind(timestamp(grant.expires_at))
		.bind(grant.revoked_at.map(timestamp))
		.bind(grant.revoked_by.map(|a| a.to_string()))
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn find(&self, id: TemporaryGrantId) -> Result<Option<TemporaryGrant>> {
		let row = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM temporary_grants WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;
		row.as_ref().map(row_to_grant).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn for_actor(&self, actor_id: ActorId) -> Result<Vec<TemporaryGrant>> {
		let rows = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM temporary_grants WHERE beneficiary_id = ? ORDER BY created_at ASC"
		))
		.bind(actor_id.to_string())
		.fetch_all(&self.pool)
		.await?;
		rows.iter().map(row_to_grant).collect()
	}

	#[tracing::instrument(skip(self))]
	pub async fn active_for_actor(
		&self,
		actor_id: ActorId,
		now: DateTime<Utc>,
	) -> Result<Vec<TemporaryGrant>> {
		let rows = sqlx::query(&format!(
			"SELECT {COLUMNS} FROM temporary_grants \
			 WHERE beneficiary_id = ? AND revoked_at IS NULL AND expires_at > ? \
			 ORDER BY created_at ASC"
		))
		.bind(actor_id.to_string())
		.bind(timestamp(now))
		.fetch_all(&self.pool)
		.await?;
		rows.iter().map(row_to_grant).collect()
	}

	/// Marks the grant revoked unless it already is. The conditional update
	/// makes concurrent revocations race-free.
	#[tracing::instrument(skip(self))]
	pub async fn mark_revoked(
		&self,
		id: TemporaryGrantId,
		revoked_by: ActorId,
		revoked_at: DateTime<Utc>,
	) -> Result<bool> {
		let result = sqlx::query(
			"UPDATE temporary_grants SET revoked_at = ?, revoked_by = ? \
			 WHERE id = ? AND revoked_at IS NULL",
		)
		.bind(timestamp(revoked_at))
		.bind(revoked_by.to_string())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;
		Ok(result.rows_affected() == 1)
	}

	/// Deletes grants that expired or were revoked before `cutoff`.
	#[tracing::instrument(skip(self))]
	pub async fn purge_inactive_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
		let cutoff = timestamp(cutoff);
		let result = sqlx::query(
			"DELETE FROM temporary_grants WHERE expires_at < ? OR revoked_at < ?",
		)
		.bind(&cutoff)
		.bind(&cutoff)
		.execute(&self.pool)
		.await?;
		tracing::debug!(removed = result.rows_affected(), "purged inactive temporary grants");
		Ok(result.rows_affected())
	}
}

#[async_trait]
impl TemporaryGrantStore for SqliteTemporaryGrantStore {
	async fn create_grant(&self, grant: &TemporaryGrant) -> std::result::Result<(), CollaboratorError> {
		Ok(self.insert(grant).await?)
	}

	async fn get_grant(
		&self,
		id: TemporaryGrantId,
	) -> std::result::Result<Option<TemporaryGrant>, CollaboratorError> {
		Ok(self.find(id).await?)
	}

	async fn list_grants_for_actor(
		&self,
		actor_id: ActorId,
	) -> std::result::Result<Vec<TemporaryGrant>, CollaboratorError> {
		Ok(self.for_actor(actor_id).await?)
	}

	async fn list_active_grants(
		&self,
		actor_id: ActorId,
		now: DateTime<Utc>,
	) -> std::result::Result<Vec<TemporaryGrant>, CollaboratorError> {
		Ok(self.active_for_actor(actor_id, now).await?)
	}

	async fn revoke_grant(
		&self,
		id: TemporaryGrantId,
		revoked_by: ActorId,
		revoked_at: DateTime<Utc>,
	) -> std::result::Result<bool, CollaboratorError> {
		Ok(self.mark_revoked(id, revoked_by, revoked_at).await?)
	}
}
