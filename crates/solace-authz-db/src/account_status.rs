// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::Utc;
use solace_authz::{AccountStatus, AccountStatusProvider, CollaboratorError};
use solace_authz_core::ActorId;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::Result;
use crate::temporary_grant::{parse_timestamp, timestamp};

/// Account status read from the `account_status` table.
///
/// The identity service owns the rows; [`upsert`](Self::upsert) exists for
/// provisioning and tests.
#[derive(Clone)]
pub struct SqliteAccountStatusProvider {
	pool: SqlitePool,
}

impl SqliteAccountStatusProvider {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self))]
	pub async fn find(&self, actor_id: ActorId) -> Result<Option<AccountStatus>> {
		let row = sqlx::query("SELECT is_active, locked_until FROM account_status WHERE actor_id = ?")
			.bind(actor_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		let Some(row) = row else {
			return Ok(None);
		};
		let is_active: bool = row.get("is_active");
		let locked_until: Option<String> = row.get("locked_until");
		Ok(Some(AccountStatus {
			is_active,
			locked_until: locked_until
				.as_deref()
				.map(|v| parse_timestamp("locked_until", v))
				.transpose()?,
		}))
	}

	#[tracing::instrument(skip(self, status), fields(is_active = status.is_active))]
	pub async fn upsert(&self, actor_id: ActorId, status: &AccountStatus) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO account_status (actor_id, is_active, locked_until, updated_at)
			VALUES (?, ?, ?, ?)
			ON CONFLICT(actor_id) DO UPDATE SET
				is_active = excluded.is_active,
				locked_until = excluded.locked_until,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(actor_id.to_string())
		.bind(status.is_active)
		.bind(status.locked_until.map(timestamp))
		.bind(timestamp(Utc::now()))
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete(&self, actor_id: ActorId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM account_status WHERE actor_id = ?")
			.bind(actor_id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
impl AccountStatusProvider for SqliteAccountStatusProvider {
	async fn get_status(
		&self,
		actor_id: ActorId,
	) -> std::result::Result<Option<AccountStatus>, CollaboratorError> {
		Ok(self.find(actor_id).await?)
	}
}
