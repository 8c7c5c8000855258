// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use solace_authz::CollaboratorError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Migration {version} failed: {source}")]
	Migration {
		version: i64,
		#[source]
		source: sqlx::Error,
	},

	#[error("Corrupt row: {0}")]
	Corrupt(String),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for CollaboratorError {
	fn from(err: DbError) -> Self {
		CollaboratorError::storage(err)
	}
}
