// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the Solace authorization engine.
//!
//! Provides [`SqliteTemporaryGrantStore`] and [`SqliteAccountStatusProvider`],
//! which plug into [`AuthorizationService`](solace_authz::AuthorizationService)
//! as collaborators, plus pool creation and schema migrations. Storage
//! failures surface to the engine as
//! [`CollaboratorError::Storage`](solace_authz::CollaboratorError).

pub mod account_status;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod temporary_grant;

pub use account_status::SqliteAccountStatusProvider;
pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::{create_memory_pool, create_pool};
pub use temporary_grant::SqliteTemporaryGrantStore;
