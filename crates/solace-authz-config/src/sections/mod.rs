// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod audit;
mod cache;
mod collaborators;
mod database;
mod logging;
mod roles;
mod temporary_grants;

pub use audit::{AuditConfig, AuditConfigLayer, QueueOverflowPolicy, SEVERITY_NAMES};
pub use cache::{CacheConfig, CacheConfigLayer, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS};
pub use collaborators::{
	CollaboratorsConfig, CollaboratorsConfigLayer, DEFAULT_COLLABORATOR_TIMEOUT_MS,
};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use roles::{RolesConfig, RolesConfigLayer};
pub use temporary_grants::{
	TemporaryGrantsConfig, TemporaryGrantsConfigLayer, DEFAULT_MAX_DURATION_SECS,
};
