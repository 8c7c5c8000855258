// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit trail for authorization decisions.
//!
//! The engine publishes [`AuditLogEntry`] values to an [`AuditSink`]. The
//! [`AuditService`] is itself a sink that queues events and fans them out to
//! the configured sinks in the background.

pub mod error;
pub mod event;
pub mod filter;
pub mod pipeline;
pub mod sink;

pub use error::{AuditError, AuditResult, AuditSinkError};
pub use event::{
	AuditCategory, AuditEventType, AuditLogBuilder, AuditLogEntry, AuditOutcome, AuditSeverity,
};
pub use filter::AuditFilterConfig;
pub use pipeline::AuditService;
pub use sink::memory::MemoryAuditSink;
pub use sink::{AuditSink, NoopAuditSink};

pub use solace_authz_config::{AuditConfig, QueueOverflowPolicy};

#[cfg(feature = "sink-sqlite")]
pub use sink::sqlite::{SqliteAuditSink, AUDIT_LOGS_SCHEMA};

#[cfg(feature = "sink-tracing")]
pub use sink::tracing::TracingAuditSink;
