// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use super::{AuditSink, AuditSinkError};
use crate::event::{AuditLogEntry, AuditSeverity};
use crate::filter::AuditFilterConfig;

/// Emits audit events as structured `tracing` records under the `solace_audit` target.
pub struct TracingAuditSink {
	filter: AuditFilterConfig,
}

impl TracingAuditSink {
	pub fn new(filter: AuditFilterConfig) -> Self {
		Self { filter }
	}
}

pub fn severity_to_level(severity: AuditSeverity) -> Level {
	match severity {
		AuditSeverity::Debug => Level::DEBUG,
		AuditSeverity::Info | AuditSeverity::Notice => Level::INFO,
		AuditSeverity::Warning => Level::WARN,
		AuditSeverity::Error | AuditSeverity::Critical => Level::ERROR,
	}
}

macro_rules! emit {
	($macro:ident, $entry:expr, $details:expr) => {
		tracing::$macro!(
			target: "solace_audit",
			id = %$entry.id,
			timestamp = %$entry.timestamp.to_rfc3339(),
			event_type = %$entry.event_type,
			category = %$entry.category,
			severity = %$entry.severity,
			outcome = %$entry.outcome,
			actor_id = $entry.actor_id.map(|a| a.to_string()),
			role = $entry.role.as_deref(),
			resource_type = $entry.resource_type.as_deref(),
			resource_id = $entry.resource_id.as_deref(),
			action = %$entry.action,
			reason = $entry.reason.as_deref(),
			request_id = $entry.request_id.as_deref(),
			details = $details,
			"audit event"
		)
	};
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let details = if event.details.is_null() {
			None
		} else {
			Some(event.details.to_string())
		};

		match severity_to_level(event.severity) {
			Level::TRACE => emit!(trace, event, details),
			Level::DEBUG => emit!(debug, event, details),
			Level::INFO => emit!(info, event, details),
			Level::WARN => emit!(warn, event, details),
			Level::ERROR => emit!(error, event, details),
		}

		Ok(())
	}
}
