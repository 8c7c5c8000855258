// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit wiring for a short-lived process.
//!
//! The queued `AuditService` publishes from a background task, which a CLI
//! would exit before draining. Here every sink is awaited in turn instead.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use solace_authz_audit::{
	AuditConfig, AuditFilterConfig, AuditLogEntry, AuditSeverity, AuditSink, AuditSinkError,
	NoopAuditSink, SqliteAuditSink, TracingAuditSink,
};
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Publishes each event to every sink whose filter allows it.
pub struct FanoutAuditSink {
	sinks: Vec<Arc<dyn AuditSink>>,
	filter: AuditFilterConfig,
}

impl FanoutAuditSink {
	pub fn new(filter: AuditFilterConfig, sinks: Vec<Arc<dyn AuditSink>>) -> Self {
		Self { sinks, filter }
	}

	pub fn sink_count(&self) -> usize {
		self.sinks.len()
	}
}

#[async_trait]
impl AuditSink for FanoutAuditSink {
	fn name(&self) -> &str {
		"fanout"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		for sink in &self.sinks {
			if !sink.filter().allows(&event) {
				continue;
			}
			if let Err(e) = sink.publish(Arc::clone(&event)).await {
				warn!(sink = sink.name(), error = %e, "audit sink publish failed");
			}
		}
		Ok(())
	}
}

/// Builds the configured audit sink. The SQLite sink is only attached when a
/// pool is supplied, so dry runs never write to the database.
pub fn build_sink(config: &AuditConfig, pool: Option<&SqlitePool>) -> anyhow::Result<Arc<dyn AuditSink>> {
	if !config.enabled {
		return Ok(Arc::new(NoopAuditSink::default()));
	}

	let min_severity: AuditSeverity = config
		.min_severity
		.parse()
		.map_err(|e: String| anyhow::anyhow!(e))
		.context("invalid audit.min_severity")?;
	let filter = AuditFilterConfig::with_min_severity(min_severity);

	let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();
	if config.tracing_sink {
		sinks.push(Arc::new(TracingAuditSink::new(filter.clone())));
	}
	if let (true, Some(pool)) = (config.sqlite_sink, pool) {
		sinks.push(Arc::new(SqliteAuditSink::new(pool.clone(), filter.clone())));
	}

	let fanout = FanoutAuditSink::new(filter, sinks);
	debug!(sinks = fanout.sink_count(), "audit sinks configured");
	Ok(Arc::new(fanout))
}
