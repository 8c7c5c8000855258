// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded in-memory sink for tests and local inspection.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{AuditSink, AuditSinkError};
use crate::event::{AuditEventType, AuditLogEntry};
use crate::filter::AuditFilterConfig;

const DEFAULT_CAPACITY: usize = 10_000;

/// Keeps the most recent events in a ring buffer.
pub struct MemoryAuditSink {
	filter: AuditFilterConfig,
	capacity: usize,
	events: RwLock<VecDeque<Arc<AuditLogEntry>>>,
}

impl Default for MemoryAuditSink {
	fn default() -> Self {
		Self::new(AuditFilterConfig::allow_all())
	}
}

impl MemoryAuditSink {
	pub fn new(filter: AuditFilterConfig) -> Self {
		Self::with_capacity(filter, DEFAULT_CAPACITY)
	}

	pub fn with_capacity(filter: AuditFilterConfig, capacity: usize) -> Self {
		Self {
			filter,
			capacity: capacity.max(1),
			events: RwLock::new(VecDeque::new()),
		}
	}

	pub fn events(&self) -> Vec<Arc<AuditLogEntry>> {
		self.events.read().iter().cloned().collect()
	}

	pub fn events_of(&self, event_type: AuditEventType) -> Vec<Arc<AuditLogEntry>> {
		self
			.events
			.read()
			.iter()
			.filter(|e| e.event_type == event_type)
			.cloned()
			.collect()
	}

	pub fn len(&self) -> usize {
		self.events.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.read().is_empty()
	}

	pub fn clear(&self) {
		self.events.write().clear();
	}
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
	fn name(&self) -> &str {
		"memory"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		let mut events = self.events.write();
		if events.len() >= self.capacity {
			events.pop_front();
		}
		events.push_back(event);
		Ok(())
	}
}
