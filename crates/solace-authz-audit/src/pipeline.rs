// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use solace_authz_config::{AuditConfig, QueueOverflowPolicy};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::error::{AuditError, AuditSinkError};
use crate::event::{AuditLogEntry, AuditSeverity};
use crate::filter::AuditFilterConfig;
use crate::sink::AuditSink;

/// Queued fan-out of audit events to a set of sinks.
///
/// Events are accepted without waiting for sinks; a background task applies
/// the global filter and publishes each event to every sink whose own filter
/// allows it. Sink failures are logged and never reach the producer.
pub struct AuditService {
	tx: mpsc::Sender<Arc<AuditLogEntry>>,
	overflow_policy: QueueOverflowPolicy,
	filter: AuditFilterConfig,
	dropped: AtomicU64,
}

impl AuditService {
	pub fn new(
		global_filter: AuditFilterConfig,
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));

		tokio::spawn(Self::background_task(rx, global_filter, sinks));

		Self {
			tx,
			overflow_policy,
			filter: AuditFilterConfig::allow_all(),
			dropped: AtomicU64::new(0),
		}
	}

	/// Builds the service from resolved configuration.
	pub fn from_config(
		config: &AuditConfig,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Result<Self, AuditError> {
		let min_severity: AuditSeverity = config
			.min_severity
			.parse()
			.map_err(AuditError::ConfigError)?;

		Ok(Self::new(
			AuditFilterConfig::with_min_severity(min_severity),
			config.queue_capacity,
			config.queue_overflow_policy,
			sinks,
		))
	}

	async fn background_task(
		mut rx: mpsc::Receiver<Arc<AuditLogEntry>>,
		global_filter: AuditFilterConfig,
		sinks: Vec<Arc<dyn AuditSink>>,
	) {
		while let Some(event) = rx.recv().await {
			if !global_filter.allows(&event) {
				continue;
			}

			for sink in &sinks {
				if !sink.filter().allows(&event) {
					continue;
				}

				let sink = Arc::clone(sink);
				let event = Arc::clone(&event);

				tokio::spawn(async move {
					if let Err(e) = sink.publish(event).await {
						warn!(sink = sink.name(), error = %e, "audit sink publish failed");
					}
				});
			}
		}
		debug!("audit queue closed");
	}

	/// Log an audit event to the queue for processing.
	///
	/// Returns `true` if the event was successfully queued, `false` if dropped.
	///
	/// # Overflow Policy Behavior
	///
	/// - `Block`: Spawns an async task to send (non-blocking to caller, but event will be sent)
	/// - `DropNewest`: Uses try_send, drops new events when queue is full
	/// - `DropOldest`: Behaves like DropNewest; queued events cannot be evicted from the channel
	#[instrument(skip(self, entry), fields(event_type = %entry.event_type))]
	pub fn log(&self, entry: AuditLogEntry) -> bool {
		self.enqueue(Arc::new(entry))
	}

	pub async fn log_blocking(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
		self
			.tx
			.send(Arc::new(entry))
			.await
			.map_err(|_| AuditError::Shutdown)
	}

	/// Number of events dropped because the queue was full.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}

	fn enqueue(&self, event: Arc<AuditLogEntry>) -> bool {
		match self.overflow_policy {
			QueueOverflowPolicy::Block => {
				let tx = self.tx.clone();
				tokio::spawn(async move {
					let _ = tx.send(event).await;
				});
				true
			}
			QueueOverflowPolicy::DropNewest | QueueOverflowPolicy::DropOldest => {
				let queued = self.tx.try_send(event).is_ok();
				if !queued {
					self.dropped.fetch_add(1, Ordering::Relaxed);
				}
				queued
			}
		}
	}
}

#[async_trait]
impl AuditSink for AuditService {
	fn name(&self) -> &str {
		"queue"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
		if let QueueOverflowPolicy::Block = self.overflow_policy {
			return self
				.tx
				.send(event)
				.await
				.map_err(|_| AuditSinkError::Permanent(AuditError::Shutdown.to_string()));
		}

		if self.enqueue(event) {
			Ok(())
		} else {
			Err(AuditSinkError::Transient(AuditError::QueueFull.to_string()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditEventType;
	use crate::sink::memory::MemoryAuditSink;
	use tokio::time::{sleep, Duration};

	struct FailingSink {
		filter: AuditFilterConfig,
	}

	#[async_trait]
	impl AuditSink for FailingSink {
		fn name(&self) -> &str {
			"failing"
		}

		fn filter(&self) -> &AuditFilterConfig {
			&self.filter
		}

		async fn publish(&self, _event: Arc<AuditLogEntry>) -> Result<(), AuditSinkError> {
			Err(AuditSinkError::Transient("test error".to_string()))
		}
	}

	fn service(sinks: Vec<Arc<dyn AuditSink>>) -> AuditService {
		AuditService::new(
			AuditFilterConfig::default(),
			10000,
			QueueOverflowPolicy::DropNewest,
			sinks,
		)
	}

	#[tokio::test]
	async fn test_log_sends_to_sink() {
		let sink = Arc::new(MemoryAuditSink::default());
		let service = service(vec![sink.clone()]);

		assert!(service.log(AuditLogEntry::builder(AuditEventType::AccessDenied).build()));

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink.len(), 1);
	}

	#[tokio::test]
	async fn test_publish_through_sink_trait() {
		let sink = Arc::new(MemoryAuditSink::default());
		let service = service(vec![sink.clone()]);

		let entry = AuditLogEntry::builder(AuditEventType::PrivilegedAccess).build();
		service.publish(Arc::new(entry)).await.unwrap();

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink.events_of(AuditEventType::PrivilegedAccess).len(), 1);
	}

	#[tokio::test]
	async fn test_global_filter_blocks_events() {
		let sink = Arc::new(MemoryAuditSink::default());
		let service = AuditService::new(
			AuditFilterConfig::with_min_severity(AuditSeverity::Warning),
			10000,
			QueueOverflowPolicy::DropNewest,
			vec![sink.clone()],
		);

		service.log(AuditLogEntry::builder(AuditEventType::RoleAssignmentValidated).build());
		service.log(AuditLogEntry::builder(AuditEventType::RoleAssignmentRejected).build());

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink.len(), 1);
		assert_eq!(sink.events()[0].event_type, AuditEventType::RoleAssignmentRejected);
	}

	#[tokio::test]
	async fn test_filters_never_drop_mandatory_events() {
		let sink = Arc::new(MemoryAuditSink::new(
			AuditFilterConfig::with_min_severity(AuditSeverity::Critical),
		));
		let service = AuditService::new(
			AuditFilterConfig::with_min_severity(AuditSeverity::Critical),
			10000,
			QueueOverflowPolicy::DropNewest,
			vec![sink.clone()],
		);

		service.log(AuditLogEntry::builder(AuditEventType::PrivilegedAccess).build());
		service.log(AuditLogEntry::builder(AuditEventType::AccessGranted).build());
		service.log(AuditLogEntry::builder(AuditEventType::RoleAssignmentValidated).build());

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink.len(), 2);
		assert!(sink.events_of(AuditEventType::RoleAssignmentValidated).is_empty());
	}

	#[tokio::test]
	async fn test_per_sink_filter() {
		let everything = Arc::new(MemoryAuditSink::default());
		let errors_only = Arc::new(MemoryAuditSink::new(
			AuditFilterConfig::with_min_severity(AuditSeverity::Error),
		));
		let service = service(vec![everything.clone(), errors_only.clone()]);

		service.log(AuditLogEntry::builder(AuditEventType::RoleAssignmentRejected).build());
		service.log(AuditLogEntry::builder(AuditEventType::SystemError).build());

		sleep(Duration::from_millis(50)).await;
		assert_eq!(everything.len(), 2);
		assert_eq!(errors_only.len(), 1);
	}

	#[tokio::test]
	async fn test_failing_sink_does_not_block_others() {
		let good = Arc::new(MemoryAuditSink::default());
		let failing = Arc::new(FailingSink {
			filter: AuditFilterConfig::default(),
		});
		let service = service(vec![failing, good.clone()]);

		service.log(AuditLogEntry::builder(AuditEventType::AccessDenied).build());

		sleep(Duration::from_millis(50)).await;
		assert_eq!(good.len(), 1);
	}

	#[tokio::test]
	async fn test_from_config_rejects_unknown_severity() {
		let config = AuditConfig {
			min_severity: "loud".to_string(),
			..Default::default()
		};
		assert!(matches!(
			AuditService::from_config(&config, Vec::new()),
			Err(AuditError::ConfigError(_))
		));
	}

	#[tokio::test]
	async fn test_from_config_applies_min_severity() {
		let sink = Arc::new(MemoryAuditSink::default());
		let config = AuditConfig {
			min_severity: "error".to_string(),
			..Default::default()
		};
		let service = AuditService::from_config(&config, vec![sink.clone()]).unwrap();

		service.log(AuditLogEntry::builder(AuditEventType::ClinicalCredentialVerificationRequired).build());
		service.log(AuditLogEntry::builder(AuditEventType::SystemError).build());

		sleep(Duration::from_millis(50)).await;
		assert_eq!(sink.len(), 1);
	}
}
