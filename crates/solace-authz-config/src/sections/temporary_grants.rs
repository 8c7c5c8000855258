// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Temporary grant policy section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 30 days.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemporaryGrantsConfigLayer {
	pub max_duration_secs: Option<u64>,
}

impl TemporaryGrantsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.max_duration_secs.is_some() {
			self.max_duration_secs = other.max_duration_secs;
		}
	}

	pub fn finalize(self) -> TemporaryGrantsConfig {
		TemporaryGrantsConfig {
			max_duration_secs: self.max_duration_secs.unwrap_or(DEFAULT_MAX_DURATION_SECS),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemporaryGrantsConfig {
	pub max_duration_secs: u64,
}

impl TemporaryGrantsConfig {
	pub fn max_duration(&self) -> Duration {
		Duration::from_secs(self.max_duration_secs)
	}
}

impl Default for TemporaryGrantsConfig {
	fn default() -> Self {
		TemporaryGrantsConfigLayer::default().finalize()
	}
}
