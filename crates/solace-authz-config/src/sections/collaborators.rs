// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborator call configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollaboratorsConfigLayer {
	pub timeout_ms: Option<u64>,
}

impl CollaboratorsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.timeout_ms.is_some() {
			self.timeout_ms = other.timeout_ms;
		}
	}

	pub fn finalize(self) -> CollaboratorsConfig {
		CollaboratorsConfig {
			timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_COLLABORATOR_TIMEOUT_MS),
		}
	}
}

/// Bounds account-status, owner-resolution and temporary-grant lookups that
/// carry no caller deadline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollaboratorsConfig {
	pub timeout_ms: u64,
}

impl CollaboratorsConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

impl Default for CollaboratorsConfig {
	fn default() -> Self {
		CollaboratorsConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_timeout() {
		assert_eq!(
			CollaboratorsConfig::default().timeout(),
			Duration::from_secs(2)
		);
	}
}
