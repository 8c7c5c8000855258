// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	AuditConfigLayer, CacheConfigLayer, CollaboratorsConfigLayer, DatabaseConfigLayer,
	LoggingConfigLayer, RolesConfigLayer, TemporaryGrantsConfigLayer,
};

/// Authorization configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzConfigLayer {
	#[serde(default)]
	pub cache: Option<CacheConfigLayer>,
	#[serde(default)]
	pub roles: Option<RolesConfigLayer>,
	#[serde(default)]
	pub temporary_grants: Option<TemporaryGrantsConfigLayer>,
	#[serde(default)]
	pub collaborators: Option<CollaboratorsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub audit: Option<AuditConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
}

impl AuthzConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: AuthzConfigLayer) {
		merge_option(&mut self.cache, other.cache, CacheConfigLayer::merge);
		merge_option(&mut self.roles, other.roles, RolesConfigLayer::merge);
		merge_option(
			&mut self.temporary_grants,
			other.temporary_grants,
			TemporaryGrantsConfigLayer::merge,
		);
		merge_option(
			&mut self.collaborators,
			other.collaborators,
			CollaboratorsConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.audit, other.audit, AuditConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = AuthzConfigLayer::default();
		base.merge(AuthzConfigLayer::default());
		assert!(base.cache.is_none());
	}

	#[test]
	fn test_merge_preserves_base_when_other_empty() {
		let mut base = AuthzConfigLayer {
			cache: Some(CacheConfigLayer {
				ttl_secs: Some(30),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(AuthzConfigLayer::default());
		assert_eq!(base.cache.as_ref().unwrap().ttl_secs, Some(30));
	}

	#[test]
	fn test_merge_adds_missing_sections() {
		let mut base = AuthzConfigLayer {
			cache: Some(CacheConfigLayer {
				ttl_secs: Some(30),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(AuthzConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(base.cache.as_ref().unwrap().ttl_secs, Some(30));
		assert_eq!(
			base.database.as_ref().unwrap().url,
			Some("sqlite::memory:".to_string())
		);
	}

	proptest! {
		#[test]
		fn later_layer_wins_when_set(a in proptest::option::of(1u64..10_000), b in proptest::option::of(1u64..10_000)) {
			let mut base = AuthzConfigLayer {
				cache: Some(CacheConfigLayer { ttl_secs: a, ..Default::default() }),
				..Default::default()
			};
			base.merge(AuthzConfigLayer {
				cache: Some(CacheConfigLayer { ttl_secs: b, ..Default::default() }),
				..Default::default()
			});
			prop_assert_eq!(base.cache.unwrap().ttl_secs, b.or(a));
		}
	}
}
