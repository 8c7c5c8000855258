// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded, time-limited cache of allow/deny verdicts.
//!
//! Only the boolean outcome is stored. Reasons are recomputed for every
//! caller so user-facing messages never go stale. Eviction is by insertion
//! order, not recency of use.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use solace_authz_config::CacheConfig;
use solace_authz_core::{Action, ActorId, Resource, RoleName};

/// Identifies one cached decision.
///
/// When the owner was not supplied by the caller the resource id stands in
/// for it, since the owner is resolved after the cache lookup. Extras feed
/// custom predicates, so a fingerprint of them is part of the key too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub actor_id: ActorId,
	pub role: RoleName,
	pub resource: Resource,
	pub action: Action,
	pub owner_id: Option<ActorId>,
	pub resource_id: Option<String>,
	pub extras: u64,
}

impl CacheKey {
	pub fn new(
		actor_id: ActorId,
		role: RoleName,
		resource: Resource,
		action: Action,
		owner_id: Option<ActorId>,
		resource_id: Option<&str>,
		extras: &Map<String, Value>,
	) -> Self {
		Self {
			actor_id,
			role,
			resource,
			action,
			owner_id,
			resource_id: if owner_id.is_some() {
				None
			} else {
				resource_id.map(str::to_string)
			},
			extras: fingerprint(extras),
		}
	}
}

fn fingerprint(extras: &Map<String, Value>) -> u64 {
	if extras.is_empty() {
		return 0;
	}
	let mut hasher = DefaultHasher::new();
	for (key, value) in extras {
		key.hash(&mut hasher);
		value.to_string().hash(&mut hasher);
	}
	hasher.finish()
}

#[derive(Debug, Clone, Copy)]
struct CachedVerdict {
	allowed: bool,
	inserted_at: Instant,
	ttl: Duration,
	seq: u64,
}

impl CachedVerdict {
	fn is_fresh(&self) -> bool {
		self.inserted_at.elapsed() <= self.ttl
	}
}

#[derive(Debug, Default)]
struct CacheInner {
	entries: HashMap<CacheKey, CachedVerdict>,
	/// Insertion order. May hold stale records for keys that were replaced
	/// or removed; those are recognised by a sequence mismatch.
	order: VecDeque<(CacheKey, u64)>,
	next_seq: u64,
	/// Bumped by every invalidation.
	epoch: u64,
}

impl CacheInner {
	fn evict_oldest(&mut self) {
		while let Some((key, seq)) = self.order.pop_front() {
			if self.entries.get(&key).is_some_and(|e| e.seq == seq) {
				self.entries.remove(&key);
				return;
			}
		}
	}

	fn compact(&mut self) {
		let entries = &self.entries;
		self
			.order
			.retain(|(key, seq)| entries.get(key).is_some_and(|e| e.seq == *seq));
	}
}

/// Hit and miss counters plus the current entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub entries: usize,
}

/// Shared verdict cache. All operations take a single lock, so eviction and
/// insertion never race and the size bound is exact.
#[derive(Debug)]
pub struct DecisionCache {
	inner: Mutex<CacheInner>,
	ttl: Duration,
	max_entries: usize,
	enabled: bool,
	hits: AtomicU64,
	misses: AtomicU64,
}

impl DecisionCache {
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		Self {
			inner: Mutex::new(CacheInner::default()),
			ttl,
			max_entries: max_entries.max(1),
			enabled: true,
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
		}
	}

	/// A cache that never stores anything.
	pub fn disabled() -> Self {
		Self {
			enabled: false,
			..Self::new(Duration::ZERO, 1)
		}
	}

	pub fn from_config(config: &CacheConfig) -> Self {
		if config.enabled {
			Self::new(config.ttl(), config.max_entries)
		} else {
			Self::disabled()
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn max_entries(&self) -> usize {
		self.max_entries
	}

	/// Returns the cached verdict if present and younger than the TTL.
	/// Expired entries are removed on the way out.
	pub fn get(&self, key: &CacheKey) -> Option<bool> {
		if !self.enabled {
			self.misses.fetch_add(1, Ordering::Relaxed);
			return None;
		}

		let mut inner = self.inner.lock();
		let found = inner
			.entries
			.get(key)
			.map(|e| (e.allowed, e.is_fresh()));
		let result = match found {
			Some((allowed, true)) => Some(allowed),
			Some((_, false)) => {
				inner.entries.remove(key);
				None
			}
			None => None,
		};
		drop(inner);

		match result {
			Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
			None => self.misses.fetch_add(1, Ordering::Relaxed),
		};
		result
	}

	pub fn put(&self, key: CacheKey, allowed: bool) {
		let mut inner = self.inner.lock();
		let epoch = inner.epoch;
		self.insert_locked(&mut inner, key, allowed, epoch, None);
	}

	/// Current invalidation epoch. Read it before computing a verdict and
	/// hand it to [`Self::put_checked`].
	pub fn epoch(&self) -> u64 {
		self.inner.lock().epoch
	}

	/// Stores a verdict unless an invalidation ran since `epoch` was read.
	/// `max_age` shortens the TTL for verdicts that rest on something
	/// expiring sooner. Returns whether the verdict was stored.
	pub fn put_checked(
		&self,
		key: CacheKey,
		allowed: bool,
		epoch: u64,
		max_age: Option<Duration>,
	) -> bool {
		let mut inner = self.inner.lock();
		self.insert_locked(&mut inner, key, allowed, epoch, max_age)
	}

	fn insert_locked(
		&self,
		inner: &mut CacheInner,
		key: CacheKey,
		allowed: bool,
		epoch: u64,
		max_age: Option<Duration>,
	) -> bool {
		if !self.enabled || inner.epoch != epoch {
			return false;
		}

		if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
			inner.evict_oldest();
		}

		let seq = inner.next_seq;
		inner.next_seq += 1;
		inner.order.push_back((key.clone(), seq));
		inner.entries.insert(
			key,
			CachedVerdict {
				allowed,
				inserted_at: Instant::now(),
				ttl: max_age.map_or(self.ttl, |age| age.min(self.ttl)),
				seq,
			},
		);

		if inner.order.len() > self.max_entries.saturating_mul(2) {
			inner.compact();
		}
		true
	}

	/// Drops every verdict cached for this actor. Returns how many were removed.
	pub fn invalidate_actor(&self, actor_id: ActorId) -> usize {
		let mut inner = self.inner.lock();
		inner.epoch += 1;
		let before = inner.entries.len();
		inner.entries.retain(|key, _| key.actor_id != actor_id);
		let removed = before - inner.entries.len();
		if removed > 0 {
			inner.compact();
		}
		removed
	}

	pub fn clear(&self) {
		let mut inner = self.inner.lock();
		inner.epoch += 1;
		inner.entries.clear();
		inner.order.clear();
	}

	/// Removes every expired entry. Returns how many were removed.
	pub fn purge_expired(&self) -> usize {
		let mut inner = self.inner.lock();
		let before = inner.entries.len();
		inner.entries.retain(|_, e| e.is_fresh());
		let removed = before - inner.entries.len();
		if removed > 0 {
			inner.compact();
		}
		removed
	}

	pub fn len(&self) -> usize {
		self.inner.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			entries: self.len(),
		}
	}
}

impl Default for DecisionCache {
	fn default() -> Self {
		Self::from_config(&CacheConfig::default())
	}
}
