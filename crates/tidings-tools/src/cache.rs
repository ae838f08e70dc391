// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-boxed cache for tool results, keyed by call signature.
//!
//! Entries expire a fixed TTL after insertion and are evicted lazily on
//! lookup. Entry count is unbounded.

use std::collections::BTreeMap;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tidings_core::types::ToolInvocationResult;
use tokio::time::Instant;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Concurrent TTL cache.
pub struct ToolResultCache<V = ToolInvocationResult> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> ToolResultCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value if it is younger than the TTL.
    ///
    /// An expired entry is removed before returning `None`.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if now.duration_since(entry.inserted_at) < self.ttl {
                return Some(entry.value.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| now.duration_since(entry.inserted_at) >= self.ttl);
        None
    }

    /// Inserts or replaces the value for `key`, restarting its TTL.
    pub fn put(&self, key: String, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<V: Clone> Default for ToolResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Stable key for a tool call: SHA-256 over the tool name and the
/// parameters serialized with their keys sorted.
pub fn cache_key(tool_name: &str, params: &Map<String, Value>) -> String {
    let sorted: BTreeMap<&String, &Value> = params.iter().collect();
    let canonical = serde_json::to_string(&sorted).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(tool_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
