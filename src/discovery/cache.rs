//! Change detection
//!
//! Descriptors are keyed by a SHA-256 checksum of their canonical JSON form.
//! A route is published only when its checksum has not been seen before.
//!
//! Entries are never evicted: the cache grows by one entry per distinct
//! snapshot for the lifetime of the process. Checksums and descriptors are
//! small, and a restart clears the cache (forcing one republication of each
//! API), so no capacity bound is applied.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::{ApiDescriptor, DETAIL_CHECKSUM};
use crate::errors::Result;

/// Compute the checksum of a descriptor.
///
/// Covers every field except the checksum detail itself, with object keys in
/// sorted order so the result does not depend on map iteration order.
pub fn checksum(descriptor: &ApiDescriptor) -> Result<String> {
    let mut value = serde_json::to_value(descriptor)?;
    if let Some(details) = value.get_mut("agentDetails").and_then(Value::as_object_mut) {
        details.remove(DETAIL_CHECKSUM);
    }

    let canonical = serde_json::to_vec(&canonicalize(value))?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, canonicalize(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// A previously published snapshot
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub descriptor: ApiDescriptor,
    pub recorded_at: DateTime<Utc>,
}

/// Concurrent checksum → snapshot store shared by every route worker
#[derive(Debug, Default)]
pub struct ChangeCache {
    entries: DashMap<String, CacheEntry>,
}

impl ChangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this exact content was published before, plus its checksum
    pub fn is_published(&self, descriptor: &ApiDescriptor) -> Result<(bool, String)> {
        let checksum = checksum(descriptor)?;
        Ok((self.entries.contains_key(&checksum), checksum))
    }

    /// Store or overwrite the entry for a checksum
    pub fn record(&self, checksum: String, descriptor: ApiDescriptor) {
        self.entries.insert(checksum, CacheEntry { descriptor, recorded_at: Utc::now() });
    }

    /// Snapshot last published under a checksum
    pub fn get(&self, checksum: &str) -> Option<CacheEntry> {
        self.entries.get(checksum).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
