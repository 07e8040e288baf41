//! # Reference Index
//!
//! Run-scoped mapping from exact fingerprint to the best known copy under
//! that fingerprint. This is the only mutable state shared across
//! placement workers.
//!
//! ## Concurrency
//! The map itself is a sharded concurrent map, but the placement
//! check-then-act sequence (lookup, arbitrate, move, update) spans slow
//! filesystem work and must be serialized *per fingerprint*: two workers
//! racing on the same key must not both conclude they are the new
//! original. [`ReferenceIndex::key_lock`] hands out one mutex per
//! fingerprint for exactly that scope; within one key's history, index
//! updates are linearizable. No ordering holds across different keys.
//!
//! ## Staleness
//! An entry whose file no longer exists on disk is evicted lazily when it
//! is next looked up, never by background sweep.

use crate::core::fingerprint::perceptual;
use crate::core::record::{FileRecord, MediaKind};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Fingerprint -> best-known-copy map with per-key serialization.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    entries: DashMap<String, FileRecord>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The serialization lock for one fingerprint key.
    ///
    /// Placement holds this for the whole lookup-arbitrate-move-update
    /// sequence on the key.
    pub fn key_lock(&self, fingerprint: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(fingerprint.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Look up the current record for a fingerprint.
    ///
    /// A stale entry (file vanished from disk) is evicted and reported
    /// as a miss.
    pub fn lookup(&self, fingerprint: &str) -> Option<FileRecord> {
        let record = self.entries.get(fingerprint).map(|r| r.value().clone())?;

        if !record.path.exists() {
            debug!(
                fingerprint,
                path = %record.path.display(),
                "evicting stale index entry"
            );
            self.entries.remove(fingerprint);
            return None;
        }

        Some(record)
    }

    /// Insert or replace the record under a fingerprint.
    ///
    /// Callers only do this after the file's placement is confirmed on
    /// disk, holding the key lock.
    pub fn insert(&self, fingerprint: &str, record: FileRecord) {
        self.entries.insert(fingerprint.to_string(), record);
    }

    /// Remove an entry outright
    pub fn evict(&self, fingerprint: &str) -> Option<FileRecord> {
        self.entries.remove(fingerprint).map(|(_, record)| record)
    }

    /// Find an indexed image whose perceptual hash is within the
    /// similarity threshold of `hash`.
    ///
    /// Returns the entry's exact-fingerprint key with the record, so a
    /// later exact duplicate of either copy still collides under the
    /// same key. Stale candidates are evicted along the way.
    pub fn find_perceptual_match(&self, hash: u64) -> Option<(String, FileRecord)> {
        let candidates: Vec<(String, FileRecord)> = self
            .entries
            .iter()
            .filter(|entry| entry.kind == MediaKind::Image)
            .filter(|entry| {
                entry
                    .perceptual_hash
                    .map(|h| perceptual::are_similar(h, hash))
                    .unwrap_or(false)
            })
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (key, record) in candidates {
            if record.path.exists() {
                return Some((key, record));
            }
            debug!(
                fingerprint = %key,
                path = %record.path.display(),
                "evicting stale index entry during perceptual scan"
            );
            self.entries.remove(&key);
        }

        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Explicit reset between runs
    pub fn clear(&self) {
        self.entries.clear();
        self.locks.clear();
    }
}
