//! Bounded least-recently-used cache of resolved metadata.
//!
//! Owned by a [`crate::pipeline::resolve::MetadataResolver`], shared across
//! concurrent requests through a mutex. Entries never expire; once
//! `capacity` DOIs are cached, inserting a new one evicts the entry that
//! was read or written longest ago. Two requests racing on the same
//! uncached DOI may both resolve it; the second insert simply overwrites.

use crate::metadata::{MetadataRecord, NormalizedDoi};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Thread-safe LRU map from DOI to resolved record.
#[derive(Debug)]
pub struct MetadataCache {
    inner: Mutex<LruCache<NormalizedDoi, MetadataRecord>>,
}

impl MetadataCache {
    /// A cache holding at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up `doi`, marking it as most recently used.
    pub fn get(&self, doi: &NormalizedDoi) -> Option<MetadataRecord> {
        self.lock().get(doi).cloned()
    }

    /// Insert or replace the record for `doi`, evicting the least recently
    /// used entry when full.
    pub fn insert(&self, doi: NormalizedDoi, record: MetadataRecord) {
        let mut inner = self.lock();
        if let Some((evicted, _)) = inner.push(doi.clone(), record) {
            if evicted != doi {
                debug!("Metadata cache full ({}), evicted {}", inner.cap(), evicted);
            }
        }
    }

    /// Membership test that does not touch recency.
    pub fn contains(&self, doi: &NormalizedDoi) -> bool {
        self.lock().contains(doi)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<NormalizedDoi, MetadataRecord>> {
        // Every update is a single map call; a poisoned map is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
