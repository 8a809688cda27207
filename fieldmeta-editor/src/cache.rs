//! Reference List Cache: fetched lists by key, with a monotonic fetch epoch
//! per key so that only the newest response for a key is ever stored.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use fieldmeta_schema::{ListKey, RefItem};
use lru::LruCache;
use tracing::{debug, trace};

/// A fetched list and the epoch of the fetch that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceList {
    pub key: ListKey,
    pub items: Arc<[RefItem]>,
    pub epoch: u64,
}

/// LRU cache of reference lists.
///
/// Epochs outlive eviction: a key that is evicted and fetched again keeps
/// counting upwards, so late responses from before the eviction stay stale.
#[derive(Debug)]
pub struct ReferenceListCache {
    lists: LruCache<ListKey, ReferenceList>,
    epochs: HashMap<ListKey, u64>,
}

impl ReferenceListCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            lists: LruCache::new(capacity),
            epochs: HashMap::new(),
        }
    }

    /// Cached list for `key`, marking it most recently used.
    pub fn get(&mut self, key: &ListKey) -> Option<ReferenceList> {
        let hit = self.lists.get(key).cloned();
        trace!(%key, hit = hit.is_some(), "reference list cache lookup");
        hit
    }

    /// Allocate the epoch for a new fetch of `key`.
    pub fn begin_fetch(&mut self, key: &ListKey) -> u64 {
        let epoch = self.epochs.entry(key.clone()).or_insert(0);
        *epoch += 1;
        debug!(%key, epoch = *epoch, "reference list fetch started");
        *epoch
    }

    /// Epoch of the most recent fetch of `key`, 0 if never fetched.
    pub fn latest_epoch(&self, key: &ListKey) -> u64 {
        self.epochs.get(key).copied().unwrap_or(0)
    }

    /// Store a fetch result. Returns `None` without storing when a newer
    /// fetch of the same key has been started since.
    pub fn complete(
        &mut self,
        key: &ListKey,
        epoch: u64,
        items: Vec<RefItem>,
    ) -> Option<ReferenceList> {
        if epoch != self.latest_epoch(key) {
            debug!(%key, epoch, latest = self.latest_epoch(key), "superseded fetch not cached");
            return None;
        }
        let list = ReferenceList {
            key: key.clone(),
            items: items.into(),
            epoch,
        };
        if let Some((evicted, _)) = self.lists.push(key.clone(), list.clone()) {
            if &evicted != key {
                debug!(key = %evicted, "reference list evicted");
            }
        }
        Some(list)
    }

    /// Drop the cached list for `key` so the next lookup refetches it.
    pub fn invalidate(&mut self, key: &ListKey) -> bool {
        self.lists.pop(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.lists.cap()
    }
}
