//! In-memory backend for tests and embedding.
//!
//! [`MemoryBackend`] keeps all objects in a `BTreeMap` behind a `RwLock`, so
//! enumeration order is ascending lexicographic and concurrent access is
//! safe. Lease expiry follows the tokio clock, which makes time-sensitive
//! tests deterministic under a paused runtime.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::backend::ObjectBackend;
use crate::error::{StoreError, StoreResult};
use crate::types::{CreateOutcome, KeyInfo, LeaseId, ListPage};

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Clone, Debug)]
struct LeaseState {
    id: LeaseId,
    expires_at: Instant,
}

impl LeaseState {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Clone, Debug)]
struct Entry {
    value: Bytes,
    modified: DateTime<Utc>,
    lease: Option<LeaseState>,
}

/// An in-memory implementation of [`ObjectBackend`].
///
/// All data lives behind a `RwLock` and is lost when the backend is dropped.
#[derive(Debug)]
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, Entry>>,
    page_size: usize,
}

impl MemoryBackend {
    /// Create a new empty backend with the default page size.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create a backend that enumerates `page_size` keys per page.
    ///
    /// A page size below the key count makes the pagination path observable
    /// in tests.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the backend holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Returns `true` while an unexpired lease is recorded on `key`.
    pub fn has_live_lease(&self, key: &str) -> bool {
        let map = self.objects.read().expect("lock poisoned");
        map.get(key)
            .and_then(|entry| entry.lease.as_ref())
            .is_some_and(|lease| lease.is_live(Instant::now()))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        // Overwriting the value does not disturb an existing lease.
        let lease = map.get(key).and_then(|entry| entry.lease.clone());
        map.insert(
            key.to_string(),
            Entry {
                value,
                modified: Utc::now(),
                lease,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        match map.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(key)),
        }
    }

    async fn head(&self, key: &str) -> StoreResult<KeyInfo> {
        let map = self.objects.read().expect("lock poisoned");
        let entry = map.get(key).ok_or_else(|| StoreError::not_found(key))?;
        Ok(KeyInfo {
            key: key.to_string(),
            modified: entry.modified,
            size: entry.value.len() as u64,
            is_terminal: true,
        })
    }

    async fn list_page(&self, cursor: Option<String>) -> StoreResult<ListPage> {
        let map = self.objects.read().expect("lock poisoned");
        let start = match cursor {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };
        let mut keys: Vec<String> = map
            .range::<String, _>((start, Bound::Unbounded))
            .map(|(key, _)| key.clone())
            .take(self.page_size + 1)
            .collect();
        let next = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };
        Ok(ListPage { keys, next })
    }

    async fn create_if_absent(&self, key: &str, value: Bytes) -> StoreResult<CreateOutcome> {
        let mut map = self.objects.write().expect("lock poisoned");
        if map.contains_key(key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        map.insert(
            key.to_string(),
            Entry {
                value,
                modified: Utc::now(),
                lease: None,
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn acquire_lease(&self, key: &str, ttl: Duration) -> StoreResult<LeaseId> {
        let mut map = self.objects.write().expect("lock poisoned");
        let entry = map.get_mut(key).ok_or_else(|| StoreError::not_found(key))?;
        let now = Instant::now();
        if let Some(lease) = &entry.lease {
            if lease.is_live(now) {
                return Err(StoreError::already_leased(key));
            }
            // Lapsed lease: the slot is free again.
        }
        let id = LeaseId::new();
        entry.lease = Some(LeaseState {
            id: id.clone(),
            expires_at: now + ttl,
        });
        Ok(id)
    }

    async fn release_lease(&self, key: &str, lease: &LeaseId) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        let entry = map.get_mut(key).ok_or_else(|| StoreError::not_found(key))?;
        match &entry.lease {
            Some(current) if current.id == *lease => {
                entry.lease = None;
                Ok(())
            }
            _ => Err(StoreError::io(
                "release_lease",
                key,
                "lease is not the live lease on this object",
            )),
        }
    }
}
