use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;
use crate::types::{CreateOutcome, KeyInfo, LeaseId, ListPage};

/// An already-authenticated handle to a backing object store.
///
/// This is the seam between the core and whatever store the host wired up.
/// Implementations must satisfy these invariants:
/// - Keys are flat strings; `/` carries no meaning at this layer.
/// - `put` replaces the object as a whole; readers never observe a partial
///   write.
/// - Native error responses are normalized into the canonical
///   [`StoreError`](crate::error::StoreError) kinds. In particular, every
///   "does not exist" response maps to `NotFound` and every lease conflict
///   to `AlreadyLeased`.
/// - `acquire_lease` is atomic across all processes sharing the store: at
///   most one live lease per object at any instant.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Write `value` at `key`, replacing any existing object.
    async fn put(&self, key: &str, value: Bytes) -> StoreResult<()>;

    /// Read the object at `key`. `NotFound` when absent.
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Remove the object at `key`. `NotFound` when absent; the storage
    /// surface above this trait absorbs that into success.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Metadata probe for the object at `key`. `NotFound` when absent.
    async fn head(&self, key: &str) -> StoreResult<KeyInfo>;

    /// One page of the flat key enumeration, starting after `cursor`.
    ///
    /// Passing the previous page's `next` cursor continues the walk; `None`
    /// starts from the beginning.
    async fn list_page(&self, cursor: Option<String>) -> StoreResult<ListPage>;

    /// Create the object at `key` only if the key is unoccupied.
    ///
    /// Losing a creation race is the [`CreateOutcome::AlreadyExists`]
    /// outcome, not an error.
    async fn create_if_absent(&self, key: &str, value: Bytes) -> StoreResult<CreateOutcome>;

    /// Atomically acquire an exclusive, `ttl`-bounded lease on the object at
    /// `key`.
    ///
    /// Fails with `AlreadyLeased` while another live lease exists; a lease
    /// past its expiry is replaced silently. `NotFound` when the object is
    /// absent. Leases are never extended: they are released or they lapse.
    async fn acquire_lease(&self, key: &str, ttl: Duration) -> StoreResult<LeaseId>;

    /// Release `lease` on the object at `key`.
    ///
    /// Fails unless `lease` is the lease currently recorded on the object,
    /// so a stale holder cannot release a successor's lease.
    async fn release_lease(&self, key: &str, lease: &LeaseId) -> StoreResult<()>;
}
