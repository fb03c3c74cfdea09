//! The host-facing storage surface over a backend handle.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::backend::ObjectBackend;
use crate::error::StoreResult;
use crate::types::KeyInfo;

/// Key-addressed byte store over an [`ObjectBackend`].
///
/// This is the surface certificate-management code works against: whole-value
/// reads and writes keyed by caller-chosen names, plus prefix listing. Every
/// call is one round trip to the backing store; nothing is cached here,
/// since the store is the only source of cross-process truth and staleness
/// would silently break read-after-write expectations.
///
/// Side effects are confined to the single named key; no cross-key
/// invariants are enforced at this layer.
pub struct Storage<B: ObjectBackend> {
    backend: Arc<B>,
}

// Manual Clone so `B` itself does not have to be Clone.
impl<B: ObjectBackend> Clone for Storage<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: ObjectBackend> Storage<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Write `value` at `key`, replacing any existing object as a whole.
    pub async fn store(&self, key: &str, value: Bytes) -> StoreResult<()> {
        self.backend.put(key, value).await?;
        debug!(key = %key, "stored object");
        Ok(())
    }

    /// Read the value at `key`.
    ///
    /// An absent key is `NotFound`, structurally distinct from any other
    /// failure.
    pub async fn load(&self, key: &str) -> StoreResult<Bytes> {
        self.backend.get(key).await
    }

    /// Remove the object at `key`. Idempotent: deleting an absent key
    /// succeeds, and an error means the key may still exist.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        match self.backend.delete(key).await {
            Ok(()) => {
                debug!(key = %key, "deleted object");
                Ok(())
            }
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Returns `true` if an object exists at `key`.
    ///
    /// Every failure, including transient ones, folds to `false`: the
    /// result cannot distinguish "definitely absent" from "could not check".
    /// Callers that need that distinction use [`Storage::stat`].
    pub async fn exists(&self, key: &str) -> bool {
        self.backend.head(key).await.is_ok()
    }

    /// Metadata for the object at `key`, with the same `NotFound` discipline
    /// as [`Storage::load`].
    pub async fn stat(&self, key: &str) -> StoreResult<KeyInfo> {
        self.backend.head(key).await
    }

    /// List keys that start with `prefix`.
    ///
    /// The match is a byte-prefix at offset zero, not path-aware. With
    /// `recursive` false, keys whose remainder after `prefix` contains `/`
    /// are dropped, leaving only directly nested keys. An empty prefix
    /// matches every key; a prefix matching nothing yields an empty vec.
    ///
    /// The backend's enumeration is paginated internally; an error on any
    /// page aborts the whole call with that error and discards what was
    /// collected. Order is the backend's native enumeration order and is not
    /// stable under concurrent mutation.
    pub async fn list(&self, prefix: &str, recursive: bool) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.backend.list_page(cursor).await?;
            for key in page.keys {
                if !key.starts_with(prefix) {
                    continue;
                }
                if !recursive && key[prefix.len()..].contains('/') {
                    continue;
                }
                names.push(key);
            }
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!(prefix = %prefix, recursive, count = names.len(), "listed keys");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryBackend;
    use crate::types::{CreateOutcome, LeaseId, ListPage};

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    fn storage() -> Storage<MemoryBackend> {
        Storage::new(Arc::new(MemoryBackend::new()))
    }

    /// Delegates to a [`MemoryBackend`] but can be told to fail metadata
    /// probes or any page after the first.
    struct UnreliableBackend {
        inner: MemoryBackend,
        fail_head: AtomicBool,
        fail_later_pages: AtomicBool,
        pages_served: AtomicUsize,
    }

    impl UnreliableBackend {
        fn new(inner: MemoryBackend) -> Self {
            Self {
                inner,
                fail_head: AtomicBool::new(false),
                fail_later_pages: AtomicBool::new(false),
                pages_served: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ObjectBackend for UnreliableBackend {
        async fn put(&self, key: &str, value: Bytes) -> StoreResult<()> {
            self.inner.put(key, value).await
        }

        async fn get(&self, key: &str) -> StoreResult<Bytes> {
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> StoreResult<()> {
            self.inner.delete(key).await
        }

        async fn head(&self, key: &str) -> StoreResult<KeyInfo> {
            if self.fail_head.load(Ordering::SeqCst) {
                return Err(StoreError::io("head", key, "probe failed"));
            }
            self.inner.head(key).await
        }

        async fn list_page(&self, cursor: Option<String>) -> StoreResult<ListPage> {
            if self.fail_later_pages.load(Ordering::SeqCst)
                && self.pages_served.fetch_add(1, Ordering::SeqCst) >= 1
            {
                return Err(StoreError::io("list_page", "", "enumeration failed"));
            }
            self.inner.list_page(cursor).await
        }

        async fn create_if_absent(&self, key: &str, value: Bytes) -> StoreResult<CreateOutcome> {
            self.inner.create_if_absent(key, value).await
        }

        async fn acquire_lease(&self, key: &str, ttl: Duration) -> StoreResult<LeaseId> {
            self.inner.acquire_lease(key, ttl).await
        }

        async fn release_lease(&self, key: &str, lease: &LeaseId) -> StoreResult<()> {
            self.inner.release_lease(key, lease).await
        }
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn store_then_load_returns_the_value() {
        let storage = storage();
        let value = Bytes::from_static(b"-----BEGIN CERTIFICATE-----\nMIIC...");
        storage.store("certs/example.com.pem", value.clone()).await.unwrap();

        let loaded = storage.load("certs/example.com.pem").await.unwrap();
        assert_eq!(loaded, value);
    }

    #[tokio::test]
    async fn second_store_wins() {
        let storage = storage();
        storage.store("k", Bytes::from_static(b"first")).await.unwrap();
        storage.store("k", Bytes::from_static(b"second")).await.unwrap();
        assert_eq!(storage.load("k").await.unwrap(), Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn unicode_and_space_keys_round_trip() {
        let storage = storage();
        let keys = [
            "special chars/üñîçødë.txt",
            "special chars/with space.txt",
            "special chars/中文文件.txt",
        ];
        for (i, key) in keys.iter().enumerate() {
            let value = Bytes::from(format!("content {i}"));
            storage.store(key, value.clone()).await.unwrap();
            assert_eq!(storage.load(key).await.unwrap(), value);
        }
    }

    #[tokio::test]
    async fn empty_value_round_trips() {
        let storage = storage();
        storage.store("empty", Bytes::new()).await.unwrap();
        assert_eq!(storage.load("empty").await.unwrap(), Bytes::new());
        assert_eq!(storage.stat("empty").await.unwrap().size, 0);
    }

    #[tokio::test]
    async fn multi_megabyte_value_round_trips() {
        let storage = storage();
        let value: Bytes = (0..4 * 1024 * 1024u32).map(|i| i as u8).collect::<Vec<u8>>().into();
        storage.store("large.bin", value.clone()).await.unwrap();

        let loaded = storage.load("large.bin").await.unwrap();
        assert_eq!(loaded.len(), value.len());
        assert_eq!(loaded, value);
    }

    #[tokio::test]
    async fn load_missing_is_not_found() {
        let storage = storage();
        let err = storage.load("non-existent-key").await.unwrap_err();
        assert!(err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // Delete idempotence
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_of_absent_key_succeeds() {
        let storage = storage();
        storage.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn double_delete_succeeds() {
        let storage = storage();
        storage.store("k", Bytes::from_static(b"v")).await.unwrap();

        storage.delete("k").await.unwrap();
        assert!(!storage.exists("k").await);
        storage.delete("k").await.unwrap();
    }

    // -----------------------------------------------------------------------
    // Exists / Stat
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn exists_tracks_presence() {
        let storage = storage();
        assert!(!storage.exists("k").await);
        storage.store("k", Bytes::from_static(b"v")).await.unwrap();
        assert!(storage.exists("k").await);
    }

    #[tokio::test]
    async fn exists_folds_probe_failure_to_false() {
        let backend = Arc::new(UnreliableBackend::new(MemoryBackend::new()));
        let storage = Storage::new(Arc::clone(&backend));
        storage.store("k", Bytes::from_static(b"v")).await.unwrap();

        backend.fail_head.store(true, Ordering::SeqCst);
        assert!(!storage.exists("k").await);

        // Stat keeps the distinction exists gives up.
        let err = storage.stat("k").await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn stat_reports_key_size_and_terminality() {
        let storage = storage();
        storage.store("dir/file.txt", Bytes::from_static(b"test data")).await.unwrap();

        let info = storage.stat("dir/file.txt").await.unwrap();
        assert_eq!(info.key, "dir/file.txt");
        assert_eq!(info.size, 9);
        assert!(info.is_terminal);
    }

    #[tokio::test]
    async fn stat_missing_is_not_found() {
        let storage = storage();
        let err = storage.stat("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    async fn seed_listing_keys(storage: &Storage<MemoryBackend>) {
        for key in ["p/a", "p/b", "p/dir/c"] {
            storage.store(key, Bytes::from_static(b"x")).await.unwrap();
        }
    }

    #[tokio::test]
    async fn non_recursive_listing_stops_at_the_delimiter() {
        let storage = storage();
        seed_listing_keys(&storage).await;

        let keys = storage.list("p/", false).await.unwrap();
        assert_eq!(keys, vec!["p/a", "p/b"]);
    }

    #[tokio::test]
    async fn recursive_listing_returns_everything_under_the_prefix() {
        let storage = storage();
        seed_listing_keys(&storage).await;

        let keys = storage.list("p/", true).await.unwrap();
        assert_eq!(keys, vec!["p/a", "p/b", "p/dir/c"]);
    }

    #[tokio::test]
    async fn unmatched_prefix_yields_empty() {
        let storage = storage();
        seed_listing_keys(&storage).await;

        let keys = storage.list("nope/", true).await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn empty_prefix_matches_every_key() {
        let storage = storage();
        seed_listing_keys(&storage).await;

        let keys = storage.list("", true).await.unwrap();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn prefix_match_is_not_path_aware() {
        let storage = storage();
        seed_listing_keys(&storage).await;

        // "p/di" is a substring prefix, not a directory.
        let keys = storage.list("p/di", true).await.unwrap();
        assert_eq!(keys, vec!["p/dir/c"]);
        // Non-recursive: the remainder "r/c" still contains the delimiter.
        let keys = storage.list("p/di", false).await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn listing_spans_multiple_pages() {
        let backend = Arc::new(MemoryBackend::with_page_size(2));
        let storage = Storage::new(backend);
        for i in 0..7 {
            storage.store(&format!("p/{i}"), Bytes::new()).await.unwrap();
        }

        let keys = storage.list("p/", true).await.unwrap();
        assert_eq!(keys.len(), 7);
    }

    #[tokio::test]
    async fn mid_pagination_error_aborts_the_listing() {
        let backend = Arc::new(UnreliableBackend::new(MemoryBackend::with_page_size(2)));
        let storage = Storage::new(Arc::clone(&backend));
        for i in 0..5 {
            storage.store(&format!("p/{i}"), Bytes::new()).await.unwrap();
        }

        backend.fail_later_pages.store(true, Ordering::SeqCst);
        let err = storage.list("p/", true).await.unwrap_err();
        assert!(!err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // Concurrent use
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn concurrent_round_trips_leave_the_namespace_clean() {
        let storage = storage();
        let mut handles = Vec::new();
        for task in 0..8 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                for op in 0..16 {
                    let key = format!("concurrent/file-{task}-{op}");
                    let value = Bytes::from(format!("content-{task}-{op}"));
                    storage.store(&key, value.clone()).await.unwrap();
                    assert_eq!(storage.load(&key).await.unwrap(), value);
                    storage.delete(&key).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let leftover = storage.list("concurrent/", true).await.unwrap();
        assert!(leftover.is_empty());
    }
}
