//! The lease-based lock manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use certhive_store::{CreateOutcome, LeaseId, ObjectBackend, StoreError, StoreResult};

use crate::config::LockConfig;

/// Suffix appended to a logical key to name its lock marker object.
const MARKER_SUFFIX: &str = ".lock";

fn marker_key(key: &str) -> String {
    format!("{key}{MARKER_SUFFIX}")
}

/// Distributed mutual exclusion keyed by logical lock names.
///
/// A lock on `key` is an exclusive, TTL-bounded lease on the marker object
/// at `key + ".lock"`, arbitrated by the backing store's atomic lease
/// primitive, the only cross-process truth. The marker is created lazily on
/// the first lock for a key and outlives lock/unlock cycles; deleting it is
/// the caller's business, not the manager's.
///
/// Waiting is unfair: there is no queue among waiters, and whichever poll
/// attempt lands after the lease frees up wins. A holder that crashes stops
/// blocking everyone else once its lease lapses ([`LockConfig::expiration`]);
/// there is no heartbeat extending a live lease.
///
/// Each manager instance keeps its own registry of leases it holds, so
/// independent instances (say, two in one test process) never interfere.
pub struct LockManager<B: ObjectBackend> {
    backend: Arc<B>,
    config: LockConfig,
    held: Mutex<HashMap<String, LeaseId>>,
}

impl<B: ObjectBackend> LockManager<B> {
    /// Create a manager with the default lease TTL and poll cadence.
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_config(backend, LockConfig::default())
    }

    pub fn with_config(backend: Arc<B>, config: LockConfig) -> Self {
        Self {
            backend,
            config,
            held: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Returns `true` while this instance holds a lease for `key`.
    ///
    /// Says nothing about leases held by other processes.
    pub fn holds(&self, key: &str) -> bool {
        self.held.lock().expect("registry lock poisoned").contains_key(key)
    }

    /// Acquire exclusive access to `key`, blocking until the lease is
    /// granted or `cancel` fires.
    ///
    /// At most one caller across every process sharing the backing store is
    /// past this call for a given `key` at any instant. On cancellation the
    /// error is [`StoreError::Canceled`] and no state is left behind: no
    /// lease, no registry entry. Any backend failure other than a lease
    /// conflict aborts immediately; conflicts are retried every
    /// [`LockConfig::poll_interval`] and never surface.
    pub async fn lock(&self, key: &str, cancel: &CancellationToken) -> StoreResult<()> {
        let marker = marker_key(key);

        // The marker only has to exist; losing the creation race to another
        // process is as good as creating it ourselves. The existence probe
        // folds failures to "absent", costing at worst one redundant
        // create attempt.
        if self.backend.head(&marker).await.is_err() {
            match self.backend.create_if_absent(&marker, Bytes::new()).await? {
                CreateOutcome::Created => {
                    debug!(key = %key, marker = %marker, "created lock marker");
                }
                CreateOutcome::AlreadyExists => {}
            }
        }

        loop {
            match self.backend.acquire_lease(&marker, self.config.expiration).await {
                Ok(lease) => {
                    self.held
                        .lock()
                        .expect("registry lock poisoned")
                        .insert(key.to_string(), lease);
                    debug!(key = %key, "lock acquired");
                    return Ok(());
                }
                Err(err) if err.is_already_leased() => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                        _ = cancel.cancelled() => {
                            debug!(key = %key, "lock wait canceled");
                            return Err(StoreError::canceled(key));
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Release the lease this instance holds for `key`.
    ///
    /// A no-op success when this instance holds nothing for `key` (never
    /// locked here, or already unlocked). There is deliberately no way to
    /// force-release a lease another process holds; its expiry handles that.
    pub async fn unlock(&self, key: &str) -> StoreResult<()> {
        // Remove the entry before calling out, so a concurrent unlock for
        // the same key cannot release the same handle twice.
        let lease = self
            .held
            .lock()
            .expect("registry lock poisoned")
            .remove(key);
        let Some(lease) = lease else {
            return Ok(());
        };

        match self.backend.release_lease(&marker_key(key), &lease).await {
            Ok(()) => {
                debug!(key = %key, "lock released");
                Ok(())
            }
            Err(err) => {
                // The entry stays removed either way: the lease lapses on
                // its own once the TTL runs out.
                warn!(key = %key, error = %err, "lease release failed");
                Err(err)
            }
        }
    }
}
