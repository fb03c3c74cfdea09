//! Distributed mutual exclusion for certhive, built on object store leases.
//!
//! Processes that share one backing object store coordinate certificate
//! issuance and renewal by locking the logical key they are about to work
//! on. A lock is an exclusive, TTL-bounded lease on a per-key marker object;
//! the store's atomic lease primitive arbitrates between processes, and
//! lease expiry is the crash-recovery story: a holder that dies stops
//! blocking everyone else within [`LockConfig::expiration`].
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() -> certhive_store::StoreResult<()> {
//! use std::sync::Arc;
//!
//! use certhive_lock::LockManager;
//! use certhive_store::MemoryBackend;
//! use tokio_util::sync::CancellationToken;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let locks = LockManager::new(Arc::clone(&backend));
//!
//! locks.lock("certs/example.com", &CancellationToken::new()).await?;
//! // ... issue or renew under exclusive access ...
//! locks.unlock("certs/example.com").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Waiters poll rather than queue: acquisition order is not first-come,
//! first-served, and liveness is bounded by [`LockConfig::poll_interval`].

pub mod config;
pub mod manager;

pub use config::LockConfig;
pub use manager::LockManager;
