//! Key-addressed byte storage for shared certificate material.
//!
//! This crate defines the storage contract certhive coordinates around: a
//! flat namespace of named byte objects in one backing object store shared
//! by every cooperating process. Certificate and account material is written
//! and read whole and listed by key prefix; nothing is cached client-side.
//!
//! # Contract
//!
//! [`Storage`] is the host-facing surface:
//!
//! - `store` / `load` — whole-value overwrite and read; an absent key is
//!   [`StoreError::NotFound`], structurally distinct from I/O failure
//! - `delete` — idempotent; deleting an absent key succeeds
//! - `exists` — boolean probe that folds every failure to `false`
//! - `stat` — [`KeyInfo`] metadata with the same `NotFound` discipline as
//!   `load`
//! - `list` — prefix-filtered, optionally recursive enumeration over the
//!   backend's internal pagination
//!
//! # Backends
//!
//! The backing store sits behind the [`ObjectBackend`] trait, which also
//! carries the atomic lease primitive the `certhive-lock` crate builds its
//! distributed mutex on:
//!
//! - [`MemoryBackend`] — `BTreeMap`-based backend for tests and embedding
//!
//! # Design Rules
//!
//! 1. Writes replace the object whole; readers never see a partial write.
//! 2. The store never interprets values; it is a pure key-value store.
//! 3. The backing store is the only source of cross-process truth; nothing
//!    is cached above it.
//! 4. Backend errors are normalized into the canonical [`StoreError`] kinds,
//!    never matched by message text.

pub mod backend;
pub mod error;
pub mod memory;
pub mod storage;
pub mod types;

// Re-export primary types at crate root for ergonomic imports.
pub use backend::ObjectBackend;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use storage::Storage;
pub use types::{CreateOutcome, KeyInfo, LeaseId, ListPage};
