use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only metadata projection of a stored object, produced by `stat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// The object's key.
    pub key: String,
    /// When the object was last written.
    pub modified: DateTime<Utc>,
    /// Value length in bytes.
    pub size: u64,
    /// `true` for every real object: the namespace is flat, and key prefixes
    /// group objects by convention only.
    pub is_terminal: bool,
}

/// Opaque handle for a granted lease, assigned by the backend.
///
/// The holder presents it back on release; it carries no other meaning.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(Uuid);

impl LeaseId {
    /// Mint a fresh id. Backends call this when granting a lease.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for LeaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a create-only write.
///
/// Finding the key occupied is an expected result of racing creators, not an
/// error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The object was created by this call.
    Created,
    /// The key was already occupied; nothing was written.
    AlreadyExists,
}

/// One page of the backend's flat key enumeration.
#[derive(Clone, Debug, Default)]
pub struct ListPage {
    /// Keys in the backend's native enumeration order.
    pub keys: Vec<String>,
    /// Opaque cursor for the following page; `None` on the final page.
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_ids_are_unique() {
        let a = LeaseId::new();
        let b = LeaseId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn lease_id_display_is_nonempty() {
        assert!(!LeaseId::new().to_string().is_empty());
    }
}
