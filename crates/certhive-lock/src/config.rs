use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the lease-based lock manager.
///
/// Both values are process-wide: they are read when a lock attempt starts
/// and are not re-read during its lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lease TTL. A holder that never unlocks stops blocking everyone else
    /// once this much time has passed; this is the sole crash-recovery
    /// mechanism, and leases are never renewed or extended.
    pub expiration: Duration,
    /// Wait between acquisition attempts while another holder's lease is
    /// live. Bounds how quickly a waiter notices a released or lapsed lease.
    pub poll_interval: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            expiration: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}
