use std::error::Error as StdError;

/// Errors from object store operations.
///
/// Backends normalize their native failure responses into these kinds, so
/// callers branch on structure instead of matching message text. Every
/// "not found" response collapses to [`StoreError::NotFound`], every lease
/// conflict to [`StoreError::AlreadyLeased`]; anything else becomes
/// [`StoreError::Io`] with the operation name and key attached.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key has no live object.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// A live lease is already held on the object by someone else.
    #[error("lease already held on {key}")]
    AlreadyLeased { key: String },

    /// A create-only write found the key occupied.
    #[error("key already exists: {key}")]
    AlreadyExists { key: String },

    /// A blocking wait was aborted by the caller's cancellation signal.
    #[error("canceled while waiting on {key}")]
    Canceled { key: String },

    /// Any other backend failure, wrapped with operation and key context.
    #[error("{op} {key}: {source}")]
    Io {
        op: &'static str,
        key: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl StoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn already_leased(key: impl Into<String>) -> Self {
        Self::AlreadyLeased { key: key.into() }
    }

    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    pub fn canceled(key: impl Into<String>) -> Self {
        Self::Canceled { key: key.into() }
    }

    pub fn io(
        op: &'static str,
        key: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Io {
            op,
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for the "key absent" kind, distinct from any I/O failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for the lease-conflict kind.
    pub fn is_already_leased(&self) -> bool {
        matches!(self, Self::AlreadyLeased { .. })
    }

    /// Returns `true` when a blocking wait was aborted by its caller.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
