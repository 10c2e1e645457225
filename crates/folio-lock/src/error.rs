use folio_storage::StorageError;
use folio_types::{ModelId, Timestamp, UserRef};

/// Errors that can occur while coordinating draft edits.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another user holds an active lock on the model's draft.
    #[error("{model} is locked by {holder} since {since}")]
    Locked {
        model: ModelId,
        holder: UserRef,
        since: Timestamp,
    },

    /// The guarded storage operation itself failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The lock table was poisoned by a panicking writer.
    #[error("lock table poisoned: {0}")]
    Poisoned(String),
}

impl LockError {
    /// Returns `true` for [`LockError::Locked`].
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// Convenience alias used throughout the lock crate.
pub type Result<T> = std::result::Result<T, LockError>;
