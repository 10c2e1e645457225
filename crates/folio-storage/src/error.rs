//! Error types for content storage operations.

use folio_types::{TypeError, VersionId};
use thiserror::Error;

/// Errors that can occur during content storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The operation required existing content and there is none.
    #[error("content not found: {version}/{language}")]
    NotFound { version: VersionId, language: String },

    /// Insert-only creation hit an existing entry.
    #[error("content already exists: {version}/{language}")]
    AlreadyExists { version: VersionId, language: String },

    /// The version component does not name a known version.
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// The language is not configured for the owning model's site.
    #[error("invalid language {code:?}: {reason}")]
    InvalidLanguage { code: String, reason: String },

    /// The owning model cannot be addressed by this backend.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// Encoding or decoding of stored content failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a durable backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal lock was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

impl StorageError {
    pub(crate) fn not_found(version: VersionId, language: &folio_types::Language) -> Self {
        Self::NotFound {
            version,
            language: language.code().to_string(),
        }
    }

    /// Returns `true` for [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<TypeError> for StorageError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidVersion(token) => Self::InvalidVersion(token),
            TypeError::InvalidLanguage { code, reason } => Self::InvalidLanguage { code, reason },
            other => Self::InvalidModel(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
