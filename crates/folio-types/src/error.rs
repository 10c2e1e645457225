use thiserror::Error;

/// Errors produced by type construction and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version: {0:?} (expected \"latest\" or \"changes\")")]
    InvalidVersion(String),

    #[error("invalid language {code:?}: {reason}")]
    InvalidLanguage { code: String, reason: String },

    #[error("invalid model id {id:?}: {reason}")]
    InvalidModelId { id: String, reason: String },

    #[error("invalid user reference: {0:?}")]
    InvalidUser(String),
}
