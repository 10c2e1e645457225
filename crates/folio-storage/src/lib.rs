//! Versioned, multi-language content storage for Folio.
//!
//! This crate defines where the field data of a model physically lives for a
//! given version (published `latest` or draft `changes`) and language, and
//! how content moves between those slots and between backends.
//!
//! # Architecture
//!
//! - **[`ContentStorage`]** is the contract every backend satisfies: exists,
//!   create, read, update, delete, touch, modified, and move, all keyed by
//!   `(VersionId, Language)`.
//! - **[`MemoryStorage`]** keeps entries in process memory. It backs tests,
//!   previews, and staging of drafts.
//! - **[`PlainFileStorage`]** keeps one JSON file per slot below a content
//!   root and replaces files atomically.
//! - **Moves** go through one operation regardless of backend: promoting a
//!   draft, renaming a language slot, or handing content to another
//!   backend instance.
//!
//! Backends never consult locks. Coordinating concurrent editors is the job
//! of the `folio-lock` crate, which wraps a backend.
//!
//! # Modules
//!
//! - [`error`] — Error types for storage operations
//! - [`types`] — Addressing types: [`StorageKey`], [`BackendId`]
//! - [`traits`] — The [`ContentStorage`] trait and the generic [`transfer`]
//! - [`memory`] — In-memory [`MemoryStorage`]
//! - [`plain`] — File-backed [`PlainFileStorage`]
//! - [`config`] — [`StorageConfig`] for the file backend

pub mod config;
pub mod error;
pub mod memory;
pub mod plain;
pub mod traits;
pub mod types;

pub use config::StorageConfig;
pub use error::{Result, StorageError};
pub use memory::MemoryStorage;
pub use plain::PlainFileStorage;
pub use traits::{transfer, ContentStorage};
pub use types::{BackendId, StorageKey};
