//! Draft locking for Folio content.
//!
//! Storage backends are lock-agnostic. This crate adds the coordination
//! layer: a [`Lock`] records which user has checked out a model's draft,
//! a [`LockProvider`] hands those locks out, and [`GuardedStorage`]
//! composes a backend with a provider so draft writes by a second user are
//! rejected before the backend sees them.
//!
//! # Quick Start
//!
//! ```rust
//! use folio_lock::{GuardedStorage, InMemoryLockProvider};
//! use folio_storage::MemoryStorage;
//! use folio_types::{ContentModel, FieldMap, Language, ModelId, UserRef, VersionId};
//!
//! let model = ContentModel::single_language(ModelId::new("pages/about").unwrap());
//! let user = UserRef::new("editor@example.com").unwrap();
//! let guarded = GuardedStorage::new(MemoryStorage::new(model), InMemoryLockProvider::new(), user);
//!
//! let lang = Language::single();
//! guarded
//!     .create(VersionId::Changes, &lang, FieldMap::new().with("title", "About"))
//!     .unwrap();
//! guarded.publish(&lang).unwrap();
//! assert!(guarded.lock().unwrap().is_none());
//! ```

pub mod config;
pub mod error;
pub mod guarded;
pub mod lock;
pub mod memory;
pub mod traits;

pub use config::LockConfig;
pub use error::{LockError, Result};
pub use guarded::GuardedStorage;
pub use lock::Lock;
pub use memory::InMemoryLockProvider;
pub use traits::LockProvider;
