//! Foundation types for Folio content storage.
//!
//! Every editable object (page, file, user, site) owns content addressed in
//! a two-dimensional keyspace: a [`VersionId`] (published `latest` or draft
//! `changes`) and a [`Language`]. This crate defines those address
//! components together with the value types that flow through every storage
//! backend. Every other Folio crate depends on `folio-types`.
//!
//! # Key Types
//!
//! - [`VersionId`] — Closed set of content states: `latest` and `changes`
//! - [`Language`] — A configured content language or the single-language sentinel
//! - [`LanguageRegistry`] — The site's configured languages, used for key validation
//! - [`FieldMap`] — Insertion-ordered map of raw field values
//! - [`Timestamp`] — Wall-clock modification stamp
//! - [`ModelId`] / [`ContentModel`] — Identity of the model that owns the content
//! - [`UserRef`] — Reference to the actor holding a draft lock

pub mod error;
pub mod fields;
pub mod identity;
pub mod language;
pub mod temporal;
pub mod version;

pub use error::TypeError;
pub use fields::{FieldMap, FieldValue};
pub use identity::{ContentModel, ModelId, UserRef};
pub use language::{Language, LanguageRegistry};
pub use temporal::Timestamp;
pub use version::VersionId;
