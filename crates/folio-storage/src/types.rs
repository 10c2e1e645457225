//! Addressing types shared by every storage backend.

use std::fmt;

use folio_types::{Language, VersionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Composite address of one field map inside a backend:
/// `(VersionId, language code)`.
///
/// At most one field map exists per key per backend instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey {
    /// Which content state is addressed.
    pub version: VersionId,
    /// The language code (storage holds codes, never languages).
    pub language: String,
}

impl StorageKey {
    /// Build a key from a version and a language.
    pub fn new(version: VersionId, language: &Language) -> Self {
        Self {
            version,
            language: language.code().to_string(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.version, self.language)
    }
}

/// Identity of a backend instance.
///
/// Two handles with equal ids are the same instance. `move_to` uses this to
/// tell relocation inside one backend from a transfer between backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BackendId(Uuid);

impl BackendId {
    /// Allocate a fresh, unique id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Stable id for a backend addressed by a location. Every handle on the
    /// same location gets the same id.
    pub fn from_location(location: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, location.as_bytes()))
    }
}

impl Default for BackendId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
