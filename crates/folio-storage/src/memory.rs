//! In-memory content storage for ephemeral content and tests.
//!
//! [`MemoryStorage`] stores every `(version, language)` entry in a `HashMap`
//! protected by a `RwLock`. It implements the full [`ContentStorage`] trait
//! and is suitable for unit tests, previews, and as a staging layer in front
//! of a durable backend.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use folio_types::{ContentModel, FieldMap, Language, Timestamp, VersionId};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::traits::{transfer, ContentStorage};
use crate::types::{BackendId, StorageKey};

/// A stored field map together with its modification stamp.
#[derive(Clone, Debug)]
struct Entry {
    fields: FieldMap,
    modified: Timestamp,
}

impl Entry {
    fn new(fields: FieldMap) -> Self {
        Self {
            fields,
            modified: Timestamp::now(),
        }
    }
}

/// An in-memory implementation of [`ContentStorage`].
///
/// All data lives in a `HashMap` behind a `RwLock` and is lost when the
/// storage is dropped. The owning [`ContentModel`] is consulted only to
/// reject languages the site does not configure.
///
/// Entries are cloned on read and on cross-instance moves, so mutating one
/// instance never affects another.
pub struct MemoryStorage {
    id: BackendId,
    model: ContentModel,
    entries: RwLock<HashMap<StorageKey, Entry>>,
}

impl MemoryStorage {
    /// Create an empty storage for the given model.
    pub fn new(model: ContentModel) -> Self {
        Self {
            id: BackendId::new(),
            model,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_entries()?.len())
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read_entries()?.is_empty())
    }

    /// Sorted list of all stored keys.
    pub fn keys(&self) -> Result<Vec<StorageKey>> {
        let mut keys: Vec<StorageKey> = self.read_entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        self.write_entries()?.clear();
        Ok(())
    }

    fn key(&self, version: VersionId, language: &Language) -> Result<StorageKey> {
        self.model.languages().validate(language)?;
        Ok(StorageKey::new(version, language))
    }

    fn read_entries(&self) -> Result<RwLockReadGuard<'_, HashMap<StorageKey, Entry>>> {
        self.entries
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    fn write_entries(&self) -> Result<RwLockWriteGuard<'_, HashMap<StorageKey, Entry>>> {
        self.entries
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }
}

impl ContentStorage for MemoryStorage {
    fn id(&self) -> BackendId {
        self.id
    }

    fn model(&self) -> &ContentModel {
        &self.model
    }

    fn exists(&self, version: VersionId, language: &Language) -> Result<bool> {
        let key = self.key(version, language)?;
        Ok(self.read_entries()?.contains_key(&key))
    }

    fn create(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        let key = self.key(version, language)?;
        debug!(model = %self.model.id(), %key, fields = fields.len(), "memory create");
        self.write_entries()?.insert(key, Entry::new(fields));
        Ok(())
    }

    fn read(&self, version: VersionId, language: &Language) -> Result<FieldMap> {
        let key = self.key(version, language)?;
        self.read_entries()?
            .get(&key)
            .map(|entry| entry.fields.clone())
            .ok_or_else(|| StorageError::not_found(version, language))
    }

    fn update(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        let key = self.key(version, language)?;
        let mut entries = self.write_entries()?;
        let entry = entries
            .get_mut(&key)
            .ok_or_else(|| StorageError::not_found(version, language))?;
        debug!(model = %self.model.id(), %key, fields = fields.len(), "memory update");
        *entry = Entry::new(fields);
        Ok(())
    }

    fn delete(&self, version: VersionId, language: &Language) -> Result<()> {
        let key = self.key(version, language)?;
        if self.write_entries()?.remove(&key).is_some() {
            debug!(model = %self.model.id(), %key, "memory delete");
        }
        Ok(())
    }

    fn touch(&self, version: VersionId, language: &Language) -> Result<()> {
        let key = self.key(version, language)?;
        let mut entries = self.write_entries()?;
        let entry = entries
            .get_mut(&key)
            .ok_or_else(|| StorageError::not_found(version, language))?;
        entry.modified = Timestamp::now();
        Ok(())
    }

    fn modified(&self, version: VersionId, language: &Language) -> Result<Option<Timestamp>> {
        let key = self.key(version, language)?;
        Ok(self.read_entries()?.get(&key).map(|entry| entry.modified))
    }

    fn move_to(
        &self,
        from_version: VersionId,
        from_language: &Language,
        to_version: VersionId,
        to_language: &Language,
        destination: Option<&dyn ContentStorage>,
    ) -> Result<()> {
        if let Some(dest) = destination.filter(|dest| dest.id() != self.id) {
            return transfer(
                self,
                from_version,
                from_language,
                to_version,
                to_language,
                Some(dest),
                true,
            );
        }

        let from = self.key(from_version, from_language)?;
        let to = self.key(to_version, to_language)?;

        // Relocation within one instance happens in a single critical section.
        let mut entries = self.write_entries()?;
        if !entries.contains_key(&from) {
            return Err(StorageError::not_found(from_version, from_language));
        }
        if from == to {
            return Ok(());
        }
        if let Some(entry) = entries.remove(&from) {
            entries.insert(to.clone(), Entry::new(entry.fields));
        }
        debug!(model = %self.model.id(), %from, %to, "memory relocate");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage")
            .field("id", &self.id)
            .field("model", self.model.id())
            .field("entry_count", &count)
            .finish()
    }
}
