//! The [`ContentStorage`] trait defining the content storage contract.
//!
//! Any backend (in-memory, plain files, a cache in front of either)
//! implements this trait. Callers never branch on the backend type: a draft
//! living in memory can be promoted into a file backend through the same
//! `move_to` call that renames content inside one backend.

use std::sync::Arc;

use folio_types::{ContentModel, FieldMap, Language, Timestamp, VersionId};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::types::BackendId;

/// Storage backend for the versioned, multi-language content of one model.
///
/// Every operation is keyed by `(VersionId, Language)`. Implementations must
/// honour these invariants:
///
/// - Content exists for a key iff [`exists`](Self::exists) returns `true`.
/// - [`modified`](Self::modified) is `Some` iff the key exists.
/// - [`create`](Self::create) is create-or-replace; [`update`](Self::update)
///   replaces the whole map and never merges.
/// - [`delete`](Self::delete) of a missing key succeeds without effect.
/// - A failed write leaves the previous content intact.
///
/// Backends are lock-agnostic. Callers coordinating concurrent editors
/// consult a lock provider before invoking mutating operations.
pub trait ContentStorage: Send + Sync {
    /// Identity of this backend instance.
    fn id(&self) -> BackendId;

    /// The model that owns the stored content.
    fn model(&self) -> &ContentModel;

    /// Check whether content exists for the key. No side effects.
    fn exists(&self, version: VersionId, language: &Language) -> Result<bool>;

    /// Create (or silently replace) content and stamp a fresh modified time.
    fn create(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()>;

    /// Read the field map.
    ///
    /// Fails with [`StorageError::NotFound`] if the key does not exist.
    fn read(&self, version: VersionId, language: &Language) -> Result<FieldMap>;

    /// Replace the entire field map and refresh the modified time.
    ///
    /// Fails with [`StorageError::NotFound`] if the key does not exist.
    fn update(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()>;

    /// Delete content. Deleting a missing key is a no-op.
    fn delete(&self, version: VersionId, language: &Language) -> Result<()>;

    /// Refresh the modified time without altering content.
    ///
    /// Fails with [`StorageError::NotFound`] if the key does not exist.
    fn touch(&self, version: VersionId, language: &Language) -> Result<()>;

    /// Last modification time, or `None` if the key does not exist.
    fn modified(&self, version: VersionId, language: &Language) -> Result<Option<Timestamp>>;

    /// Move content from one key of this backend to a key of `destination`
    /// (this backend when `None`).
    ///
    /// - Same backend, same key: no-op, content stays in place.
    /// - Same backend, other key: relocation; the source key ceases to exist.
    /// - Other backend: copy into the destination, then delete the source.
    ///
    /// A missing source fails with [`StorageError::NotFound`] before
    /// anything is written.
    fn move_to(
        &self,
        from_version: VersionId,
        from_language: &Language,
        to_version: VersionId,
        to_language: &Language,
        destination: Option<&dyn ContentStorage>,
    ) -> Result<()> {
        transfer(
            self,
            from_version,
            from_language,
            to_version,
            to_language,
            destination,
            true,
        )
    }

    /// Copy content to a key of `destination` (this backend when `None`),
    /// leaving the source in place. Copying a key onto itself is a no-op.
    fn copy_to(
        &self,
        from_version: VersionId,
        from_language: &Language,
        to_version: VersionId,
        to_language: &Language,
        destination: Option<&dyn ContentStorage>,
    ) -> Result<()> {
        transfer(
            self,
            from_version,
            from_language,
            to_version,
            to_language,
            destination,
            false,
        )
    }

    /// Tolerant read: an empty map when the key does not exist.
    ///
    /// This is an explicit opt-in; [`read`](Self::read) never invents content.
    fn read_or_default(&self, version: VersionId, language: &Language) -> Result<FieldMap> {
        match self.read(version, language) {
            Err(StorageError::NotFound { .. }) => Ok(FieldMap::new()),
            other => other,
        }
    }

    /// Insert-only creation: fails with [`StorageError::AlreadyExists`] when
    /// the key is taken instead of overwriting it.
    fn create_new(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        if self.exists(version, language)? {
            return Err(StorageError::AlreadyExists {
                version,
                language: language.code().to_string(),
            });
        }
        self.create(version, language, fields)
    }

    /// Delete both versions of one language.
    fn delete_language(&self, language: &Language) -> Result<()> {
        for version in VersionId::all() {
            self.delete(version, language)?;
        }
        Ok(())
    }

    /// Returns `true` if the key exists and was modified strictly after `other`.
    fn is_modified_after(
        &self,
        version: VersionId,
        language: &Language,
        other: Timestamp,
    ) -> Result<bool> {
        Ok(self
            .modified(version, language)?
            .is_some_and(|modified| modified.is_after(&other)))
    }

    /// All existing `(version, language)` slots, in language configuration
    /// order, published version first.
    fn entries(&self) -> Result<Vec<(VersionId, Language)>> {
        let mut entries = Vec::new();
        for language in self.model().languages().iter() {
            for version in VersionId::all() {
                if self.exists(version, language)? {
                    entries.push((version, language.clone()));
                }
            }
        }
        Ok(entries)
    }
}

/// Generic move/copy built from the contract's primitives.
///
/// Backends that can relocate atomically within themselves override
/// `move_to` and delegate here only for the cross-backend case.
pub fn transfer<S>(
    source: &S,
    from_version: VersionId,
    from_language: &Language,
    to_version: VersionId,
    to_language: &Language,
    destination: Option<&dyn ContentStorage>,
    remove_source: bool,
) -> Result<()>
where
    S: ContentStorage + ?Sized,
{
    let fields = source.read(from_version, from_language)?;

    let target = destination.filter(|dest| dest.id() != source.id());
    let same_key = from_version == to_version && from_language == to_language;

    match target {
        None if same_key => return Ok(()),
        None => source.create(to_version, to_language, fields)?,
        Some(dest) => dest.create(to_version, to_language, fields)?,
    }

    if remove_source {
        source.delete(from_version, from_language)?;
    }

    debug!(
        source = %source.id(),
        destination = %target.map_or(source.id(), |dest| dest.id()),
        %from_version,
        %from_language,
        %to_version,
        %to_language,
        moved = remove_source,
        "content transferred"
    );
    Ok(())
}

/// Shared handles are backends too, so one backend can sit behind several
/// wrappers. Every call forwards to the inner backend, including its own
/// `move_to`.
impl<T> ContentStorage for Arc<T>
where
    T: ContentStorage + ?Sized,
{
    fn id(&self) -> BackendId {
        (**self).id()
    }

    fn model(&self) -> &ContentModel {
        (**self).model()
    }

    fn exists(&self, version: VersionId, language: &Language) -> Result<bool> {
        (**self).exists(version, language)
    }

    fn create(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        (**self).create(version, language, fields)
    }

    fn read(&self, version: VersionId, language: &Language) -> Result<FieldMap> {
        (**self).read(version, language)
    }

    fn update(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        (**self).update(version, language, fields)
    }

    fn delete(&self, version: VersionId, language: &Language) -> Result<()> {
        (**self).delete(version, language)
    }

    fn touch(&self, version: VersionId, language: &Language) -> Result<()> {
        (**self).touch(version, language)
    }

    fn modified(&self, version: VersionId, language: &Language) -> Result<Option<Timestamp>> {
        (**self).modified(version, language)
    }

    fn move_to(
        &self,
        from_version: VersionId,
        from_language: &Language,
        to_version: VersionId,
        to_language: &Language,
        destination: Option<&dyn ContentStorage>,
    ) -> Result<()> {
        (**self).move_to(
            from_version,
            from_language,
            to_version,
            to_language,
            destination,
        )
    }
}
