//! Lock-guarded content storage.
//!
//! [`GuardedStorage`] wraps any [`ContentStorage`] with a [`LockProvider`]
//! and the acting user. Every draft mutation acquires (or refreshes) the
//! user's lock on the model first; a draft held by somebody else is never
//! handed to the backend. Published content stays freely readable.

use folio_storage::ContentStorage;
use folio_types::{FieldMap, Language, ModelId, Timestamp, UserRef, VersionId};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::lock::Lock;
use crate::traits::LockProvider;

/// A content backend whose draft writes are serialised through a lock.
pub struct GuardedStorage<S, P> {
    storage: S,
    locks: P,
    user: UserRef,
}

impl<S, P> GuardedStorage<S, P>
where
    S: ContentStorage,
    P: LockProvider,
{
    /// Act as `user` on `storage`, coordinating through `locks`.
    pub fn new(storage: S, locks: P, user: UserRef) -> Self {
        Self {
            storage,
            locks,
            user,
        }
    }

    /// The wrapped backend, for unguarded reads.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The lock provider.
    pub fn locks(&self) -> &P {
        &self.locks
    }

    /// The acting user.
    pub fn user(&self) -> &UserRef {
        &self.user
    }

    /// The model whose draft the lock covers.
    pub fn model_id(&self) -> &ModelId {
        self.storage.model().id()
    }

    /// The current lock on the model, active or not.
    pub fn lock(&self) -> Result<Option<Lock>> {
        self.locks.lock(self.model_id())
    }

    /// Returns `true` if another user currently holds the draft.
    pub fn is_locked(&self) -> Result<bool> {
        self.locks.is_locked_for(self.model_id(), &self.user)
    }

    /// Whether content exists. Not guarded.
    pub fn exists(&self, version: VersionId, language: &Language) -> Result<bool> {
        Ok(self.storage.exists(version, language)?)
    }

    /// Read the fields of a version and language. Not guarded.
    pub fn read(&self, version: VersionId, language: &Language) -> Result<FieldMap> {
        Ok(self.storage.read(version, language)?)
    }

    /// Last modification time, `None` when absent. Not guarded.
    pub fn modified(&self, version: VersionId, language: &Language) -> Result<Option<Timestamp>> {
        Ok(self.storage.modified(version, language)?)
    }

    /// Create or replace content, locking first when it is a draft.
    pub fn create(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        self.guarded(&[version], || Ok(self.storage.create(version, language, fields)?))
    }

    /// Insert-only creation; fails with `AlreadyExists` when the key is taken.
    pub fn create_new(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        self.guarded(&[version], || {
            Ok(self.storage.create_new(version, language, fields)?)
        })
    }

    /// Replace existing content, locking first when it is a draft.
    pub fn update(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        self.guarded(&[version], || Ok(self.storage.update(version, language, fields)?))
    }

    /// Refresh the modification time, locking first when it is a draft.
    pub fn touch(&self, version: VersionId, language: &Language) -> Result<()> {
        self.guarded(&[version], || Ok(self.storage.touch(version, language)?))
    }

    /// Delete content. Removing the last draft releases the lock.
    pub fn delete(&self, version: VersionId, language: &Language) -> Result<()> {
        self.guarded(&[version], || {
            self.storage.delete(version, language)?;
            if version.is_changes() {
                self.release_if_clean()?;
            }
            Ok(())
        })
    }

    /// Move content, locking first when either side is a draft.
    ///
    /// Moving the last draft away releases the lock.
    pub fn move_to(
        &self,
        from_version: VersionId,
        from_language: &Language,
        to_version: VersionId,
        to_language: &Language,
        destination: Option<&dyn ContentStorage>,
    ) -> Result<()> {
        self.guarded(&[from_version, to_version], || {
            self.storage.move_to(
                from_version,
                from_language,
                to_version,
                to_language,
                destination,
            )?;
            if from_version.is_changes() {
                self.release_if_clean()?;
            }
            Ok(())
        })
    }

    /// Copy content, locking first when the target is a draft, in this
    /// backend or in `destination`.
    pub fn copy_to(
        &self,
        from_version: VersionId,
        from_language: &Language,
        to_version: VersionId,
        to_language: &Language,
        destination: Option<&dyn ContentStorage>,
    ) -> Result<()> {
        self.guarded(&[to_version], || {
            Ok(self.storage.copy_to(
                from_version,
                from_language,
                to_version,
                to_language,
                destination,
            )?)
        })
    }

    /// Start a draft from the published content of `language`.
    ///
    /// An existing draft is left untouched.
    pub fn checkout(&self, language: &Language) -> Result<()> {
        self.guarded(&[VersionId::Changes], || {
            if self.storage.exists(VersionId::Changes, language)? {
                return Ok(());
            }
            let fields = self.storage.read_or_default(VersionId::Latest, language)?;
            Ok(self.storage.create(VersionId::Changes, language, fields)?)
        })
    }

    /// Promote the draft of `language` to the published version.
    ///
    /// Fails with `NotFound` when there is no draft. The lock is released
    /// once no language has a draft left.
    pub fn publish(&self, language: &Language) -> Result<()> {
        self.guarded(&[VersionId::Changes], || {
            self.storage.move_to(
                VersionId::Changes,
                language,
                VersionId::Latest,
                language,
                None,
            )?;
            info!(model = %self.model_id(), language = %language, user = %self.user, "draft published");
            self.release_if_clean()
        })
    }

    /// Throw away the draft of `language`.
    pub fn discard(&self, language: &Language) -> Result<()> {
        self.guarded(&[VersionId::Changes], || {
            self.storage.delete(VersionId::Changes, language)?;
            debug!(model = %self.model_id(), language = %language, user = %self.user, "draft discarded");
            self.release_if_clean()
        })
    }

    /// Run `op` under the user's lock when any of `versions` is a draft.
    ///
    /// A lock taken by this call is given back when `op` fails and no draft
    /// is left.
    fn guarded<T>(&self, versions: &[VersionId], op: impl FnOnce() -> Result<T>) -> Result<T> {
        if !versions.iter().any(|version| version.is_changes()) {
            return op();
        }
        let held = self.lock()?.is_some_and(|lock| lock.is_held_by(&self.user));
        self.locks.acquire(self.model_id(), &self.user)?;

        match op() {
            Err(err) if !held => {
                if let Err(release) = self.release_if_clean() {
                    warn!(model = %self.model_id(), user = %self.user, error = %release, "lock kept after failed draft operation");
                }
                Err(err)
            }
            result => result,
        }
    }

    fn release_if_clean(&self) -> Result<()> {
        let drafts = self
            .storage
            .entries()?
            .into_iter()
            .any(|(version, _)| version.is_changes());
        if !drafts {
            self.locks.release(self.model_id(), &self.user)?;
        }
        Ok(())
    }
}

impl<S, P> std::fmt::Debug for GuardedStorage<S, P>
where
    S: ContentStorage,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedStorage")
            .field("backend", &self.storage.id())
            .field("model", self.storage.model().id())
            .field("user", &self.user)
            .finish()
    }
}
