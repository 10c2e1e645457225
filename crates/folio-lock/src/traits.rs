//! The [`LockProvider`] trait defining the draft locking interface.

use folio_types::{ModelId, UserRef};

use crate::error::Result;
use crate::lock::Lock;

/// Source of truth for which user holds each model's draft.
///
/// Implementations must make `acquire` atomic: two users racing for the
/// same model never both succeed while the first lock is active.
pub trait LockProvider: Send + Sync {
    /// The current lock on a model, active or not.
    ///
    /// Returns `Ok(None)` if nobody ever acquired it or it was released.
    fn lock(&self, model: &ModelId) -> Result<Option<Lock>>;

    /// Acquire or refresh the lock for `user`.
    ///
    /// Fails with [`LockError::Locked`](crate::LockError::Locked) when another
    /// user holds an active lock. An expired lock is taken over.
    fn acquire(&self, model: &ModelId, user: &UserRef) -> Result<Lock>;

    /// Release the lock if `user` holds it.
    ///
    /// Returns `Ok(true)` if a lock was released, `Ok(false)` if there was
    /// none or it belongs to somebody else.
    fn release(&self, model: &ModelId, user: &UserRef) -> Result<bool>;

    /// Returns `true` if another user currently blocks `user` from editing.
    fn is_locked_for(&self, model: &ModelId, user: &UserRef) -> Result<bool>;
}

impl<T> LockProvider for std::sync::Arc<T>
where
    T: LockProvider + ?Sized,
{
    fn lock(&self, model: &ModelId) -> Result<Option<Lock>> {
        (**self).lock(model)
    }

    fn acquire(&self, model: &ModelId, user: &UserRef) -> Result<Lock> {
        (**self).acquire(model, user)
    }

    fn release(&self, model: &ModelId, user: &UserRef) -> Result<bool> {
        (**self).release(model, user)
    }

    fn is_locked_for(&self, model: &ModelId, user: &UserRef) -> Result<bool> {
        (**self).is_locked_for(model, user)
    }
}
