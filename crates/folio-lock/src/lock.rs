use std::time::Duration;

use folio_types::{Timestamp, UserRef};
use serde::{Deserialize, Serialize};

/// Records that a model's draft is checked out by `user`, last refreshed at
/// `modified`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// The user holding the draft.
    pub user: UserRef,
    /// When the lock was acquired or last refreshed.
    pub modified: Timestamp,
}

impl Lock {
    /// A lock held by `user` as of `modified`.
    pub fn new(user: UserRef, modified: Timestamp) -> Self {
        Self { user, modified }
    }

    /// Returns `true` if the lock was refreshed less than `duration` before `now`.
    pub fn is_active(&self, now: Timestamp, duration: Duration) -> bool {
        self.modified.elapsed_until(&now) < duration
    }

    /// Returns `true` if `user` is the holder.
    pub fn is_held_by(&self, user: &UserRef) -> bool {
        &self.user == user
    }

    /// Returns `true` if the lock keeps `user` from editing at `now`.
    pub fn is_locked_for(&self, user: &UserRef, now: Timestamp, duration: Duration) -> bool {
        !self.is_held_by(user) && self.is_active(now, duration)
    }
}
