//! In-memory lock provider for single-process deployments and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use folio_types::{ModelId, Timestamp, UserRef};
use tracing::{debug, warn};

use crate::config::LockConfig;
use crate::error::{LockError, Result};
use crate::lock::Lock;
use crate::traits::LockProvider;

/// An in-memory implementation of [`LockProvider`].
///
/// Locks live in a `HashMap` behind a `RwLock` and are lost when the
/// provider is dropped.
#[derive(Debug)]
pub struct InMemoryLockProvider {
    locks: RwLock<HashMap<ModelId, Lock>>,
    config: LockConfig,
}

impl InMemoryLockProvider {
    /// Create a provider with the default lock duration.
    pub fn new() -> Self {
        Self::with_config(LockConfig::default())
    }

    /// Create a provider with an explicit configuration.
    pub fn with_config(config: LockConfig) -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Record a lock as-is, e.g. when restoring lock state.
    pub fn insert(&self, model: ModelId, lock: Lock) -> Result<()> {
        let mut locks = self
            .locks
            .write()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;
        locks.insert(model, lock);
        Ok(())
    }
}

impl Default for InMemoryLockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LockProvider for InMemoryLockProvider {
    fn lock(&self, model: &ModelId) -> Result<Option<Lock>> {
        let locks = self
            .locks
            .read()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;
        Ok(locks.get(model).cloned())
    }

    fn acquire(&self, model: &ModelId, user: &UserRef) -> Result<Lock> {
        let now = Timestamp::now();
        let mut locks = self
            .locks
            .write()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;

        if let Some(existing) = locks.get(model) {
            if existing.is_locked_for(user, now, self.config.duration()) {
                warn!(%model, holder = %existing.user, requested_by = %user, "draft is locked");
                return Err(LockError::Locked {
                    model: model.clone(),
                    holder: existing.user.clone(),
                    since: existing.modified,
                });
            }
        }

        let lock = Lock::new(user.clone(), now);
        locks.insert(model.clone(), lock.clone());
        debug!(%model, %user, "lock acquired");
        Ok(lock)
    }

    fn release(&self, model: &ModelId, user: &UserRef) -> Result<bool> {
        let mut locks = self
            .locks
            .write()
            .map_err(|e| LockError::Poisoned(e.to_string()))?;
        match locks.get(model) {
            Some(lock) if lock.is_held_by(user) => {
                locks.remove(model);
                debug!(%model, %user, "lock released");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn is_locked_for(&self, model: &ModelId, user: &UserRef) -> Result<bool> {
        let now = Timestamp::now();
        Ok(self
            .lock(model)?
            .is_some_and(|lock| lock.is_locked_for(user, now, self.config.duration())))
    }
}
