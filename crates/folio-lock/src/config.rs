use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for draft locks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Seconds a lock stays active after its last refresh. An inactive lock
    /// can be taken over by another user.
    pub duration_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10 * 60,
        }
    }
}

impl LockConfig {
    /// Configuration with an explicit lock duration.
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration_secs: duration.as_secs(),
        }
    }

    /// How long a lock stays active.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
