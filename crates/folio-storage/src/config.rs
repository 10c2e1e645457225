use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for [`PlainFileStorage`](crate::PlainFileStorage).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Content root; each model gets a directory below it.
    pub root: PathBuf,
    /// Base name of content files (`content` → `content.en.json`).
    pub filename: String,
    /// File extension of content files.
    pub extension: String,
    /// Directory holding draft content inside a model directory.
    pub changes_dir: String,
    /// `fsync` every content file before it replaces the previous one.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("content"),
            filename: "content".into(),
            extension: "json".into(),
            changes_dir: "_changes".into(),
            sync_writes: false,
        }
    }
}

impl StorageConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}
