use std::path::{Path, PathBuf};

use anyhow::Context;
use folio_lock::LockConfig;
use folio_storage::StorageConfig;
use folio_types::{ContentModel, LanguageRegistry, ModelId};
use serde::{Deserialize, Serialize};

/// Settings read from `folio.toml`. Every section is optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub storage: StorageConfig,
    pub lock: LockConfig,
    /// Configured content languages; a single-language site when absent.
    pub languages: Option<LanguageRegistry>,
    /// Acting user when `--user` is not given.
    pub user: Option<String>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            lock: LockConfig::default(),
            languages: None,
            user: None,
        }
    }
}

impl FolioConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.storage.root = root;
        }
        self
    }

    pub fn registry(&self) -> LanguageRegistry {
        self.languages.clone().unwrap_or_else(LanguageRegistry::single)
    }

    /// The content model addressed by a model path on the command line.
    pub fn model(&self, id: &str) -> anyhow::Result<ContentModel> {
        let id = ModelId::new(id).with_context(|| format!("invalid model '{id}'"))?;
        Ok(ContentModel::new(id, self.registry()))
    }
}
