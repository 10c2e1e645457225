//! Durable content storage in plain files.
//!
//! One file per `(model, version, language)` triple:
//!
//! ```text
//! <root>/<model>/content.json              latest, single-language site
//! <root>/<model>/content.en.json           latest, language "en"
//! <root>/<model>/_changes/content.en.json  changes, language "en"
//! ```
//!
//! Files hold a pretty-printed JSON object in field order. Writes go to a
//! temporary file in the target directory and are renamed over the target,
//! so a failed write never leaves a half-written file behind.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use folio_types::{ContentModel, FieldMap, Language, Timestamp, VersionId};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::traits::{transfer, ContentStorage};
use crate::types::BackendId;

/// A file-backed implementation of [`ContentStorage`].
///
/// Thread-safety comes from the filesystem: every write is a single atomic
/// rename. Concurrent editors of the same draft must still be serialised
/// through the lock subsystem.
///
/// The backend identity is derived from the model directory and file
/// layout, so separate handles on the same directory are one instance and
/// moves between them are plain renames.
#[derive(Debug)]
pub struct PlainFileStorage {
    model: ContentModel,
    config: StorageConfig,
}

impl PlainFileStorage {
    /// Storage for `model` under `root` with the default layout.
    pub fn new(root: impl Into<PathBuf>, model: ContentModel) -> Self {
        Self::with_config(StorageConfig::with_root(root), model)
    }

    /// Storage for `model` with an explicit configuration.
    pub fn with_config(config: StorageConfig, model: ContentModel) -> Self {
        Self { model, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Directory holding the model's published content.
    pub fn model_dir(&self) -> PathBuf {
        let mut dir = self.config.root.clone();
        for component in self.model.id().components() {
            dir.push(component);
        }
        dir
    }

    /// Directory holding content of one version.
    pub fn version_dir(&self, version: VersionId) -> PathBuf {
        match version {
            VersionId::Latest => self.model_dir(),
            VersionId::Changes => self.model_dir().join(&self.config.changes_dir),
        }
    }

    /// Path of the content file for a key. The language is validated first
    /// and the file name follows the configured language, not the flags of
    /// the argument.
    pub fn content_file(&self, version: VersionId, language: &Language) -> Result<PathBuf> {
        let language = self.model.languages().configured(language)?;
        let name = if language.is_single() {
            format!("{}.{}", self.config.filename, self.config.extension)
        } else {
            format!(
                "{}.{}.{}",
                self.config.filename,
                language.code(),
                self.config.extension
            )
        };
        Ok(self.version_dir(version).join(name))
    }

    fn location_id(&self) -> BackendId {
        let root = fs::canonicalize(&self.config.root)
            .or_else(|_| std::path::absolute(&self.config.root))
            .unwrap_or_else(|_| self.config.root.clone());
        BackendId::from_location(&format!(
            "file://{}/{}#{}/{}.{}",
            root.display(),
            self.model.id(),
            self.config.changes_dir,
            self.config.filename,
            self.config.extension
        ))
    }

    /// Serialise and atomically replace the content file.
    fn write_file(&self, path: &Path, fields: &FieldMap) -> Result<()> {
        let mut encoded = serde_json::to_vec_pretty(fields)?;
        encoded.push(b'\n');
        self.replace_file(path, |file| file.write_all(&encoded))?;

        debug!(path = %path.display(), fields = fields.len(), "content file written");
        Ok(())
    }

    /// Replace `path` with what `fill` writes into a temporary sibling file.
    ///
    /// The previous file is only swapped out after `fill` succeeded.
    fn replace_file(&self, path: &Path, fill: impl FnOnce(&mut File) -> io::Result<()>) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| StorageError::InvalidModel(path.display().to_string()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        fill(tmp.as_file_mut())?;
        tmp.as_file_mut().flush()?;
        if self.config.sync_writes {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    /// Remove the drafts directory once its last file is gone.
    fn prune_changes_dir(&self) -> Result<()> {
        let dir = self.version_dir(VersionId::Changes);
        match fs::read_dir(&dir) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    fs::remove_dir(&dir)?;
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ContentStorage for PlainFileStorage {
    fn id(&self) -> BackendId {
        self.location_id()
    }

    fn model(&self) -> &ContentModel {
        &self.model
    }

    fn exists(&self, version: VersionId, language: &Language) -> Result<bool> {
        Ok(self.content_file(version, language)?.is_file())
    }

    fn create(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        let path = self.content_file(version, language)?;
        self.write_file(&path, &fields)
    }

    fn read(&self, version: VersionId, language: &Language) -> Result<FieldMap> {
        let path = self.content_file(version, language)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(version, language));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path = %path.display(), error = %e, "unreadable content file");
            StorageError::Serialization(format!("{}: {e}", path.display()))
        })
    }

    fn update(&self, version: VersionId, language: &Language, fields: FieldMap) -> Result<()> {
        let path = self.content_file(version, language)?;
        if !path.is_file() {
            return Err(StorageError::not_found(version, language));
        }
        self.write_file(&path, &fields)
    }

    fn delete(&self, version: VersionId, language: &Language) -> Result<()> {
        let path = self.content_file(version, language)?;
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "content file deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if version.is_changes() {
            self.prune_changes_dir()?;
        }
        Ok(())
    }

    fn touch(&self, version: VersionId, language: &Language) -> Result<()> {
        let path = self.content_file(version, language)?;
        let file = match File::options().write(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(version, language));
            }
            Err(e) => return Err(e.into()),
        };
        file.set_modified(SystemTime::now())?;
        Ok(())
    }

    fn modified(&self, version: VersionId, language: &Language) -> Result<Option<Timestamp>> {
        let path = self.content_file(version, language)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(Timestamp::from(meta.modified()?))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn move_to(
        &self,
        from_version: VersionId,
        from_language: &Language,
        to_version: VersionId,
        to_language: &Language,
        destination: Option<&dyn ContentStorage>,
    ) -> Result<()> {
        let id = self.id();
        if let Some(dest) = destination.filter(|dest| dest.id() != id) {
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

        let from = self.content_file(from_version, from_language)?;
        let to = self.content_file(to_version, to_language)?;
        if !from.is_file() {
            return Err(StorageError::not_found(from_version, from_language));
        }
        if from == to {
            return Ok(());
        }

        if let Some(dir) = to.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::rename(&from, &to)?;
        File::options()
            .write(true)
            .open(&to)?
            .set_modified(SystemTime::now())?;

        if from_version.is_changes() {
            self.prune_changes_dir()?;
        }
        debug!(from = %from.display(), to = %to.display(), "content file relocated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use folio_types::{LanguageRegistry, ModelId};
    use proptest::prelude::*;

    fn en() -> Language {
        Language::new("en", "English").unwrap().as_default()
    }

    fn de() -> Language {
        Language::new("de", "Deutsch").unwrap()
    }

    fn multi_language_model() -> ContentModel {
        ContentModel::new(
            ModelId::new("blog/hello").unwrap(),
            LanguageRegistry::multi(vec![en(), de()]).unwrap(),
        )
    }

    fn single_language_model() -> ContentModel {
        ContentModel::single_language(ModelId::new("blog/hello").unwrap())
    }

    fn title_and_text() -> FieldMap {
        FieldMap::new().with("title", "Foo").with("text", "Bar")
    }

    #[test]
    fn layout_follows_version_and_language() {
        let dir = tempfile::tempdir().unwrap();
        let multi = PlainFileStorage::new(dir.path(), multi_language_model());
        let single = PlainFileStorage::new(dir.path(), single_language_model());
        let base = dir.path().join("blog").join("hello");

        assert_eq!(
            multi.content_file(VersionId::latest(), &en()).unwrap(),
            base.join("content.en.json")
        );
        assert_eq!(
            multi.content_file(VersionId::changes(), &de()).unwrap(),
            base.join("_changes").join("content.de.json")
        );
        assert_eq!(
            single
                .content_file(VersionId::latest(), &Language::single())
                .unwrap(),
            base.join("content.json")
        );
    }

    #[test]
    fn create_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        for version in VersionId::all() {
            storage.create(version, &en(), title_and_text()).unwrap();
            assert!(storage.exists(version, &en()).unwrap());
            assert_eq!(storage.read(version, &en()).unwrap(), title_and_text());
        }
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), single_language_model());
        let err = storage
            .read(VersionId::changes(), &Language::single())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), single_language_model());
        let path = storage
            .content_file(VersionId::latest(), &Language::single())
            .unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let err = storage
            .read(VersionId::latest(), &Language::single())
            .unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn update_replaces_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        storage
            .create(VersionId::latest(), &en(), FieldMap::new())
            .unwrap();
        storage
            .update(VersionId::latest(), &en(), FieldMap::new().with("title", "Foo"))
            .unwrap();
        assert_eq!(
            storage.read(VersionId::latest(), &en()).unwrap(),
            FieldMap::new().with("title", "Foo")
        );
    }

    #[test]
    fn update_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        let err = storage
            .update(VersionId::latest(), &de(), title_and_text())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!storage.exists(VersionId::latest(), &de()).unwrap());
    }

    #[test]
    fn failed_overwrite_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), single_language_model());
        let language = Language::single();
        storage
            .create(VersionId::latest(), &language, title_and_text())
            .unwrap();
        let path = storage
            .content_file(VersionId::latest(), &language)
            .unwrap();

        let err = storage
            .replace_file(&path, |file| {
                file.write_all(br#"{"title": "Half"#)?;
                Err(io::Error::other("disk full"))
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));

        assert_eq!(
            storage.read(VersionId::latest(), &language).unwrap(),
            title_and_text()
        );
        let leftovers: Vec<_> = fs::read_dir(storage.model_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != path)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn failed_draft_write_leaves_published_content() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), single_language_model());
        let language = Language::single();
        storage
            .create(VersionId::latest(), &language, title_and_text())
            .unwrap();

        // Occupy the drafts directory path with a file so the write cannot
        // create its temporary file.
        let changes_dir = storage.version_dir(VersionId::changes());
        fs::write(&changes_dir, "blocker").unwrap();
        assert!(storage
            .create(VersionId::changes(), &language, FieldMap::new())
            .is_err());

        assert_eq!(
            storage.read(VersionId::latest(), &language).unwrap(),
            title_and_text()
        );
        let leftovers: Vec<_> = fs::read_dir(storage.model_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn delete_is_idempotent_and_prunes_drafts_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        storage
            .create(VersionId::changes(), &en(), title_and_text())
            .unwrap();
        assert!(storage.version_dir(VersionId::changes()).is_dir());

        storage.delete(VersionId::changes(), &en()).unwrap();
        storage.delete(VersionId::changes(), &en()).unwrap();
        assert!(!storage.exists(VersionId::changes(), &en()).unwrap());
        assert!(!storage.version_dir(VersionId::changes()).exists());
    }

    #[test]
    fn delete_keeps_drafts_dir_with_other_languages() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        storage
            .create(VersionId::changes(), &en(), FieldMap::new())
            .unwrap();
        storage
            .create(VersionId::changes(), &de(), FieldMap::new())
            .unwrap();

        storage.delete(VersionId::changes(), &en()).unwrap();
        assert!(storage.exists(VersionId::changes(), &de()).unwrap());
    }

    #[test]
    fn modified_and_touch() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        assert!(storage.modified(VersionId::changes(), &en()).unwrap().is_none());
        assert!(storage.touch(VersionId::changes(), &en()).unwrap_err().is_not_found());

        storage
            .create(VersionId::changes(), &en(), title_and_text())
            .unwrap();
        let before = Timestamp::now();
        storage.touch(VersionId::changes(), &en()).unwrap();

        // Filesystem mtime resolution can be coarse, compare at second granularity.
        let modified = storage.modified(VersionId::changes(), &en()).unwrap().unwrap();
        assert!(modified.as_secs() >= before.as_secs());
        assert!(storage.modified(VersionId::latest(), &en()).unwrap().is_none());
        assert_eq!(
            storage.read(VersionId::changes(), &en()).unwrap(),
            title_and_text()
        );
    }

    #[test]
    fn publish_relocates_draft() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        storage
            .create(VersionId::latest(), &en(), FieldMap::new().with("title", "Old"))
            .unwrap();
        storage
            .create(VersionId::changes(), &en(), title_and_text())
            .unwrap();

        storage
            .move_to(VersionId::changes(), &en(), VersionId::latest(), &en(), None)
            .unwrap();

        assert!(!storage.exists(VersionId::changes(), &en()).unwrap());
        assert_eq!(
            storage.read(VersionId::latest(), &en()).unwrap(),
            title_and_text()
        );
        assert!(!storage.version_dir(VersionId::changes()).exists());
    }

    #[test]
    fn move_to_same_location_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), single_language_model());
        let language = Language::single();
        storage
            .create(VersionId::latest(), &language, title_and_text())
            .unwrap();

        storage
            .move_to(VersionId::latest(), &language, VersionId::latest(), &language, None)
            .unwrap();
        assert_eq!(
            storage.read(VersionId::latest(), &language).unwrap(),
            title_and_text()
        );
    }

    #[test]
    fn move_from_memory_into_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = PlainFileStorage::new(dir.path(), multi_language_model());
        let memory = MemoryStorage::new(multi_language_model());
        memory
            .create(VersionId::changes(), &de(), title_and_text())
            .unwrap();

        memory
            .move_to(
                VersionId::changes(),
                &de(),
                VersionId::latest(),
                &de(),
                Some(&files),
            )
            .unwrap();

        assert!(!memory.exists(VersionId::changes(), &de()).unwrap());
        assert_eq!(
            files.read(VersionId::latest(), &de()).unwrap(),
            title_and_text()
        );
    }

    #[test]
    fn move_from_files_into_memory() {
        let dir = tempfile::tempdir().unwrap();
        let files = PlainFileStorage::new(dir.path(), single_language_model());
        let memory = MemoryStorage::new(single_language_model());
        let language = Language::single();
        files
            .create(VersionId::latest(), &language, title_and_text())
            .unwrap();

        files
            .move_to(
                VersionId::latest(),
                &language,
                VersionId::latest(),
                &language,
                Some(&memory),
            )
            .unwrap();

        assert!(!files.exists(VersionId::latest(), &language).unwrap());
        assert_eq!(
            memory.read(VersionId::latest(), &language).unwrap(),
            title_and_text()
        );
    }

    #[test]
    fn two_handles_on_one_directory_see_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let a = PlainFileStorage::new(dir.path(), single_language_model());
        let b = PlainFileStorage::new(dir.path(), single_language_model());
        let language = Language::single();
        a.create(VersionId::latest(), &language, title_and_text())
            .unwrap();
        assert!(b.exists(VersionId::latest(), &language).unwrap());
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn move_between_handles_on_one_directory_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = PlainFileStorage::new(dir.path(), single_language_model());
        let b = PlainFileStorage::new(dir.path(), single_language_model());
        let language = Language::single();
        a.create(VersionId::latest(), &language, title_and_text())
            .unwrap();

        a.move_to(
            VersionId::latest(),
            &language,
            VersionId::latest(),
            &language,
            Some(&b),
        )
        .unwrap();
        assert_eq!(b.read(VersionId::latest(), &language).unwrap(), title_and_text());

        b.move_to(
            VersionId::latest(),
            &language,
            VersionId::changes(),
            &language,
            Some(&a),
        )
        .unwrap();
        assert!(!a.exists(VersionId::latest(), &language).unwrap());
        assert_eq!(a.read(VersionId::changes(), &language).unwrap(), title_and_text());
    }

    #[test]
    fn handles_on_other_models_are_other_instances() {
        let dir = tempfile::tempdir().unwrap();
        let a = PlainFileStorage::new(dir.path(), single_language_model());
        let b = PlainFileStorage::new(
            dir.path(),
            ContentModel::single_language(ModelId::new("blog/other").unwrap()),
        );
        assert_ne!(a.id(), b.id());

        let language = Language::single();
        a.create(VersionId::latest(), &language, title_and_text())
            .unwrap();
        a.move_to(
            VersionId::latest(),
            &language,
            VersionId::latest(),
            &language,
            Some(&b),
        )
        .unwrap();
        assert!(!a.exists(VersionId::latest(), &language).unwrap());
        assert_eq!(b.read(VersionId::latest(), &language).unwrap(), title_and_text());
    }

    #[test]
    fn file_name_follows_configured_language() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        let forged: Language =
            serde_json::from_str(r#"{"code":"de","name":"Deutsch","single":true}"#).unwrap();

        storage
            .create(VersionId::latest(), &forged, title_and_text())
            .unwrap();

        let base = dir.path().join("blog").join("hello");
        assert!(base.join("content.de.json").is_file());
        assert!(!base.join("content.json").exists());
        assert_eq!(storage.read(VersionId::latest(), &de()).unwrap(), title_and_text());
    }

    #[test]
    fn rejects_unconfigured_language() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PlainFileStorage::new(dir.path(), multi_language_model());
        let fr = Language::new("fr", "French").unwrap();
        let err = storage.exists(VersionId::latest(), &fr).unwrap_err();
        assert!(matches!(err, StorageError::InvalidLanguage { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn random_field_maps_roundtrip(
            entries in proptest::collection::vec(("[a-z][a-z0-9_]{0,11}", "\\PC*"), 0..10)
        ) {
            let dir = tempfile::tempdir().unwrap();
            let storage = PlainFileStorage::new(dir.path(), single_language_model());
            let fields: FieldMap = entries.into_iter().collect();

            storage.create(VersionId::changes(), &Language::single(), fields.clone()).unwrap();
            let read = storage.read(VersionId::changes(), &Language::single()).unwrap();
            prop_assert_eq!(read, fields);
        }
    }
}
