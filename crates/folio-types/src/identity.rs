//! Identities of content owners and editing actors.
//!
//! Model ids double as relative directory paths for durable backends, so
//! they follow path-safe naming rules:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..`
//! - Must not start or end with `/`
//! - Components between slashes must be non-empty and must not start with
//!   `.` or `_` (the underscore prefix is reserved for storage directories
//!   such as `_changes`)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::language::LanguageRegistry;

/// Characters that are forbidden anywhere in a model id.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Identity of a content-owning model (e.g. `site`, `blog/hello-world`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelId(String);

impl ModelId {
    /// Parse and validate a model id.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_types::ModelId;
    ///
    /// assert!(ModelId::new("site").is_ok());
    /// assert!(ModelId::new("blog/hello-world").is_ok());
    /// assert!(ModelId::new("").is_err());
    /// assert!(ModelId::new("blog/../etc").is_err());
    /// ```
    pub fn new(id: &str) -> Result<Self, TypeError> {
        validate_model_id(id)?;
        Ok(Self(id.to_string()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path components, for durable backends that mirror the id on disk.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl TryFrom<String> for ModelId {
    type Error = TypeError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        validate_model_id(&id)?;
        Ok(Self(id))
    }
}

impl From<ModelId> for String {
    fn from(id: ModelId) -> Self {
        id.0
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_model_id(id: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidModelId {
        id: id.to_string(),
        reason,
    };

    if id.is_empty() {
        return Err(invalid("model id must not be empty".into()));
    }
    for ch in FORBIDDEN_CHARS {
        if id.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }
    if id.contains("..") {
        return Err(invalid("must not contain '..'".into()));
    }
    if id.starts_with('/') || id.ends_with('/') {
        return Err(invalid("must not start or end with '/'".into()));
    }
    for component in id.split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty".into()));
        }
        if component.starts_with('.') || component.starts_with('_') {
            return Err(invalid(format!(
                "component must not start with '.' or '_': {component:?}"
            )));
        }
    }
    Ok(())
}

/// The owning model as seen by storage: its identity and the languages
/// configured for its site.
///
/// Storage uses this only to decide which keys are legal. It never calls
/// back into model business logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentModel {
    id: ModelId,
    languages: LanguageRegistry,
}

impl ContentModel {
    /// Describe a model owned by a site with the given languages.
    pub fn new(id: ModelId, languages: LanguageRegistry) -> Self {
        Self { id, languages }
    }

    /// A model on a single-language site.
    pub fn single_language(id: ModelId) -> Self {
        Self::new(id, LanguageRegistry::single())
    }

    /// The model's identity.
    pub fn id(&self) -> &ModelId {
        &self.id
    }

    /// The languages configured for the model's site.
    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }
}

/// Reference to a user, e.g. the actor holding a draft lock.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserRef(String);

impl UserRef {
    /// Create a user reference from an id or email.
    pub fn new(id: &str) -> Result<Self, TypeError> {
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidUser(id.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The user id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserRef {
    type Error = TypeError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(&id)
    }
}

impl From<UserRef> for String {
    fn from(user: UserRef) -> Self {
        user.0
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
