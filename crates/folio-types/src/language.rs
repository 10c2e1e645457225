//! Content languages and the registry of languages configured for a site.
//!
//! Storage never owns languages. It addresses content by language code, so
//! two [`Language`] values with the same code always reach the same slot.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Code of the sentinel language used by single-language sites.
const SINGLE_CODE: &str = "default";

/// A content language.
///
/// Equality and hashing are code-based: the name and flags are descriptive
/// only and never participate in storage addressing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Language {
    code: String,
    name: String,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    single: bool,
}

impl Language {
    /// Create a configured language. The code is normalised to lowercase.
    pub fn new(code: &str, name: impl Into<String>) -> Result<Self, TypeError> {
        let code = code.trim().to_ascii_lowercase();
        validate_code(&code)?;
        Ok(Self {
            code,
            name: name.into(),
            default: false,
            single: false,
        })
    }

    /// The sentinel language for sites without multi-language configuration.
    pub fn single() -> Self {
        Self {
            code: SINGLE_CODE.to_string(),
            name: SINGLE_CODE.to_string(),
            default: true,
            single: true,
        }
    }

    /// Mark this language as the site default.
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Stable lowercase identifier used as the storage-key component.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this is the site's default language.
    pub fn is_default(&self) -> bool {
        self.default
    }

    /// Returns `true` for the single-language sentinel.
    pub fn is_single(&self) -> bool {
        self.single
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Language {}

impl Hash for Language {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

fn validate_code(code: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidLanguage {
        code: code.to_string(),
        reason: reason.to_string(),
    };

    if code.is_empty() {
        return Err(invalid("language code must not be empty"));
    }
    if code == SINGLE_CODE {
        return Err(invalid("code is reserved for the single-language sentinel"));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("only ASCII letters, digits, '-' and '_' are allowed"));
    }
    if code.starts_with(['-', '_']) || code.ends_with(['-', '_']) {
        return Err(invalid("must not start or end with a separator"));
    }
    Ok(())
}

/// The set of content languages configured for a site.
///
/// Replaces any ambient "current app" lookup: storage backends receive the
/// registry explicitly and consult it to reject keys whose language is not
/// configured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Language>", into = "Vec<Language>")]
pub struct LanguageRegistry {
    languages: Vec<Language>,
}

impl LanguageRegistry {
    /// Registry for a single-language site. Only [`Language::single`] is valid.
    pub fn single() -> Self {
        Self {
            languages: vec![Language::single()],
        }
    }

    /// Registry for a multi-language site.
    ///
    /// Codes must be unique and at most one language may be flagged default.
    /// When none is flagged, the first language becomes the default.
    pub fn multi(languages: Vec<Language>) -> Result<Self, TypeError> {
        if languages.is_empty() {
            return Err(TypeError::InvalidLanguage {
                code: String::new(),
                reason: "a multi-language site needs at least one language".into(),
            });
        }

        let mut languages = languages;
        for language in &mut languages {
            if language.is_single() {
                return Err(TypeError::InvalidLanguage {
                    code: language.code.clone(),
                    reason: "the single-language sentinel cannot be configured".into(),
                });
            }
            // Deserialized languages bypass `Language::new`.
            language.code = language.code.trim().to_ascii_lowercase();
            validate_code(&language.code)?;
        }

        let mut seen: Vec<&str> = Vec::with_capacity(languages.len());
        for language in &languages {
            if seen.contains(&language.code()) {
                return Err(TypeError::InvalidLanguage {
                    code: language.code.clone(),
                    reason: "duplicate language code".into(),
                });
            }
            seen.push(language.code());
        }

        let defaults = languages.iter().filter(|l| l.is_default()).count();
        if defaults > 1 {
            return Err(TypeError::InvalidLanguage {
                code: String::new(),
                reason: format!("expected one default language, found {defaults}"),
            });
        }

        if defaults == 0 {
            languages[0].default = true;
        }
        Ok(Self { languages })
    }

    /// Returns `true` when the site has language configuration.
    pub fn is_multi_language(&self) -> bool {
        !self.languages.iter().any(Language::is_single)
    }

    /// The default language. For single-language sites this is the sentinel.
    pub fn default_language(&self) -> &Language {
        self.languages
            .iter()
            .find(|l| l.is_default())
            .unwrap_or(&self.languages[0])
    }

    /// Look up a configured language by code (case-insensitive).
    pub fn get(&self, code: &str) -> Option<&Language> {
        let code = code.trim().to_ascii_lowercase();
        self.languages.iter().find(|l| l.code == code)
    }

    /// Resolve a language code, mapping the sentinel code on single-language sites.
    pub fn resolve(&self, code: &str) -> Result<&Language, TypeError> {
        self.get(code).ok_or_else(|| TypeError::InvalidLanguage {
            code: code.to_string(),
            reason: "language is not configured for this site".into(),
        })
    }

    /// Returns `true` if the language addresses a configured slot.
    pub fn contains(&self, language: &Language) -> bool {
        self.languages.iter().any(|l| l == language)
    }

    /// Fail with [`TypeError::InvalidLanguage`] unless the language is configured.
    pub fn validate(&self, language: &Language) -> Result<(), TypeError> {
        if self.contains(language) {
            return Ok(());
        }
        let reason = if language.is_single() {
            "the single-language sentinel is not valid on a multi-language site"
        } else if self.is_multi_language() {
            "language is not configured for this site"
        } else {
            "only the single-language sentinel is valid on a single-language site"
        };
        Err(TypeError::InvalidLanguage {
            code: language.code.clone(),
            reason: reason.into(),
        })
    }

    /// The configured language with the same code.
    ///
    /// Flags on the argument are ignored: a deserialized `Language` may carry
    /// a `single` or `default` flag that disagrees with the configuration.
    pub fn configured(&self, language: &Language) -> Result<&Language, TypeError> {
        self.validate(language)?;
        self.get(language.code())
            .ok_or_else(|| TypeError::InvalidLanguage {
                code: language.code.clone(),
                reason: "language is not configured for this site".into(),
            })
    }

    /// Iterate configured languages in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.languages.iter()
    }

    /// Number of configured languages.
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// Always `false`: a registry holds at least one language.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl TryFrom<Vec<Language>> for LanguageRegistry {
    type Error = TypeError;

    fn try_from(languages: Vec<Language>) -> Result<Self, Self::Error> {
        match languages.as_slice() {
            [only] if only.is_single() => Ok(Self::single()),
            _ => Self::multi(languages),
        }
    }
}

impl From<LanguageRegistry> for Vec<Language> {
    fn from(registry: LanguageRegistry) -> Self {
        registry.languages
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::single()
    }
}
