use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifies which logical state of a model's content is addressed.
///
/// The set is closed: `latest` is the published/saved state and `changes`
/// is the in-progress draft. No other value can be constructed, and parsing
/// any other token fails with [`TypeError::InvalidVersion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionId {
    /// The currently published content.
    Latest,
    /// The unpublished draft.
    Changes,
}

impl VersionId {
    /// The published version.
    pub const fn latest() -> Self {
        Self::Latest
    }

    /// The draft version.
    pub const fn changes() -> Self {
        Self::Changes
    }

    /// Both versions, published first.
    pub const fn all() -> [Self; 2] {
        [Self::Latest, Self::Changes]
    }

    /// Stable string form used in paths and URLs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Changes => "changes",
        }
    }

    /// Parse the stable string form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "latest" => Ok(Self::Latest),
            "changes" => Ok(Self::Changes),
            other => Err(TypeError::InvalidVersion(other.to_string())),
        }
    }

    /// Returns `true` for the draft version.
    pub fn is_changes(&self) -> bool {
        matches!(self, Self::Changes)
    }

    /// Returns `true` for the published version.
    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }
}

impl FromStr for VersionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
