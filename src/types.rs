//! Shared types used across all pipeline stages.
//!
//! An [`Artifact`] is produced by the scanner or supplied as an external in
//! the config, ordered by the list builder, and consumed once by the
//! injector. The serialized form doubles as the config schema for
//! `[[externals]]` entries, so field names follow the config keys
//! (`type`, `file`, `pos`, `inject`, `timestamp`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// What kind of markup an artifact turns into.
///
/// Serialized as the bare strings `"js"` and `"css"`. Any other string is
/// carried through as [`ArtifactKind::Other`]: the artifact keeps its slot in
/// the list and is still hash-rewritten, but emits no tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactKind {
    Script,
    Stylesheet,
    Other(String),
}

impl ArtifactKind {
    /// Classify a file by its name suffix. Only `.js` and `.css` count.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        if name.ends_with(".js") {
            Some(Self::Script)
        } else if name.ends_with(".css") {
            Some(Self::Stylesheet)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Script => "js",
            Self::Stylesheet => "css",
            Self::Other(other) => other,
        }
    }
}

/// An external declared without `type`: passed through, no markup.
impl Default for ArtifactKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ArtifactKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "js" => Self::Script,
            "css" => Self::Stylesheet,
            _ => Self::Other(value),
        }
    }
}

impl From<ArtifactKind> for String {
    fn from(kind: ArtifactKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an external is spliced into the scanned list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Ahead of every scanned artifact, after earlier "before" externals.
    Before,
    After,
    /// No preference; treated like `After`.
    #[default]
    Default,
}

/// Which document section a script tag lands in.
///
/// Stylesheets always go to head regardless of this value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectTarget {
    Head,
    Body,
    #[default]
    Default,
}

/// A single script or stylesheet to be referenced from the output HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    #[serde(rename = "type", default, skip_serializing_if = "is_default")]
    pub kind: ArtifactKind,
    /// Filesystem path or absolute URL (`https://…`, `//cdn…`).
    #[serde(rename = "file")]
    pub path: String,
    #[serde(rename = "pos", default, skip_serializing_if = "is_default")]
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "is_default")]
    pub inject: InjectTarget,
    /// Append `?t=<epoch millis>` to the emitted URL.
    #[serde(default, skip_serializing_if = "is_default")]
    pub timestamp: bool,
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

impl Artifact {
    /// A scanned artifact: default placement and target, no timestamp.
    pub fn scanned(kind: ArtifactKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.to_string_lossy().into_owned(),
            placement: Placement::Default,
            inject: InjectTarget::Default,
            timestamp: false,
        }
    }

    pub fn is_script(&self) -> bool {
        self.kind == ArtifactKind::Script
    }

    /// Final path component, split on `/` so URLs work too.
    pub fn basename(&self) -> &str {
        self.path
            .rsplit(['/', std::path::MAIN_SEPARATOR])
            .next()
            .unwrap_or(&self.path)
    }
}
