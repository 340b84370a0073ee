//! Injection configuration.
//!
//! Handles loading and validating `html-inject.toml`. Every key has a
//! default, so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! template = { path = "index.html" }  # or { inline = "<html>…</html>" }
//! # filename = "index.html"           # output HTML name (default: template file name)
//! inject = "default"                  # "head" forces every script into <head>
//! # dest = "dist"                     # output directory (default: from entry file)
//! absolute = false                    # prefix relative URLs with "/"
//! # ignore = '\.map$'                 # regex; matching artifacts emit no tag
//! # online_path = "https://cdn.example.com/assets"
//! defer = false                       # add `defer` to script tags
//! # favicon = "/favicon.ico"
//! favicon_mode = "once"               # or "per-artifact"
//! hash_placeholder = "[hash]"
//! # hash_length = 8                   # truncate digests in file names
//!
//! [[externals]]
//! type = "js"                         # "js", "css", or passed through as-is
//! file = "https://cdn.example.com/react.js"
//! pos = "before"                      # "before" | "after"
//! inject = "head"                     # "head" | "body"
//! timestamp = false                   # append ?t=<epoch millis>
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::hash::{DEFAULT_PLACEHOLDER, MAX_HASH_LENGTH, MIN_HASH_LENGTH};
use crate::template::TemplateSource;
use crate::types::{Artifact, InjectTarget};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up by the CLI when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "html-inject.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// How the favicon link is added when `favicon` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaviconMode {
    /// One tag per run; skipped when the template already has a shortcut icon.
    #[default]
    Once,
    /// One tag per injected artifact, never deduplicated.
    PerArtifact,
}

/// Options for one injection run.
///
/// All fields have defaults. `template` is the only key most projects set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InjectConfig {
    /// Template markup or file. Required before a run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateSource>,
    /// Output HTML file name; also the entry file when the build reports none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Extra artifacts spliced into the scanned list.
    pub externals: Vec<Artifact>,
    /// Global script target; `head` wins over a per-artifact `body`.
    pub inject: InjectTarget,
    /// Output directory override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,
    /// Prefix relative URLs with `/`.
    pub absolute: bool,
    /// Regex matched against artifact paths; matches emit no tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<String>,
    /// URL prefix replacing the computed relative path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_path: Option<String>,
    /// Add `defer` to script tags.
    pub defer: bool,
    /// Shortcut-icon URL added to head.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    pub favicon_mode: FaviconMode,
    /// File name token replaced with the content digest.
    pub hash_placeholder: String,
    /// Digest characters kept in file names (full 64 when absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_length: Option<usize>,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            template: None,
            filename: None,
            externals: Vec::new(),
            inject: InjectTarget::Default,
            dest: None,
            absolute: false,
            ignore: None,
            online_path: None,
            defer: false,
            favicon: None,
            favicon_mode: FaviconMode::Once,
            hash_placeholder: DEFAULT_PLACEHOLDER.to_string(),
            hash_length: None,
        }
    }
}

impl InjectConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hash_placeholder.is_empty() {
            return Err(ConfigError::Validation(
                "hash_placeholder must not be empty".into(),
            ));
        }
        if let Some(len) = self.hash_length
            && !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&len)
        {
            return Err(ConfigError::Validation(format!(
                "hash_length must be {MIN_HASH_LENGTH}-{MAX_HASH_LENGTH}"
            )));
        }
        if let Some(external) = self.externals.iter().find(|e| e.path.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "externals entry of type '{}' has an empty file",
                external.kind
            )));
        }
        if self.online_path.as_deref().is_some_and(|p| p.is_empty()) {
            return Err(ConfigError::Validation(
                "online_path must not be empty".into(),
            ));
        }
        self.ignore_pattern()?;
        Ok(())
    }

    /// Compile the ignore pattern, if any.
    pub fn ignore_pattern(&self) -> Result<Option<Regex>, ConfigError> {
        Ok(self.ignore.as_deref().map(Regex::new).transpose()?)
    }
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Deserialize config text and validate it. Absent keys take their defaults.
pub fn parse_config(content: &str) -> Result<InjectConfig, ConfigError> {
    let config: InjectConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<InjectConfig, ConfigError> {
    if !path.exists() {
        return Ok(InjectConfig::default());
    }
    parse_config(&fs::read_to_string(path)?)
}

/// Returns a fully-commented stock `html-inject.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# html-inject configuration
# =========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Template: a file path, or literal markup.
#   template = { path = "index.html" }
#   template = { inline = "<html><head></head><body></body></html>" }
# A bare string is treated as markup when it contains <html> and ends
# with </html>, otherwise as a path.
# template = { path = "index.html" }

# Output HTML file name, written into the output directory.
# Defaults to the template's file name.
# filename = "index.html"

# Where scripts go: "head", or "default" for <body>.
# Stylesheets always go to <head>.
inject = "default"

# Output directory. Defaults to the first directory of the entry file
# (dist/app.js -> dist).
# dest = "dist"

# Prefix relative URLs with "/".
absolute = false

# Regex matched against artifact paths. Matches keep their place in the
# list but emit no tag and are not hashed.
# ignore = '\.map$'

# Replace computed URLs with <online_path>/<file name>.
# URL-form externals (https://..., //...) are never rewritten.
# online_path = "https://cdn.example.com/assets"

# Add `defer` to every script tag.
defer = false

# Shortcut icon added to <head>.
# favicon = "/favicon.ico"

# "once": one tag per run, skipped if the template already has one.
# "per-artifact": one tag per injected artifact.
favicon_mode = "once"

# Token in file names replaced with a SHA-256 content digest.
hash_placeholder = "[hash]"

# Keep only the first N digest characters (8-64).
# hash_length = 8

# ---------------------------------------------------------------------------
# Externals: extra artifacts spliced into the scanned list.
# pos = "before" puts them ahead of scanned files, in the order listed;
# anything else appends them.
# ---------------------------------------------------------------------------
# [[externals]]
# type = "js"
# file = "https://cdn.example.com/react.production.min.js"
# pos = "before"
# inject = "head"
# timestamp = false
"##
}
