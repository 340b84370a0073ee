//! Shared test utilities for the html-inject test suite.
//!
//! Builds throwaway output directories and provides lookups over artifact
//! lists that panic with a readable message on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_dist(&[("dist/app.js", "x"), ("dist/site.css", "y")]);
//! let artifacts = scan(&tmp.path().join("dist")).unwrap();
//!
//! let app = find_artifact(&artifacts, "app.js");
//! assert_eq!(app.kind, ArtifactKind::Script);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::types::{Artifact, ArtifactKind};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding the given `(relative path, content)` files.
///
/// Parent directories are created as needed. Tests get an isolated tree
/// they can mutate freely.
pub fn setup_dist(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, content) in files {
        write_file(tmp.path(), rel, content);
    }
    tmp
}

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Minimal template with empty head and body.
pub const BASIC_TEMPLATE: &str = "<html><head></head><body></body></html>";

// =========================================================================
// Artifact lookups
// =========================================================================

/// Find an artifact whose path ends with `suffix`. Panics if not found.
pub fn find_artifact<'a>(artifacts: &'a [Artifact], suffix: &str) -> &'a Artifact {
    artifacts
        .iter()
        .find(|a| a.path.ends_with(suffix))
        .unwrap_or_else(|| {
            let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
            panic!("artifact '{suffix}' not found. Available: {paths:?}")
        })
}

/// File names of all artifacts, in list order.
pub fn artifact_names(artifacts: &[Artifact]) -> Vec<&str> {
    artifacts.iter().map(|a| a.basename()).collect()
}

/// An external artifact with default placement.
pub fn external(kind: &str, file: &str) -> Artifact {
    Artifact::scanned(ArtifactKind::from(kind.to_string()), Path::new(file))
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Slice of `html` between `<open>` and `</close>` markers, for section checks.
pub fn section<'a>(html: &'a str, tag: &str) -> &'a str {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let start = html
        .find(&open)
        .unwrap_or_else(|| panic!("no <{tag}> in {html}"));
    let end = html
        .find(&close)
        .unwrap_or_else(|| panic!("no </{tag}> in {html}"));
    &html[start..end]
}
