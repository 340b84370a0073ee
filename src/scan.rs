//! Output directory scanning.
//!
//! Stage 1 of the injection pipeline. Walks the bundler's output directory
//! and collects every script and stylesheet it emitted:
//!
//! ```text
//! dist/
//! ├── app.[hash].js        → script
//! ├── app.[hash].js.map    (skipped)
//! ├── css/
//! │   └── site.css         → stylesheet
//! └── index.html           (skipped)
//! ```
//!
//! ## Ordering
//!
//! Traversal is depth-first and **unsorted**: the result follows the
//! filesystem's directory-listing order, which differs across platforms and
//! filesystems. Callers that need a stable tag order should pin it with
//! externals instead.

use crate::types::{Artifact, ArtifactKind};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Output path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Recursively list the scripts and stylesheets under `root`.
///
/// Symlinks are followed, so a linked bundle counts like a regular file.
/// Fails if `root` is missing, unreadable, or not a directory.
pub fn scan(root: &Path) -> Result<Vec<Artifact>, ScanError> {
    if !fs::metadata(root)?.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(kind) = ArtifactKind::from_path(entry.path()) {
            debug!("scanned {} ({})", entry.path().display(), kind);
            artifacts.push(Artifact::scanned(kind, entry.path()));
        }
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn scan_finds_scripts_and_stylesheets() {
        let tmp = setup_dist(&[
            ("dist/app.js", "console.log(1)"),
            ("dist/site.css", "body{}"),
        ]);
        let artifacts = scan(&tmp.path().join("dist")).unwrap();

        assert_eq!(artifacts.len(), 2);
        let script = find_artifact(&artifacts, "app.js");
        assert_eq!(script.kind, ArtifactKind::Script);
        let style = find_artifact(&artifacts, "site.css");
        assert_eq!(style.kind, ArtifactKind::Stylesheet);
    }

    #[test]
    fn scan_recurses_into_subdirectories() {
        let tmp = setup_dist(&[
            ("dist/js/vendor/lib.js", "x"),
            ("dist/css/deep/nested/theme.css", "y"),
        ]);
        let artifacts = scan(&tmp.path().join("dist")).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert!(find_artifact(&artifacts, "lib.js").path.contains("vendor"));
        assert!(find_artifact(&artifacts, "theme.css").path.contains("nested"));
    }

    #[test]
    fn scan_skips_other_files() {
        let tmp = setup_dist(&[
            ("dist/app.js", "x"),
            ("dist/app.js.map", "{}"),
            ("dist/index.html", "<html></html>"),
            ("dist/logo.svg", "<svg/>"),
            ("dist/README", "hi"),
        ]);
        let artifacts = scan(&tmp.path().join("dist")).unwrap();
        assert_eq!(artifact_names(&artifacts), vec!["app.js"]);
    }

    #[test]
    fn scan_one_artifact_per_file_no_duplicates() {
        let files: Vec<(String, &str)> = (0..12)
            .map(|i| {
                let ext = if i % 3 == 0 { "css" } else { "js" };
                (format!("dist/d{}/f{i}.{ext}", i % 4), "content")
            })
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), *c)).collect();
        let tmp = setup_dist(&refs);

        let artifacts = scan(&tmp.path().join("dist")).unwrap();
        assert_eq!(artifacts.len(), 12);

        let unique: HashSet<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(unique.len(), 12);

        for artifact in &artifacts {
            let expected = if artifact.path.ends_with(".css") {
                ArtifactKind::Stylesheet
            } else {
                ArtifactKind::Script
            };
            assert_eq!(artifact.kind, expected, "{}", artifact.path);
        }
    }

    #[test]
    fn scan_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_paths_are_under_root() {
        let tmp = setup_dist(&[("dist/a/b.js", "x")]);
        let root = tmp.path().join("dist");
        let artifacts = scan(&root).unwrap();
        assert!(Path::new(&artifacts[0].path).starts_with(&root));
    }

    #[test]
    fn scan_missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan(&tmp.path().join("nope"));
        assert!(matches!(result, Err(ScanError::Io(_))));
    }

    #[test]
    fn scan_file_instead_of_directory_is_error() {
        let tmp = setup_dist(&[("dist/app.js", "x")]);
        let result = scan(&tmp.path().join("dist/app.js"));
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }
}
