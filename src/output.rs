//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Artifacts in dist/
//! 001 app.js [js]
//!     Source: js/app.js
//! 002 app.js.map [js] (ignored)
//!     Source: js/app.js.map
//! 003 site.css [css]
//!     Source: site.css
//! ```
//!
//! ## Inject
//!
//! ```text
//! Renamed
//!     js/app.[hash].js → js/app.9c1e04b2.js
//!
//! Head
//! 001 site.css
//!
//! Body
//! 001 js/app.9c1e04b2.js
//!
//! Ignored
//!     js/app.js.map
//!
//! Wrote dist/index.html (2 tags)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::artifacts::is_ignored;
use crate::document::Section;
use crate::pipeline::RunReport;
use crate::types::Artifact;
use regex::Regex;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root` when it lies under it, else unchanged.
fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(
    artifacts: &[Artifact],
    ignore: Option<&Regex>,
    root: &Path,
) -> Vec<String> {
    let mut lines = vec![format!("Artifacts in {}/", root.display())];
    if artifacts.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }
    for (i, artifact) in artifacts.iter().enumerate() {
        let marker = if is_ignored(artifact, ignore) {
            " (ignored)"
        } else {
            ""
        };
        lines.push(format!(
            "{} {} [{}]{}",
            format_index(i + 1),
            artifact.basename(),
            artifact.kind,
            marker
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            relative_display(Path::new(&artifact.path), root)
        ));
    }
    lines
}

pub fn print_scan_output(artifacts: &[Artifact], ignore: Option<&Regex>, root: &Path) {
    for line in format_scan_output(artifacts, ignore, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Inject
// ============================================================================

pub fn format_run_report(report: &RunReport, output_dir: &Path) -> Vec<String> {
    let inject = &report.inject;
    let mut lines = Vec::new();

    if !inject.renamed.is_empty() {
        lines.push("Renamed".to_string());
        for rename in &inject.renamed {
            lines.push(format!(
                "{}{} → {}",
                indent(1),
                relative_display(&rename.from, output_dir),
                relative_display(&rename.to, output_dir)
            ));
        }
        lines.push(String::new());
    }

    for section in [Section::Head, Section::Body] {
        let tags: Vec<_> = inject.tags.iter().filter(|t| t.section == section).collect();
        if tags.is_empty() {
            continue;
        }
        lines.push(match section {
            Section::Head => "Head".to_string(),
            Section::Body => "Body".to_string(),
        });
        for (i, tag) in tags.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), tag.url));
        }
        lines.push(String::new());
    }

    if !inject.ignored.is_empty() {
        lines.push("Ignored".to_string());
        for path in &inject.ignored {
            lines.push(format!(
                "{}{}",
                indent(1),
                relative_display(Path::new(path), output_dir)
            ));
        }
        lines.push(String::new());
    }

    let tag_word = if inject.tags.len() == 1 { "tag" } else { "tags" };
    lines.push(format!(
        "Wrote {} ({} {})",
        report.destination.display(),
        inject.tags.len(),
        tag_word
    ));
    lines
}

pub fn print_run_report(report: &RunReport, output_dir: &Path) {
    for line in format_run_report(report, output_dir) {
        println!("{}", line);
    }
}
