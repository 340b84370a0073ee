//! One injection run, end to end.
//!
//! ```text
//! BuildEvent + InjectConfig
//!   → BuildContext      (entry, output dir, destination)
//!   → template          (load, collapse whitespace, parse)
//!   → scan              (output dir → scripts + stylesheets)
//!   → artifact list     (splice externals)
//!   → inject            (hash rewrite, tags)
//!   → write             (staged write of the destination file)
//! ```
//!
//! The template is loaded and parsed before anything on disk is renamed, so
//! a bad template never leaves a half-hashed output directory behind.

use crate::artifacts;
use crate::config::InjectConfig;
use crate::document::Document;
use crate::inject::{self, BuildContext, InjectError, InjectReport};
use crate::scan;
use crate::template;
use crate::types::Artifact;
use crate::writer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One chunk reported by the bundler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    /// Path of the written chunk, relative to the working directory.
    pub file_name: String,
    #[serde(default)]
    pub is_entry: bool,
    /// Whether a `<file>.map` was emitted alongside.
    #[serde(default)]
    pub sourcemap: bool,
}

/// What the bundler reports once all chunks are on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildEvent {
    pub chunks: Vec<ChunkInfo>,
    /// Final code of the entry chunk, if the bundler still holds it.
    pub entry_code: Option<String>,
}

impl BuildEvent {
    /// The last chunk flagged as an entry.
    pub fn entry_chunk(&self) -> Option<&ChunkInfo> {
        self.chunks.iter().rev().find(|c| c.is_entry)
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Written HTML file.
    pub destination: PathBuf,
    /// Final artifact list, in tag order, before hashing.
    pub artifacts: Vec<Artifact>,
    pub inject: InjectReport,
}

/// Run against the process working directory.
pub fn run(config: &InjectConfig, event: &BuildEvent) -> Result<RunReport, InjectError> {
    let cwd = std::env::current_dir()?;
    run_in(config, event, &cwd)
}

/// Run with all relative paths resolved against `cwd`.
pub fn run_in(
    config: &InjectConfig,
    event: &BuildEvent,
    cwd: &Path,
) -> Result<RunReport, InjectError> {
    let ctx = BuildContext::resolve(config, event, cwd)?;
    debug!(
        "output dir {}, destination {}",
        ctx.output_dir.display(),
        ctx.destination.display()
    );

    let markup = ctx.template.load(&ctx.cwd)?;
    let mut document = Document::parse(template::collapse_whitespace(&markup))?;

    let scanned: Vec<_> = scan::scan(&ctx.output_dir)?
        .into_iter()
        .map(|artifact| relative_to(artifact, &ctx.cwd))
        .collect();
    info!("found {} artifacts in {}", scanned.len(), ctx.output_dir.display());
    let artifacts = artifacts::build_list(scanned, &config.externals);

    let report = inject::inject(&mut document, &artifacts, &ctx)?;
    writer::write_document(&document, &ctx.destination)?;
    info!(
        "wrote {} ({} tags, {} renamed)",
        ctx.destination.display(),
        report.tags.len(),
        report.renamed.len()
    );

    Ok(RunReport {
        destination: ctx.destination,
        artifacts,
        inject: report,
    })
}

/// Express a scanned path relative to `cwd` (`dist/js/app.js`), which is
/// what ignore patterns are written against.
fn relative_to(mut artifact: Artifact, cwd: &Path) -> Artifact {
    if let Ok(rel) = Path::new(&artifact.path).strip_prefix(cwd) {
        artifact.path = rel.to_string_lossy().into_owned();
    }
    artifact
}
