//! Staged file writes.
//!
//! Every write goes to a temporary file in the target's directory first and
//! is then renamed over the target, so readers never observe a half-written
//! file. Hashed renames persist the new name before removing the old one:
//! a crash in between leaves both files, never neither.

use crate::document::{Document, DocumentError};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to persist staged file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Write `bytes` to `path` through a staged temp file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path)?;
    Ok(())
}

/// Write `bytes` under `new`, then remove `old`.
///
/// A missing `old` is not an error: the entry chunk may only exist in memory.
pub fn replace_hashed(old: &Path, new: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    write_atomic(new, bytes)?;
    if old != new {
        match fs::remove_file(old) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
    }
    Ok(())
}

/// Serialize `document` and write it to `dest`, replacing any existing file.
pub fn write_document(document: &Document, dest: &Path) -> Result<(), WriteError> {
    let html = document.to_html()?;
    write_atomic(dest, html.as_bytes())
}
