//! Content hashing for cache-busting file names.
//!
//! A file name carrying the hash placeholder (`app.[hash].js`) is rewritten
//! with a SHA-256 digest of the file's final content (`app.3f2a….js`),
//! optionally truncated via `hash_length`.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Placeholder token replaced with the content digest.
pub const DEFAULT_PLACEHOLDER: &str = "[hash]";

/// Shortest digest prefix accepted for file names.
pub const MIN_HASH_LENGTH: usize = 8;

/// Full SHA-256 hex digest length.
pub const MAX_HASH_LENGTH: usize = 64;

/// SHA-256 of `bytes`, as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Truncate a digest to `length` hex characters (full digest when `None`).
pub fn shorten(digest: &str, length: Option<usize>) -> &str {
    match length {
        Some(n) if n < digest.len() => &digest[..n],
        _ => digest,
    }
}

/// Whether the file name (not its directories) carries the placeholder.
pub fn has_placeholder(path: &Path, placeholder: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().contains(placeholder))
}

/// Replace the first placeholder in the file name with `digest`.
///
/// Directory components are left alone even if they contain the token.
pub fn apply_hash(path: &Path, placeholder: &str, digest: &str) -> PathBuf {
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let renamed = name.to_string_lossy().replacen(placeholder, digest, 1);
    path.with_file_name(renamed)
}
