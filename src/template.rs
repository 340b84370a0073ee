//! Template loading and preprocessing.
//!
//! ## Sources
//!
//! A template is either literal markup or a path to an HTML file. The config
//! accepts both explicitly:
//!
//! ```toml
//! template = { path = "public/index.html" }
//! template = { inline = "<html><head></head><body></body></html>" }
//! ```
//!
//! A bare string (`template = "public/index.html"`) is classified by
//! [`TemplateSource::sniff`]: markup if it contains `<html>` and ends with
//! `</html>`, otherwise a path.
//!
//! ## Preprocessing
//!
//! Before parsing, [`collapse_whitespace`] erases comments and collapses
//! whitespace. It runs a small tokenizer with four token kinds, tried in
//! this order at every position:
//!
//! | Token | Treatment |
//! |-------|-----------|
//! | `"…"` (backslash escapes) | copied verbatim |
//! | `'…'` (backslash escapes) | copied verbatim |
//! | `//…` through the next `\r` or `\n` | erased, newline included |
//! | `/* … */` | erased |
//!
//! An unterminated string or comment is not a token; its opening character
//! is plain text. Outside string tokens, each run of ` \n\r\t\f` becomes one
//! space, except a lone tab which stays a tab. Non-breaking spaces survive
//! verbatim and split runs around them.
//!
//! The line-comment rule applies to markup too: an unquoted `http://x` in
//! text loses everything up to the end of its line.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where the template markup comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "RawTemplate")]
pub enum TemplateSource {
    Inline(String),
    Path(PathBuf),
}

/// Accepted config shapes: a bare string or an explicit table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTemplate {
    Bare(String),
    Tagged(TaggedTemplate),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum TaggedTemplate {
    Inline(String),
    Path(PathBuf),
}

impl From<RawTemplate> for TemplateSource {
    fn from(raw: RawTemplate) -> Self {
        match raw {
            RawTemplate::Bare(value) => Self::sniff(&value),
            RawTemplate::Tagged(TaggedTemplate::Inline(markup)) => Self::Inline(markup),
            RawTemplate::Tagged(TaggedTemplate::Path(path)) => Self::Path(path),
        }
    }
}

impl TemplateSource {
    /// Classify a bare string as literal markup or a file path.
    pub fn sniff(value: &str) -> Self {
        if value.contains("<html>") && value.trim_end().ends_with("</html>") {
            Self::Inline(value.to_string())
        } else {
            Self::Path(PathBuf::from(value))
        }
    }

    /// Read the markup. Relative paths resolve against `base`.
    pub fn load(&self, base: &Path) -> Result<String, TemplateError> {
        match self {
            Self::Inline(markup) => Ok(markup.clone()),
            Self::Path(path) => {
                let full = base.join(path);
                std::fs::read_to_string(&full).map_err(|source| TemplateError::Io {
                    path: full,
                    source,
                })
            }
        }
    }

    /// File name of a path template, used as the default output name.
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        match self {
            Self::Inline(_) => None,
            Self::Path(path) => path.file_name(),
        }
    }
}

// ============================================================================
// Comment stripping and whitespace collapsing
// ============================================================================

/// Erase comments and collapse whitespace outside quoted strings.
pub fn collapse_whitespace(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut pending = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            quote @ ('"' | '\'') => {
                if let Some(end) = quoted_end(&chars, i, quote) {
                    flush(&mut pending, &mut out);
                    out.extend(&chars[i..end]);
                    i = end;
                    continue;
                }
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                if let Some(end) = line_comment_end(&chars, i) {
                    i = end;
                    continue;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                if let Some(end) = block_comment_end(&chars, i) {
                    i = end;
                    continue;
                }
            }
            _ => {}
        }
        pending.push(chars[i]);
        i += 1;
    }
    flush(&mut pending, &mut out);
    out
}

/// End index (exclusive) of a quoted string starting at `start`.
///
/// A backslash escapes any character except a line break.
fn quoted_end(chars: &[char], start: usize, quote: char) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => match chars.get(i + 1) {
                Some('\n' | '\r') | None => return None,
                Some(_) => i += 2,
            },
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// End index (exclusive) of a `//` comment, including its line break.
fn line_comment_end(chars: &[char], start: usize) -> Option<usize> {
    chars[start + 2..]
        .iter()
        .position(|&c| c == '\n' || c == '\r')
        .map(|offset| start + 2 + offset + 1)
}

/// End index (exclusive) of a `/* */` comment.
fn block_comment_end(chars: &[char], start: usize) -> Option<usize> {
    chars[start + 2..]
        .windows(2)
        .position(|w| w == ['*', '/'])
        .map(|offset| start + 2 + offset + 2)
}

fn is_collapsible(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\r' | '\t' | '\u{0C}' | '\u{A0}')
}

/// Collapse whitespace runs in `pending` into `out` and clear it.
fn flush(pending: &mut String, out: &mut String) {
    let mut run = String::new();
    for c in pending.chars() {
        if is_collapsible(c) {
            run.push(c);
        } else {
            collapse_run(&run, out);
            run.clear();
            out.push(c);
        }
    }
    collapse_run(&run, out);
    pending.clear();
}

fn collapse_run(run: &str, out: &mut String) {
    if run.is_empty() {
        return;
    }
    if run == "\t" {
        out.push('\t');
        return;
    }
    let mut in_plain = false;
    for c in run.chars() {
        if c == '\u{A0}' {
            out.push(c);
            in_plain = false;
        } else if !in_plain {
            out.push(' ');
            in_plain = true;
        }
    }
}
