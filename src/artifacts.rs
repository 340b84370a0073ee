//! Final artifact list: scanned files plus caller-supplied externals.
//!
//! Externals are spliced in input order. Each `pos = "before"` external goes
//! to a front cursor that advances after every insert, so several "before"
//! externals keep their relative order and all precede the scanned files.
//! Anything else is appended:
//!
//! ```text
//! scanned    = [app.js, site.css]
//! externals  = [a (before), b, c (before)]
//! final      = [a, c, app.js, site.css, b]
//! ```
//!
//! The ignore pattern is applied later, during injection: an ignored entry
//! keeps its slot here but produces no markup and no hashing side effects.

use crate::types::{Artifact, Placement};
use regex::Regex;

/// Merge externals into the scanned list.
pub fn build_list(scanned: Vec<Artifact>, externals: &[Artifact]) -> Vec<Artifact> {
    let mut list = scanned;
    let mut cursor = 0;
    for external in externals {
        if external.placement == Placement::Before {
            list.insert(cursor, external.clone());
            cursor += 1;
        } else {
            list.push(external.clone());
        }
    }
    list
}

/// Whether `artifact` is excluded from injection by the ignore pattern.
pub fn is_ignored(artifact: &Artifact, pattern: Option<&Regex>) -> bool {
    pattern.is_some_and(|re| re.is_match(&artifact.path))
}
