//! # html-inject
//!
//! Post-build HTML injection for bundler output. Once a build has written its
//! chunks, the output directory is scanned for scripts and stylesheets and a
//! tag for each one is written into an HTML template.
//!
//! # Pipeline
//!
//! ```text
//! 1. Resolve   options + build event  →  BuildContext  (entry, output dir, destination)
//! 2. Template  inline or file         →  Document      (whitespace collapsed, parsed)
//! 3. Scan      output dir             →  Vec<Artifact> (+ externals spliced in)
//! 4. Inject    artifacts              →  tags          (hash rewrite, URL, markup)
//! 5. Write     Document               →  dest file     (staged, atomic)
//! ```
//!
//! The whole run is [`pipeline::run`]. Each stage is a plain function over
//! plain data, so unit tests exercise them without a bundler.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Entry point: [`pipeline::run`], build event types, run report |
//! | [`scan`] | Recursive walk of the output directory for `.js` and `.css` files |
//! | [`artifacts`] | Splices externals into the scanned list; ignore matching |
//! | [`template`] | Template source (inline or file) and whitespace collapsing |
//! | [`document`] | Event-stream HTML document with head/body insertion points |
//! | [`inject`] | Hash rewrite, reference URLs, favicon and tag emission |
//! | [`hash`] | Content digests and placeholder substitution in file names |
//! | [`writer`] | Staged atomic writes and hashed renames |
//! | [`config`] | `html-inject.toml` loading, stock defaults, validation |
//! | [`types`] | `Artifact` and its enums, shared by config and scan |
//! | [`logging`] | `tracing` subscriber setup for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Streaming Instead of a DOM
//!
//! The template is never built into a tree. [`document::Document`] replays
//! the parser's event stream and writes the queued fragments just before
//! `</head>` and `</body>`. Everything else passes through byte for byte:
//! attribute quoting, comments, doctype and unusual markup survive untouched.
//!
//! ## Content Hashing After the Build
//!
//! Hashes are computed from the final bytes (and, with sourcemaps, after the
//! `sourceMappingURL` comment points at the hashed map), so the name changes
//! exactly when the served content does. SHA-256 hex, optionally truncated
//! with `hash_length`.
//!
//! ## URLs Are Opaque
//!
//! Artifacts given as `https://…` or `//…` are referenced verbatim. They are
//! never hashed, relativized or rewritten by `online_path`.

pub mod artifacts;
pub mod config;
pub mod document;
pub mod hash;
pub mod inject;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod template;
pub mod types;
pub mod writer;

pub use pipeline::{BuildEvent, ChunkInfo, RunReport, run, run_in};

#[cfg(test)]
pub(crate) mod test_helpers;
