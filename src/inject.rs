//! Tag injection.
//!
//! Stage 3 of the pipeline. Walks the final artifact list and, for each
//! artifact not matched by the ignore pattern:
//!
//! 1. **Hash rewrite** — if the file name carries the placeholder, the final
//!    content is hashed and the file renamed (`app.[hash].js` →
//!    `app.9c1e….js`). The entry chunk's content comes from the build's
//!    in-memory code; everything else is read from disk. With sourcemaps on,
//!    `<file>.map` is renamed first and the code's `sourceMappingURL` comment
//!    repointed, so the code digest covers the final reference.
//! 2. **Reference URL** — see [`reference_url`].
//! 3. **Favicon** — a shortcut-icon link, per [`FaviconMode`].
//! 4. **Markup** — scripts go to head when the artifact or the global target
//!    says so, otherwise body; stylesheets always go to head.
//!
//! Any filesystem failure aborts the run. Renames already performed are not
//! rolled back, but each one is individually atomic (see [`crate::writer`]).

use crate::artifacts::is_ignored;
use crate::config::{ConfigError, FaviconMode, InjectConfig};
use crate::document::{Document, DocumentError, Section};
use crate::hash;
use crate::pipeline::BuildEvent;
use crate::scan::ScanError;
use crate::template::{TemplateError, TemplateSource};
use crate::types::{Artifact, ArtifactKind, InjectTarget};
use crate::writer::{self, WriteError};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum InjectError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Path error: {0}")]
    Path(String),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
    #[error("Sourcemaps are enabled but {0} does not exist")]
    MissingSourcemap(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The build's primary output.
#[derive(Debug, Clone)]
pub struct EntryChunk {
    /// Absolute, normalized path of the entry file.
    pub path: PathBuf,
    /// Final code held in memory by the bundler, if reported.
    pub code: Option<String>,
    /// Whether the build emitted sourcemaps.
    pub sourcemap: bool,
}

/// Everything one run needs, resolved once and read-only afterwards.
///
/// All paths are absolute and lexically normalized against `cwd`.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub cwd: PathBuf,
    pub output_dir: PathBuf,
    pub destination: PathBuf,
    pub template: TemplateSource,
    pub entry: EntryChunk,
    pub inject: InjectTarget,
    pub absolute: bool,
    pub ignore: Option<Regex>,
    pub online_path: Option<String>,
    pub defer: bool,
    pub favicon: Option<String>,
    pub favicon_mode: FaviconMode,
    pub hash_placeholder: String,
    pub hash_length: Option<usize>,
}

impl BuildContext {
    /// Derive the run context from options and the build event.
    ///
    /// The entry file is the last chunk flagged `is_entry`, else
    /// `config.filename`. The output directory is `config.dest`, else the
    /// entry file's first directory relative to `cwd`.
    pub fn resolve(
        config: &InjectConfig,
        event: &BuildEvent,
        cwd: &Path,
    ) -> Result<Self, InjectError> {
        config.validate()?;
        let cwd = normalize(cwd);

        let template = config
            .template
            .clone()
            .ok_or_else(|| ConfigError::Validation("no template configured".into()))?;

        let chunk = event.entry_chunk();
        let entry_name = chunk
            .map(|c| c.file_name.as_str())
            .or(config.filename.as_deref())
            .ok_or_else(|| {
                ConfigError::Validation(
                    "build reported no entry chunk and no filename is configured".into(),
                )
            })?;
        let entry_path = normalize(&cwd.join(entry_name));

        let output_dir = match &config.dest {
            Some(dest) => normalize(&cwd.join(dest)),
            None => cwd.join(output_dir_from_entry(&entry_path, &cwd)?),
        };

        let dest_name = match (&config.filename, template.file_name()) {
            (Some(name), _) => PathBuf::from(name),
            (None, Some(name)) => PathBuf::from(name),
            (None, None) => {
                return Err(ConfigError::Validation(
                    "an inline template needs `filename` for the output document".into(),
                )
                .into());
            }
        };

        Ok(Self {
            destination: output_dir.join(dest_name),
            output_dir,
            template,
            entry: EntryChunk {
                path: entry_path,
                code: event.entry_code.clone(),
                sourcemap: chunk.is_some_and(|c| c.sourcemap),
            },
            inject: config.inject,
            absolute: config.absolute,
            ignore: config.ignore_pattern()?,
            online_path: config.online_path.clone(),
            defer: config.defer,
            favicon: config.favicon.clone(),
            favicon_mode: config.favicon_mode,
            hash_placeholder: config.hash_placeholder.clone(),
            hash_length: config.hash_length,
            cwd,
        })
    }

    /// Absolute filesystem path for an artifact path.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        normalize(&self.cwd.join(path))
    }
}

/// First directory of `entry` relative to `cwd` (`dist/js/app.js` → `dist`).
fn output_dir_from_entry(entry: &Path, cwd: &Path) -> Result<PathBuf, InjectError> {
    let rel = entry.strip_prefix(cwd).map_err(|_| {
        InjectError::Path(format!(
            "entry file {} is outside {}; set `dest`",
            entry.display(),
            cwd.display()
        ))
    })?;
    let mut components = rel.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(first)), Some(_)) => Ok(PathBuf::from(first)),
        _ => Err(InjectError::Path(format!(
            "cannot derive an output directory from entry file {}; set `dest`",
            rel.display()
        ))),
    }
}

/// What [`inject`] did, for reporting.
#[derive(Debug, Default)]
pub struct InjectReport {
    pub tags: Vec<InjectedTag>,
    pub renamed: Vec<Rename>,
    /// Paths skipped by the ignore pattern.
    pub ignored: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedTag {
    pub kind: ArtifactKind,
    pub url: String,
    pub section: Section,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Append a tag for every non-ignored artifact, hashing file names on the way.
pub fn inject(
    document: &mut Document,
    artifacts: &[Artifact],
    ctx: &BuildContext,
) -> Result<InjectReport, InjectError> {
    let mut report = InjectReport::default();

    for artifact in artifacts {
        if is_ignored(artifact, ctx.ignore.as_ref()) {
            debug!("ignored {}", artifact.path);
            report.ignored.push(artifact.path.clone());
            continue;
        }

        let mut path = artifact.path.clone();
        if !is_url(&path) && hash::has_placeholder(Path::new(&path), &ctx.hash_placeholder) {
            let rename = rewrite_hashed(artifact, ctx)?;
            path = rename.to.to_string_lossy().into_owned();
            report.renamed.push(rename);
        }

        let mut url = reference_url(&path, ctx);
        if artifact.timestamp {
            url.push_str(&format!("?t={}", epoch_millis()));
        }

        if let Some(favicon) = &ctx.favicon {
            match ctx.favicon_mode {
                FaviconMode::Once if document.has_shortcut_icon() => {}
                _ => document.append(Section::Head, favicon_tag(favicon)),
            }
        }

        let Some((section, tag)) = render_tag(artifact, &url, ctx) else {
            debug!("no markup for {} (type '{}')", artifact.path, artifact.kind);
            continue;
        };
        debug!("{section} <- {url}");
        document.append(section, tag);
        report.tags.push(InjectedTag {
            kind: artifact.kind.clone(),
            url,
            section,
        });
    }

    Ok(report)
}

// ============================================================================
// Hash rewriting
// ============================================================================

fn read_text(path: &Path) -> Result<String, InjectError> {
    fs::read_to_string(path).map_err(|source| InjectError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn sourcemap_comment(target: &str) -> String {
    format!("//# sourceMappingURL={target}")
}

/// Hash `artifact`'s final content and move it to its hashed name.
fn rewrite_hashed(artifact: &Artifact, ctx: &BuildContext) -> Result<Rename, InjectError> {
    let file = ctx.resolve_path(&artifact.path);
    let name = artifact.basename();
    let map_ref = sourcemap_comment(&format!("{name}.map"));
    let placeholder = ctx.hash_placeholder.as_str();

    let mut code = match &ctx.entry.code {
        Some(entry_code) if file == ctx.entry.path => {
            let mut code = entry_code.clone();
            if !code.contains(&map_ref) {
                code.push_str(&map_ref);
            }
            code
        }
        _ => read_text(&file)?,
    };

    if ctx.entry.sourcemap {
        let mut map_file = file.clone().into_os_string();
        map_file.push(".map");
        let map_file = PathBuf::from(map_file);

        if map_file.exists() {
            let map_code = fs::read(&map_file).map_err(|source| InjectError::Read {
                path: map_file.clone(),
                source,
            })?;
            let digest = hash::hash_bytes(&map_code);
            let hashed_map = hash::apply_hash(
                &map_file,
                placeholder,
                hash::shorten(&digest, ctx.hash_length),
            );
            writer::replace_hashed(&map_file, &hashed_map, &map_code)?;
            info!("hashed {} -> {}", map_file.display(), hashed_map.display());

            let new_name = hashed_map
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            code = code.replacen(&map_ref, &sourcemap_comment(&new_name), 1);
        } else if artifact.is_script() {
            return Err(InjectError::MissingSourcemap(map_file));
        }
    }

    let digest = hash::hash_bytes(code.as_bytes());
    let hashed = hash::apply_hash(&file, placeholder, hash::shorten(&digest, ctx.hash_length));
    writer::replace_hashed(&file, &hashed, code.as_bytes())?;
    info!("hashed {} -> {}", file.display(), hashed.display());

    Ok(Rename {
        from: file,
        to: hashed,
    })
}

// ============================================================================
// Reference URLs
// ============================================================================

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:[a-z]+:)?//").expect("URL pattern must compile"));

/// Whether `path` is an absolute or protocol-relative URL.
pub fn is_url(path: &str) -> bool {
    URL_PATTERN.is_match(path)
}

/// The `src`/`href` value for an artifact path.
///
/// - URL-form paths are returned unchanged, whatever the other settings.
/// - `online_path` replaces everything with `online_path/<file name>`.
/// - Otherwise the path relative to the output directory, with forward
///   slashes, prefixed with `/` in absolute mode.
pub fn reference_url(path: &str, ctx: &BuildContext) -> String {
    if is_url(path) {
        return path.to_string();
    }
    let file = ctx.resolve_path(path);

    if let Some(online) = &ctx.online_path {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let slash = if online.ends_with('/') { "" } else { "/" };
        return format!("{online}{slash}{name}");
    }

    let rel = relative_path(&ctx.output_dir, &file);
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if ctx.absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `target` expressed relative to directory `base`; both absolute.
fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<_> = base.components().collect();
    let target: Vec<_> = target.components().collect();
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component);
    }
    rel
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

// ============================================================================
// Markup
// ============================================================================

pub fn script_tag(src: &str, defer: bool) -> String {
    let defer = if defer { " defer" } else { "" };
    format!("<script type=\"text/javascript\"{defer} src=\"{src}\"></script>\n")
}

pub fn stylesheet_tag(href: &str) -> String {
    format!("<link rel=\"stylesheet\" href=\"{href}\">\n")
}

pub fn favicon_tag(href: &str) -> String {
    format!("<link rel=\"shortcut icon\" href=\"{href}\">")
}

fn render_tag(artifact: &Artifact, url: &str, ctx: &BuildContext) -> Option<(Section, String)> {
    match artifact.kind {
        ArtifactKind::Script => {
            let section = if artifact.inject == InjectTarget::Head || ctx.inject == InjectTarget::Head
            {
                Section::Head
            } else {
                Section::Body
            };
            Some((section, script_tag(url, ctx.defer)))
        }
        ArtifactKind::Stylesheet => Some((Section::Head, stylesheet_tag(url))),
        ArtifactKind::Other(_) => None,
    }
}
