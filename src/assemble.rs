//! Package assembly.
//!
//! Builds the complete file set of one export from a lesson snapshot:
//!
//! ```text
//! 1. Resolve   config            →  Variables
//! 2. Fetch     static manifest   →  template bytes   (parallel, joined)
//! 3. Render    text templates    →  substituted files
//! 4. Generate  page tree         →  unit / content pages, menu.json
//! 5. Place     assets            →  assets/<kind>s/<name>
//! ```
//!
//! ## Output Structure (legacy)
//!
//! ```text
//! index.htm  template.php  download.php  nav.php  nav_{en,es,fr}.php
//! menu.json  lesson.json               # page tree, resolved variables
//! print_1.php … print_N.php     # one per level-1 page, by position
//! css/base.css
//! css/framework.css  js/framework.js   # framework flag
//! glossary.php  references.php         # feature flags
//! assets/images/… assets/videos/… assets/audios/… assets/documents/…
//! ```
//!
//! ## Output Structure (standard)
//!
//! ```text
//! index.html  menu.json  js/lesson.js  css/base.css
//! pages/<l1>-<l2>-<l3>.html     # one per page, every level
//! print.html                    # printable feature
//! css/framework.css  js/framework.js  glossary.html  references.html
//! assets/…
//! ```
//!
//! ## Determinism
//!
//! The same snapshot always yields the same files, except for variables
//! that default to the current date. Files are kept sorted by path.
//!
//! ## Missing Templates
//!
//! A static template that cannot be fetched is skipped with a warning and
//! recorded in [`Package::skipped`]; the rest of the package is still built.
//! [`Package::is_complete`] tells the two outcomes apart.

use crate::assets::AssetFile;
use crate::config::{Feature, LessonConfig, TemplateVariant};
use crate::generate;
use crate::pages::export_tree;
use crate::session::Snapshot;
use crate::template::{Template, TemplateIssue};
use crate::variables::{Variables, resolve_variables, resolve_variables_at};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Resolved variables for PHP pages, written into legacy packages.
pub const LESSON_METADATA: &str = "lesson.json";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("template {0} does not exist")]
    NotFound(String),
    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// What a file in the package holds. Text kinds go through the template
/// interpreter; the others are copied byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Markup,
    Style,
    Script,
    ServerPage,
    Data,
    Binary,
}

impl ContentKind {
    pub fn from_path(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "htm" | "html" => ContentKind::Markup,
            "css" => ContentKind::Style,
            "js" => ContentKind::Script,
            "php" => ContentKind::ServerPage,
            "json" => ContentKind::Data,
            _ => ContentKind::Binary,
        }
    }

    /// Whether templates of this kind get variable substitution.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            ContentKind::Markup | ContentKind::Style | ContentKind::Script | ContentKind::ServerPage
        )
    }
}

/// One file of the assembled package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub path: String,
    pub contents: Vec<u8>,
    pub kind: ContentKind,
}

/// A static template that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// The assembled file set of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    files: BTreeMap<String, PackageFile>,
    skipped: Vec<SkippedFile>,
    issues: Vec<(String, TemplateIssue)>,
}

impl Package {
    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = &PackageFile> {
        self.files.values()
    }

    pub fn get(&self, path: &str) -> Option<&PackageFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Static templates left out because they could not be fetched.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Template markers left untouched, by output path.
    pub fn issues(&self) -> &[(String, TemplateIssue)] {
        &self.issues
    }

    /// True when every static template made it into the package.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Text of a file, if it is valid UTF-8.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path)
            .and_then(|f| std::str::from_utf8(&f.contents).ok())
    }

    fn insert(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        let path = path.into();
        let kind = ContentKind::from_path(&path);
        self.insert_as(path, contents, kind);
    }

    /// Insert with an explicit kind. Uploaded assets are always binary.
    fn insert_as(&mut self, path: impl Into<String>, contents: Vec<u8>, kind: ContentKind) {
        let path = path.into();
        let file = PackageFile {
            path: path.clone(),
            contents,
            kind,
        };
        if self.files.insert(path.clone(), file).is_some() {
            tracing::warn!(%path, "duplicate package path, keeping the later file");
        }
    }
}

// ============================================================================
// Template sources
// ============================================================================

/// Where static template bytes come from.
pub trait TemplateSource: Sync {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Templates compiled into the binary from `templates/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplates;

macro_rules! embedded {
    ($($path:literal),* $(,)?) => {
        &[$(($path, include_bytes!(concat!("../templates/", $path)) as &[u8])),*]
    };
}

static EMBEDDED: &[(&str, &[u8])] = embedded![
    "legacy/index.htm",
    "legacy/template.php",
    "legacy/download.php",
    "legacy/nav.php",
    "legacy/nav_en.php",
    "legacy/nav_es.php",
    "legacy/nav_fr.php",
    "legacy/glossary.php",
    "legacy/references.php",
    "standard/index.html",
    "standard/glossary.html",
    "standard/references.html",
    "standard/js/lesson.js",
    "shared/css/base.css",
    "shared/css/framework.css",
    "shared/js/framework.js",
];

impl EmbeddedTemplates {
    /// Every embedded template path.
    pub fn paths() -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(path, _)| *path)
    }
}

impl TemplateSource for EmbeddedTemplates {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        EMBEDDED
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, bytes)| bytes.to_vec())
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

/// Templates read from a directory laid out like `templates/`.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    root: PathBuf,
}

impl DirTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateSource for DirTemplates {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(FetchError::NotFound(path.to_string()));
        }
        std::fs::read(&full).map_err(|source| FetchError::Io {
            path: path.to_string(),
            source,
        })
    }
}

// ============================================================================
// Static manifest
// ============================================================================

/// A static file of the package: where it lands, which template feeds it,
/// and the feature that must be on for it to ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestEntry {
    pub output: &'static str,
    pub template: &'static str,
    pub when: Option<Feature>,
}

const fn entry(output: &'static str, template: &'static str) -> ManifestEntry {
    ManifestEntry {
        output,
        template,
        when: None,
    }
}

const fn gated(output: &'static str, template: &'static str, feature: Feature) -> ManifestEntry {
    ManifestEntry {
        output,
        template,
        when: Some(feature),
    }
}

const LEGACY_MANIFEST: &[ManifestEntry] = &[
    entry("index.htm", "legacy/index.htm"),
    entry("template.php", "legacy/template.php"),
    entry("download.php", "legacy/download.php"),
    entry("nav.php", "legacy/nav.php"),
    entry("nav_en.php", "legacy/nav_en.php"),
    entry("nav_es.php", "legacy/nav_es.php"),
    entry("nav_fr.php", "legacy/nav_fr.php"),
    entry("css/base.css", "shared/css/base.css"),
    gated("css/framework.css", "shared/css/framework.css", Feature::Framework),
    gated("js/framework.js", "shared/js/framework.js", Feature::Framework),
    gated("glossary.php", "legacy/glossary.php", Feature::Glossary),
    gated("references.php", "legacy/references.php", Feature::References),
];

const STANDARD_MANIFEST: &[ManifestEntry] = &[
    entry("index.html", "standard/index.html"),
    entry("js/lesson.js", "standard/js/lesson.js"),
    entry("css/base.css", "shared/css/base.css"),
    gated("css/framework.css", "shared/css/framework.css", Feature::Framework),
    gated("js/framework.js", "shared/js/framework.js", Feature::Framework),
    gated("glossary.html", "standard/glossary.html", Feature::Glossary),
    gated("references.html", "standard/references.html", Feature::References),
];

/// Static files shipped for this config's variant and feature flags.
pub fn static_manifest(config: &LessonConfig) -> Vec<ManifestEntry> {
    let all = match config.variant {
        TemplateVariant::Legacy => LEGACY_MANIFEST,
        TemplateVariant::Standard => STANDARD_MANIFEST,
    };
    all.iter()
        .filter(|e| e.when.is_none_or(|f| f.enabled_in(config)))
        .copied()
        .collect()
}

// ============================================================================
// Assembly
// ============================================================================

/// Assemble the package, using today's date for date defaults.
pub fn assemble(snapshot: &Snapshot, source: &dyn TemplateSource) -> Package {
    let vars = resolve_variables(&snapshot.config);
    build(&snapshot.config, &snapshot.assets, source, vars)
}

/// Assemble the package with an explicit "today".
pub fn assemble_at(snapshot: &Snapshot, source: &dyn TemplateSource, today: NaiveDate) -> Package {
    let vars = resolve_variables_at(&snapshot.config, today);
    build(&snapshot.config, &snapshot.assets, source, vars)
}

fn build(
    config: &LessonConfig,
    assets: &[AssetFile],
    source: &dyn TemplateSource,
    vars: Variables,
) -> Package {
    let mut package = Package::default();

    // Fetches are independent; all resolve before anything is added.
    let manifest = static_manifest(config);
    let fetched: Vec<(ManifestEntry, Result<Vec<u8>, FetchError>)> = manifest
        .par_iter()
        .map(|entry| (*entry, source.fetch(entry.template)))
        .collect();

    for (entry, result) in fetched {
        match result {
            Ok(bytes) => add_static(&mut package, entry.output, bytes, config, &vars),
            Err(err) => {
                tracing::warn!(path = entry.output, error = %err, "static template skipped");
                package.skipped.push(SkippedFile {
                    path: entry.output.to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    add_generated(&mut package, config, &vars);

    for asset in assets {
        package.insert_as(asset.path(), asset.data.clone(), ContentKind::Binary);
    }

    package
}

fn add_static(
    package: &mut Package,
    output: &str,
    bytes: Vec<u8>,
    config: &LessonConfig,
    vars: &Variables,
) {
    if !ContentKind::from_path(output).is_text() {
        package.insert(output, bytes);
        return;
    }
    let source = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = output, "template is not UTF-8, copying unchanged");
            package.insert(output, err.into_bytes());
            return;
        }
    };

    let rendered = Template::parse(&source).render(config, vars);
    for issue in rendered.issues {
        tracing::warn!(path = output, %issue, "template marker left in output");
        package.issues.push((output.to_string(), issue));
    }
    package.insert(output, rendered.text.into_bytes());
}

fn add_generated(package: &mut Package, config: &LessonConfig, vars: &Variables) {
    let tree = &config.pages;

    match config.variant {
        TemplateVariant::Legacy => {
            // Keyed by position, never by id: reordering moves units between files.
            for (index, unit) in tree.units().into_iter().enumerate() {
                let position = index + 1;
                let html = generate::render_unit_page(unit, position, config, vars);
                package.insert(generate::unit_page_filename(position), html.into_bytes());
            }
            // Read by template.php and download.php
            match serde_json::to_vec_pretty(&vars.to_json()) {
                Ok(json) => package.insert(LESSON_METADATA, json),
                Err(err) => tracing::warn!(error = %err, "lesson.json not written"),
            }
        }
        TemplateVariant::Standard => {
            for page in tree.walk() {
                let html = generate::render_content_page(page, tree, config, vars);
                package.insert(
                    generate::content_page_filename(page),
                    html.into_string().into_bytes(),
                );
            }
            if Feature::Printable.enabled_in(config) {
                let html = generate::render_print_page(tree, config, vars);
                package.insert("print.html", html.into_string().into_bytes());
            }
        }
    }

    match serde_json::to_vec_pretty(&export_tree(tree)) {
        Ok(json) => package.insert("menu.json", json),
        Err(err) => tracing::warn!(error = %err, "menu.json not written"),
    }
}
