//! Lesson configuration module.
//!
//! Handles loading, validating, and merging `lesson.toml`. The file holds every
//! authoring choice except the page tree (which lives in `menu.json`) and the
//! media files (which live under `assets/`).
//!
//! ## Project Layout
//!
//! ```text
//! my-lesson/
//! ├── lesson.toml        # This configuration (optional, defaults apply)
//! ├── menu.json          # Page tree in the menu import format
//! └── assets/            # Media files, classified by extension
//!     ├── diagram.png
//!     └── narration.mp3
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! language = "en"           # en, es, fr (anything else falls back to en)
//! title = "Storm Surge Basics"
//! lesson_id = "1042"
//! path = "/lessons/storm_surge/"
//! description = "How storm surge forms and why it matters."
//! keywords = "storm surge, coastal flooding"
//! theme = "default"
//! variant = "legacy"        # legacy | standard
//! framework = false         # ship the responsive CSS/JS framework
//! # copyright_year = 2024   # defaults to the current year
//! # cover_credit = "Photo: NOAA"
//! # custom_page_title = "Field Notes"
//!
//! [publication]
//! month = ""                # blank = current month
//! year = ""                 # blank = current year
//! version = "1.0"
//! created = ""              # blank = today (YYYY-MM-DD)
//! modified = ""
//!
//! [features]
//! quiz = false
//! glossary = false
//! # ... see `stock_config_toml()` for the full list
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::pages::PageTree;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file inside a lesson project.
pub const CONFIG_FILENAME: &str = "lesson.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Lesson is not ready for export:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

/// The output-layout flavor of an export.
///
/// Exactly one is selected at all times; `Legacy` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVariant {
    /// PHP-based package with one `print_<N>.php` per unit.
    #[default]
    Legacy,
    /// Static HTML package with one page per tree node.
    Standard,
}

impl TemplateVariant {
    pub const ALL: [TemplateVariant; 2] = [TemplateVariant::Legacy, TemplateVariant::Standard];

    /// Lowercase name, used in markers, archive suffixes and TOML.
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateVariant::Legacy => "legacy",
            TemplateVariant::Standard => "standard",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lesson configuration loaded from `lesson.toml`.
///
/// All fields have defaults. The page tree is not part of the file; it is
/// attached by the project loader or built up in a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LessonConfig {
    /// Language code (`en`, `es`, `fr`, or a regional form like `es-MX`).
    pub language: String,
    pub title: String,
    /// Lesson identifier; numeric in most catalogs but kept as text.
    pub lesson_id: String,
    /// Deployment path on the hosting server.
    pub path: String,
    pub description: String,
    /// Comma-joined keyword list.
    pub keywords: String,
    pub publication: PublicationConfig,
    /// Template theme identifier.
    pub theme: String,
    /// Overrides the copyright year (defaults to the current year).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_year: Option<i32>,
    /// Overrides the cover image credit line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_credit: Option<String>,
    pub variant: TemplateVariant,
    /// Ship the responsive CSS framework (`css/framework.css`, `js/`).
    pub framework: bool,
    pub features: FeatureFlags,
    /// Title of the custom sub-page (required when `features.custom_page`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_page_title: Option<String>,
    #[serde(skip)]
    pub pages: PageTree,
}

impl LessonConfig {
    /// Check that the lesson can be exported.
    ///
    /// Collects every problem instead of stopping at the first one, so the
    /// author can fix them all before retrying.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push("title must not be empty".to_string());
        }
        if self.pages.is_empty() {
            problems.push("lesson must have at least one page".to_string());
        }
        if self.features.custom_page
            && self
                .custom_page_title
                .as_deref()
                .is_none_or(|t| t.trim().is_empty())
        {
            problems.push("custom_page_title is required when features.custom_page is on".into());
        }
        if let Some(year) = self.copyright_year.filter(|y| !(1900..=9999).contains(y)) {
            problems.push(format!("copyright_year {year} is out of range"));
        }
        problems.extend(self.pages.structure_problems());

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems))
        }
    }
}

/// Publication metadata. Blank fields are filled from the current date at
/// export time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublicationConfig {
    pub month: String,
    pub year: String,
    pub version: String,
    /// Creation date, `YYYY-MM-DD`.
    pub created: String,
    /// Last modification date, `YYYY-MM-DD`.
    pub modified: String,
}

/// Independent feature toggles. All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureFlags {
    pub quiz: bool,
    pub glossary: bool,
    pub references: bool,
    pub resources: bool,
    /// Show the narrated-text toggle on pages with audio.
    pub narrated_text: bool,
    /// Additional top-level pages beyond the units.
    pub additional_pages: bool,
    pub contributors_page: bool,
    pub custom_page: bool,
    pub references_page: bool,
    pub resources_page: bool,
    pub printable: bool,
    pub progress_tracking: bool,
    pub accessibility: bool,
    pub mobile_optimization: bool,
}

/// A named feature, as referenced by `<% if feature NAME %>` markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Framework,
    Quiz,
    Glossary,
    References,
    Resources,
    NarratedText,
    AdditionalPages,
    ContributorsPage,
    CustomPage,
    ReferencesPage,
    ResourcesPage,
    Printable,
    ProgressTracking,
    Accessibility,
    MobileOptimization,
}

impl Feature {
    pub const ALL: [Feature; 15] = [
        Feature::Framework,
        Feature::Quiz,
        Feature::Glossary,
        Feature::References,
        Feature::Resources,
        Feature::NarratedText,
        Feature::AdditionalPages,
        Feature::ContributorsPage,
        Feature::CustomPage,
        Feature::ReferencesPage,
        Feature::ResourcesPage,
        Feature::Printable,
        Feature::ProgressTracking,
        Feature::Accessibility,
        Feature::MobileOptimization,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Framework => "framework",
            Feature::Quiz => "quiz",
            Feature::Glossary => "glossary",
            Feature::References => "references",
            Feature::Resources => "resources",
            Feature::NarratedText => "narrated_text",
            Feature::AdditionalPages => "additional_pages",
            Feature::ContributorsPage => "contributors_page",
            Feature::CustomPage => "custom_page",
            Feature::ReferencesPage => "references_page",
            Feature::ResourcesPage => "resources_page",
            Feature::Printable => "printable",
            Feature::ProgressTracking => "progress_tracking",
            Feature::Accessibility => "accessibility",
            Feature::MobileOptimization => "mobile_optimization",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Whether this feature is on for the given config.
    pub fn enabled_in(self, config: &LessonConfig) -> bool {
        let f = &config.features;
        match self {
            Feature::Framework => config.framework,
            Feature::Quiz => f.quiz,
            Feature::Glossary => f.glossary,
            Feature::References => f.references,
            Feature::Resources => f.resources,
            Feature::NarratedText => f.narrated_text,
            Feature::AdditionalPages => f.additional_pages,
            Feature::ContributorsPage => f.contributors_page,
            Feature::CustomPage => f.custom_page,
            Feature::ReferencesPage => f.references_page,
            Feature::ResourcesPage => f.resources_page,
            Feature::Printable => f.printable,
            Feature::ProgressTracking => f.progress_tracking,
            Feature::Accessibility => f.accessibility,
            Feature::MobileOptimization => f.mobile_optimization,
        }
    }
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LessonConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `lesson.toml` from a project directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults and deserialize.
///
/// Export readiness is not checked here; call [`LessonConfig::validate`]
/// once the page tree is attached.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LessonConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Load `lesson.toml` from the given directory, falling back to defaults.
pub fn load_config(dir: &Path) -> Result<LessonConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `lesson.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lesson Configuration
# ====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.
#
# The page tree is read from menu.json next to this file, and media files
# from the assets/ directory.

# Lesson language: en, es or fr. Anything else falls back to en.
language = ""

# Lesson title. Required for export.
title = ""

# Catalog identifier of the lesson.
lesson_id = ""

# Deployment path on the hosting server.
path = ""

# Short description, used in <meta name="description">.
description = ""

# Comma-separated keywords, used in <meta name="keywords">.
keywords = ""

# Template theme identifier.
theme = ""

# Output layout: "legacy" (PHP pages, print_<N>.php per unit)
# or "standard" (static HTML, one page per tree node).
variant = "legacy"

# Ship the responsive CSS framework and its runtime script.
framework = false

# Copyright year. Omit to use the current year.
# copyright_year = 2024

# Credit line for the cover image.
# cover_credit = ""

# Title of the custom sub-page (required when features.custom_page = true).
# custom_page_title = ""

# ---------------------------------------------------------------------------
# Publication metadata. Blank values are filled from the export date.
# ---------------------------------------------------------------------------
[publication]
month = ""
year = ""
version = ""
created = ""
modified = ""

# ---------------------------------------------------------------------------
# Feature toggles
# ---------------------------------------------------------------------------
[features]
quiz = false
glossary = false
references = false
resources = false
narrated_text = false
additional_pages = false
contributors_page = false
custom_page = false
references_page = false
resources_page = false
printable = false
progress_tracking = false
accessibility = false
mobile_optimization = false
"##
}
