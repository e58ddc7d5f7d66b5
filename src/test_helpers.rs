//! Shared test utilities for the lesson-pack test suite.
//!
//! Builders for configs and page trees, a map-backed template source, and
//! small package extractors.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut config = sample_config();
//! config.pages = page_tree(&[
//!     ("Introduction", &[]),
//!     ("Storm Surge", &["What is surge?", "Wind setup"]),
//! ]);
//! assert_eq!(titles(&config.pages.walk())[1], "Storm Surge");
//! ```

use std::collections::HashMap;

use crate::assemble::{EmbeddedTemplates, FetchError, Package, TemplateSource};
use crate::config::LessonConfig;
use crate::pages::{Page, PageTree};

// =========================================================================
// Builders
// =========================================================================

/// A valid legacy lesson: "Storm Surge Basics" with units A, B, C.
pub fn sample_config() -> LessonConfig {
    LessonConfig {
        language: "en".into(),
        title: "Storm Surge Basics".into(),
        lesson_id: "1042".into(),
        pages: page_tree(&[("A", &[]), ("B", &[]), ("C", &[])]),
        ..LessonConfig::default()
    }
}

/// Build a two-level tree through `add_page`, so ids, orders and paths are
/// the ones authoring would produce.
pub fn page_tree(shape: &[(&str, &[&str])]) -> PageTree {
    let mut tree = PageTree::default();
    for (title, children) in shape {
        let id = tree.add_page(None).unwrap();
        tree.page_mut(&id).unwrap().title = title.to_string();
        for child in *children {
            let child_id = tree.add_page(Some(&id)).unwrap();
            tree.page_mut(&child_id).unwrap().title = child.to_string();
        }
    }
    tree
}

/// Titles of a page list, in list order.
pub fn titles<'a>(pages: &[&'a Page]) -> Vec<&'a str> {
    pages.iter().map(|p| p.title.as_str()).collect()
}

// =========================================================================
// Template source
// =========================================================================

/// In-memory template source.
#[derive(Debug, Default)]
pub struct MapTemplates {
    files: HashMap<String, Vec<u8>>,
}

impl MapTemplates {
    /// Every embedded template except `missing`.
    pub fn embedded_without(missing: &[&str]) -> Self {
        let mut source = Self::default();
        for path in EmbeddedTemplates::paths().filter(|p| !missing.contains(p)) {
            source.insert(path, EmbeddedTemplates.fetch(path).unwrap());
        }
        source
    }

    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) {
        self.files.insert(path.to_string(), bytes);
    }
}

impl TemplateSource for MapTemplates {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}

// =========================================================================
// Package extractors
// =========================================================================

/// Legacy unit files (`print_<N>.php`), sorted by N.
pub fn unit_files(package: &Package) -> Vec<&str> {
    let mut units: Vec<(u32, &str)> = package
        .paths()
        .into_iter()
        .filter_map(|path| {
            let n = path.strip_prefix("print_")?.strip_suffix(".php")?;
            Some((n.parse().ok()?, path))
        })
        .collect();
    units.sort_unstable();
    units.into_iter().map(|(_, path)| path).collect()
}
