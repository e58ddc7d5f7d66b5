//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Pages and assets lead with a positional index and their title or name;
//! package paths follow as secondary context. The same helpers render the
//! page tree for `check` and `import`, so both commands show a lesson the
//! same way.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Lesson
//!     Storm Surge Basics (en, legacy)
//!     Features: framework, glossary
//!
//! Pages
//! 001 Introduction
//! 002 Storm Surge [inner]
//!     001 What is surge?
//!     002 Wind setup [quiz]
//!
//! Assets
//! 001 diagram.png → assets/images/diagram.png
//!
//! Ready to export: 4 pages, 1 asset
//! ```
//!
//! ## Export
//!
//! ```text
//! Files
//!     assets/images/diagram.png
//!     css/base.css
//!     index.htm
//!     print_1.php
//!
//! Warnings
//!     download.php skipped: template legacy/download.php does not exist
//!     nav.php: unknown variable `titel`
//!
//! Exported 14 files → dist/Storm_Surge_Basics_legacy.zip
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::assemble::Package;
use crate::config::{Feature, LessonConfig};
use crate::pages::{Page, PageType};
use crate::session::Session;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Page header: index, title, and a tag for anything that is not plain content.
///
/// ```text
/// 001 Introduction
/// 002 Storm Surge [inner]
/// 003 Check yourself [quiz]
/// ```
fn page_line(index: usize, page: &Page) -> String {
    let mut line = format!("{} {}", format_index(index), page.title);
    if page.inner_node {
        line.push_str(" [inner]");
    }
    if page.page_type != PageType::Content {
        line.push_str(&format!(" [{}]", page.page_type.as_str()));
    }
    line
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Page tree, siblings in display order, one indent level per tree level.
pub fn format_page_tree(pages: &[Page]) -> Vec<String> {
    fn walk(pages: &[Page], depth: usize, lines: &mut Vec<String>) {
        let mut sorted: Vec<&Page> = pages.iter().collect();
        sorted.sort_by_key(|p| p.order);
        for (i, page) in sorted.into_iter().enumerate() {
            lines.push(format!("{}{}", indent(depth), page_line(i + 1, page)));
            if !page.description.is_empty() {
                lines.push(format!(
                    "{}Description: {}",
                    indent(depth + 1),
                    truncate_desc(&page.description, 60)
                ));
            }
            walk(&page.children, depth + 1, lines);
        }
    }

    let mut lines = Vec::new();
    walk(pages, 0, &mut lines);
    lines
}

fn enabled_features(config: &LessonConfig) -> Vec<&'static str> {
    Feature::ALL
        .into_iter()
        .filter(|f| f.enabled_in(config))
        .map(Feature::name)
        .collect()
}

// ============================================================================
// check
// ============================================================================

/// Format the project summary. `problems` are validation failures, if any.
pub fn format_check_output(session: &Session, problems: &[String]) -> Vec<String> {
    let config = session.config();
    let mut lines = Vec::new();

    lines.push("Lesson".to_string());
    lines.push(format!(
        "    {} ({}, {})",
        if config.title.is_empty() {
            "(untitled)"
        } else {
            config.title.as_str()
        },
        if config.language.is_empty() {
            "en"
        } else {
            config.language.as_str()
        },
        config.variant
    ));
    let features = enabled_features(config);
    if !features.is_empty() {
        lines.push(format!("    Features: {}", features.join(", ")));
    }

    lines.push(String::new());
    lines.push("Pages".to_string());
    lines.extend(format_page_tree(session.pages().pages()));

    let assets = session.assets().files();
    if !assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for (i, asset) in assets.iter().enumerate() {
            lines.push(format!(
                "{} {} \u{2192} {}",
                format_index(i + 1),
                asset.name,
                asset.path()
            ));
        }
    }

    lines.push(String::new());
    if problems.is_empty() {
        lines.push(format!(
            "Ready to export: {}, {}",
            plural(session.pages().len(), "page"),
            plural(assets.len(), "asset")
        ));
    } else {
        lines.push("Not ready to export".to_string());
        for problem in problems {
            lines.push(format!("    - {problem}"));
        }
    }
    lines
}

pub fn print_check_output(session: &Session, problems: &[String]) {
    for line in format_check_output(session, problems) {
        println!("{}", line);
    }
}

// ============================================================================
// export
// ============================================================================

/// Format the export result: file list, warnings, summary.
pub fn format_export_output(package: &Package, archive: &Path) -> Vec<String> {
    let mut lines = vec!["Files".to_string()];
    for path in package.paths() {
        lines.push(format!("    {path}"));
    }

    if !package.skipped().is_empty() || !package.issues().is_empty() {
        lines.push(String::new());
        lines.push("Warnings".to_string());
        for skipped in package.skipped() {
            lines.push(format!("    {} skipped: {}", skipped.path, skipped.reason));
        }
        for (path, issue) in package.issues() {
            lines.push(format!("    {path}: {issue}"));
        }
    }

    lines.push(String::new());
    let mut summary = format!("Exported {}", plural(package.len(), "file"));
    if !package.is_complete() {
        summary.push_str(&format!(
            " (incomplete, {} skipped)",
            package.skipped().len()
        ));
    }
    lines.push(format!("{summary} \u{2192} {}", archive.display()));
    lines
}

pub fn print_export_output(package: &Package, archive: &Path) {
    for line in format_export_output(package, archive) {
        println!("{}", line);
    }
}

// ============================================================================
// import
// ============================================================================

/// Format an imported menu document.
pub fn format_import_output(pages: &[Page]) -> Vec<String> {
    let total: usize = pages.iter().map(count_pages).sum();
    let mut lines = format_page_tree(pages);
    lines.push(String::new());
    lines.push(format!(
        "Imported {} ({})",
        plural(total, "page"),
        plural(pages.len(), "unit")
    ));
    lines
}

fn count_pages(page: &Page) -> usize {
    1 + page.children.iter().map(count_pages).sum::<usize>()
}

pub fn print_import_output(pages: &[Page]) {
    for line in format_import_output(pages) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{EmbeddedTemplates, assemble_at};
    use crate::assets::AssetRegistry;
    use crate::pages::import_tree;
    use crate::session::Snapshot;
    use crate::test_helpers::{MapTemplates, page_tree, sample_config};
    use chrono::NaiveDate;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn truncate_desc_counts_characters() {
        assert_eq!(truncate_desc("short", 10), "short");
        assert_eq!(truncate_desc("Lección número uno", 7), "Lección...");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page"), "1 page");
        assert_eq!(plural(0, "asset"), "0 assets");
    }

    #[test]
    fn page_tree_nested_with_tags() {
        let mut tree = page_tree(&[("Intro", &[]), ("Surge", &["What", "Quiz"])]);
        let surge = tree.pages()[1].id.clone();
        let quiz = tree.pages()[1].children[1].id.clone();
        tree.page_mut(&surge).unwrap().inner_node = true;
        tree.page_mut(&quiz).unwrap().page_type = PageType::Quiz;

        assert_eq!(
            format_page_tree(tree.pages()),
            vec![
                "001 Intro",
                "002 Surge [inner]",
                "    001 What",
                "    002 Quiz [quiz]",
            ]
        );
    }

    #[test]
    fn check_output_ready() {
        let mut registry = AssetRegistry::default();
        registry.add("diagram.png", vec![]).unwrap();
        let mut config = sample_config();
        config.framework = true;
        let session = Session::new(config, registry);

        let lines = format_check_output(&session, &[]);
        assert_eq!(lines[0], "Lesson");
        assert_eq!(lines[1], "    Storm Surge Basics (en, legacy)");
        assert_eq!(lines[2], "    Features: framework");
        assert!(lines.contains(&"001 diagram.png \u{2192} assets/images/diagram.png".to_string()));
        assert_eq!(lines.last().unwrap(), "Ready to export: 3 pages, 1 asset");
    }

    #[test]
    fn check_output_lists_problems() {
        let session = Session::default();
        let problems = vec!["title must not be empty".to_string()];
        let lines = format_check_output(&session, &problems);
        assert_eq!(lines[1], "    (untitled) (en, legacy)");
        assert!(lines.contains(&"Not ready to export".to_string()));
        assert_eq!(lines.last().unwrap(), "    - title must not be empty");
    }

    #[test]
    fn export_output_complete() {
        let snapshot = Snapshot::new(sample_config(), vec![]);
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let package = assemble_at(&snapshot, &EmbeddedTemplates, today);
        let lines = format_export_output(&package, Path::new("dist/x.zip"));

        assert_eq!(lines[0], "Files");
        assert!(lines.contains(&"    print_1.php".to_string()));
        assert!(!lines.contains(&"Warnings".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            &format!("Exported {} files \u{2192} dist/x.zip", package.len())
        );
    }

    #[test]
    fn export_output_reports_skipped_files() {
        let snapshot = Snapshot::new(sample_config(), vec![]);
        let source = MapTemplates::embedded_without(&["legacy/download.php"]);
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let package = assemble_at(&snapshot, &source, today);
        let lines = format_export_output(&package, Path::new("x.zip"));

        assert!(lines.contains(&"Warnings".to_string()));
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with("    download.php skipped:"))
        );
        assert!(lines.last().unwrap().contains("(incomplete, 1 skipped)"));
    }

    #[test]
    fn import_output_counts() {
        let pages =
            import_tree(r#"{ "menu": [ { "title": "A", "menu": [ { "title": "A1" } ] }, { "title": "B" } ] }"#)
                .unwrap();
        let lines = format_import_output(&pages);
        assert_eq!(lines[0], "001 A");
        assert_eq!(lines[1], "    001 A1");
        assert_eq!(lines[2], "002 B");
        assert_eq!(lines.last().unwrap(), "Imported 3 pages (2 units)");
    }
}
