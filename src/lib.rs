//! # Lesson Pack
//!
//! Exports an authored online lesson as a self-contained zip package. A lesson
//! is a configuration (metadata, feature flags, template variant), a page tree
//! of up to three levels, and a flat set of media assets; the export is a
//! deterministic file set built from static templates plus generated pages.
//!
//! # Architecture: Snapshot → Package → Archive
//!
//! ```text
//! 1. Author    Session (config + pages + assets)  →  Snapshot   (owned copy)
//! 2. Assemble  Snapshot + templates                →  Package    (ordered files)
//! 3. Emit      Package                             →  zip bytes  →  DownloadSink
//! ```
//!
//! Each step is a plain function of its input. Assembly never fails: missing
//! templates and unknown markers are collected in the [`assemble::Package`]
//! as warnings. Only validation (before assembly) and I/O (after it) can stop
//! an export.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `lesson.toml` loading, merging, validation; variant and feature flags |
//! | [`pages`] | Page tree with add / move / delete and JSON menu import / export |
//! | [`assets`] | Asset classification, canonical package paths, rename rules |
//! | [`variables`] | Template variables and localized phrases (en, es, fr) |
//! | [`template`] | `<%= var %>` and `<% if … %>` marker interpreter |
//! | [`generate`] | Maud-rendered unit pages, content pages and print view |
//! | [`assemble`] | Static manifest, template sources, package assembly |
//! | [`archive`] | Zip serialization, archive naming, download sinks |
//! | [`session`] | Session-scoped editing state and export snapshots |
//! | [`project`] | Loads a lesson project directory into a session |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Variants, One Pipeline
//!
//! The `legacy` variant ships PHP pages with one `print_<N>.php` per unit;
//! `standard` ships static HTML with one page per tree node. Both share the
//! same assembler: the variant only selects the static manifest and which
//! generated pages are added.
//!
//! ## Lenient Templates
//!
//! Template files are authored by hand and often outlive the code that reads
//! them. An unknown `<%= name %>` stays in the output verbatim and is reported,
//! rather than failing the export or silently vanishing.
//!
//! ## Positional Unit Files
//!
//! Legacy unit files are named by position, not by page id. Moving a unit to
//! the front renames its file to `print_1.php`; the hosting system relies on
//! that numbering.

pub mod archive;
pub mod assemble;
pub mod assets;
pub mod config;
pub mod generate;
pub mod output;
pub mod pages;
pub mod project;
pub mod session;
pub mod template;
pub mod variables;

#[cfg(test)]
pub(crate) mod test_helpers;
