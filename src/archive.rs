//! Archive emission.
//!
//! Serializes a [`Package`] into a deflated zip entirely in memory, then hands
//! the bytes to a [`DownloadSink`]. Entries are written in package (path)
//! order with a fixed timestamp, so the same package always produces the
//! same bytes.

use crate::assemble::Package;
use crate::config::TemplateVariant;
use regex::Regex;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive name used when the title has no usable characters.
pub const FALLBACK_NAME: &str = "Untitled_Lesson";

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("pattern must compile"));

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// File name of the downloadable archive.
///
/// ```text
/// "Storm Surge: Basics!"  legacy    →  Storm_Surge_Basics_legacy.zip
/// ""                      standard  →  Untitled_Lesson_standard.zip
/// ```
pub fn archive_file_name(title: &str, variant: TemplateVariant) -> String {
    let collapsed = NON_ALNUM.replace_all(title, "_");
    let stem = collapsed.trim_matches('_');
    let stem = if stem.is_empty() { FALLBACK_NAME } else { stem };
    format!("{stem}_{}.zip", variant.as_str())
}

/// Serialize the package into zip bytes.
pub fn write_archive(package: &Package) -> Result<Vec<u8>, ArchiveError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for file in package.files() {
        zip.start_file(file.path.as_str(), options)?;
        zip.write_all(&file.contents)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Final destination of an archive.
pub trait DownloadSink {
    /// Store `bytes` under `name`; returns where they ended up.
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArchiveError>;
}

/// Writes archives into a directory, creating it when needed.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirSink {
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf, ArchiveError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Serialize `package` and save it through `sink`.
///
/// Nothing reaches the sink when serialization fails.
pub fn emit(
    package: &Package,
    name: &str,
    sink: &mut dyn DownloadSink,
) -> Result<PathBuf, ArchiveError> {
    let bytes = write_archive(package)?;
    let path = sink.save(name, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "archive saved");
    Ok(path)
}
