//! Asset registry: uploaded media files and their place in the package.
//!
//! Every file is classified by extension and lands at
//! `assets/<kind>s/<name>` in the exported archive:
//!
//! ```text
//! diagram.png    → assets/images/diagram.png
//! intro.mp4      → assets/videos/intro.mp4
//! narration.mp3  → assets/audios/narration.mp3
//! handout.pdf    → assets/documents/handout.pdf
//! ```
//!
//! Unknown extensions (and files without one) are documents. Names are
//! plain file names: path separators and `..` are rejected.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk asset directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("No asset with id {0}")]
    UnknownAsset(String),
    #[error("Asset name must not be empty")]
    EmptyName,
    #[error("Asset name {0:?} must be a plain file name")]
    InvalidName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
    Audio,
    Document,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv", "mov", "m4v"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "oga", "m4a", "aac"];

impl AssetKind {
    /// Classify a file name by its extension (case-insensitive).
    pub fn from_name(name: &str) -> Self {
        let Some(ext) = extension(name) else {
            return AssetKind::Document;
        };
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            AssetKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            AssetKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            AssetKind::Audio
        } else {
            AssetKind::Document
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
            AssetKind::Audio => "audio",
            AssetKind::Document => "document",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension of a file name without the dot. Dotfiles have none.
fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(&name[dot + 1..]).filter(|e| !e.is_empty()),
    }
}

/// Reject names that would leave `assets/<kind>s/`.
fn check_name(name: &str) -> Result<(), AssetError> {
    if name.trim().is_empty() {
        return Err(AssetError::EmptyName);
    }
    if name.contains(['/', '\\']) || name.contains("..") {
        return Err(AssetError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Canonical package path for a file of the given kind.
pub fn canonical_path(kind: AssetKind, name: &str) -> String {
    format!("assets/{}s/{}", kind.as_str(), name)
}

/// One uploaded media file.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFile {
    pub id: String,
    pub name: String,
    pub kind: AssetKind,
    pub data: Vec<u8>,
    path: String,
}

impl AssetFile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let kind = AssetKind::from_name(&name);
        Self {
            id: id.into(),
            path: canonical_path(kind, &name),
            name,
            kind,
            data,
        }
    }

    /// Package-relative path, `assets/<kind>s/<name>`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Rename the file, keeping its original extension.
    ///
    /// A trailing copy of the same extension in `new_name` is not doubled:
    /// renaming `diagram.png` to `flow.png` or to `flow` both give `flow.png`.
    pub fn rename(&mut self, new_name: &str) -> Result<(), AssetError> {
        let mut stem = new_name.trim();
        let original_ext = extension(&self.name).map(str::to_string);

        if let Some(ext) = &original_ext {
            let suffix_len = ext.len() + 1;
            if stem.len() >= suffix_len
                && stem.is_char_boundary(stem.len() - suffix_len)
                && stem[stem.len() - suffix_len..].eq_ignore_ascii_case(&format!(".{ext}"))
            {
                stem = &stem[..stem.len() - suffix_len];
            }
        }
        if stem.is_empty() {
            return Err(AssetError::EmptyName);
        }

        let name = match original_ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };
        check_name(&name)?;
        self.name = name;
        self.path = canonical_path(self.kind, &self.name);
        Ok(())
    }
}

/// Flat, ordered list of uploaded files.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    files: Vec<AssetFile>,
    next_id: u32,
}

impl AssetRegistry {
    /// Load every regular file below `dir`, sorted by file name.
    ///
    /// Subdirectories are flattened: only the file name is kept.
    pub fn from_dir(dir: &Path) -> Result<Self, AssetError> {
        let mut registry = Self::default();
        if !dir.is_dir() {
            return Ok(registry);
        }
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let data = std::fs::read(entry.path())?;
            if let Err(err) = registry.add(name, data) {
                tracing::warn!(path = %entry.path().display(), error = %err, "asset skipped");
            }
        }
        Ok(registry)
    }

    /// Register a file and return its id.
    pub fn add(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<String, AssetError> {
        let name = name.into();
        check_name(&name)?;
        self.next_id += 1;
        let id = format!("asset-{}", self.next_id);
        self.files.push(AssetFile::new(id.clone(), name, data));
        Ok(id)
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<(), AssetError> {
        self.files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AssetError::UnknownAsset(id.to_string()))?
            .rename(new_name)
    }

    pub fn remove(&mut self, id: &str) -> Result<AssetFile, AssetError> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| AssetError::UnknownAsset(id.to_string()))?;
        Ok(self.files.remove(index))
    }

    pub fn files(&self) -> &[AssetFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn classify_by_extension() {
        assert_eq!(AssetKind::from_name("diagram.png"), AssetKind::Image);
        assert_eq!(AssetKind::from_name("Diagram.JPG"), AssetKind::Image);
        assert_eq!(AssetKind::from_name("intro.mp4"), AssetKind::Video);
        assert_eq!(AssetKind::from_name("narration.mp3"), AssetKind::Audio);
        assert_eq!(AssetKind::from_name("handout.pdf"), AssetKind::Document);
    }

    #[test]
    fn classify_without_extension_is_document() {
        assert_eq!(AssetKind::from_name("README"), AssetKind::Document);
        assert_eq!(AssetKind::from_name(".hidden"), AssetKind::Document);
        assert_eq!(AssetKind::from_name("trailing."), AssetKind::Document);
    }

    #[test]
    fn canonical_paths() {
        assert_eq!(
            AssetFile::new("a", "diagram.png", vec![]).path(),
            "assets/images/diagram.png"
        );
        assert_eq!(
            AssetFile::new("a", "narration.mp3", vec![]).path(),
            "assets/audios/narration.mp3"
        );
        assert_eq!(
            AssetFile::new("a", "handout.pdf", vec![]).path(),
            "assets/documents/handout.pdf"
        );
    }

    #[test]
    fn rename_preserves_extension() {
        let mut file = AssetFile::new("a", "diagram.png", vec![1, 2, 3]);
        file.rename("flow-chart").unwrap();
        assert_eq!(file.name, "flow-chart.png");
        assert_eq!(file.path(), "assets/images/flow-chart.png");
        assert_eq!(file.data, vec![1, 2, 3]);
    }

    #[test]
    fn rename_does_not_double_extension() {
        let mut file = AssetFile::new("a", "diagram.png", vec![]);
        file.rename("flow.PNG").unwrap();
        assert_eq!(file.name, "flow.png");
    }

    #[test]
    fn rename_ignores_foreign_extension() {
        let mut file = AssetFile::new("a", "diagram.png", vec![]);
        file.rename("flow.jpg").unwrap();
        assert_eq!(file.name, "flow.jpg.png");
        assert_eq!(file.kind, AssetKind::Image);
    }

    #[test]
    fn rename_to_empty_rejected() {
        let mut file = AssetFile::new("a", "diagram.png", vec![]);
        assert!(matches!(file.rename("  "), Err(AssetError::EmptyName)));
        assert!(matches!(file.rename(".png"), Err(AssetError::EmptyName)));
        assert_eq!(file.name, "diagram.png");
    }

    #[test]
    fn rename_rejects_path_components() {
        let mut file = AssetFile::new("a", "diagram.png", vec![]);
        for bad in ["../../../index", "sub/flow", "sub\\flow", "flow..bak"] {
            assert!(
                matches!(file.rename(bad), Err(AssetError::InvalidName(_))),
                "{bad} accepted"
            );
        }
        assert_eq!(file.path(), "assets/images/diagram.png");
    }

    #[test]
    fn add_rejects_path_components() {
        let mut registry = AssetRegistry::default();
        assert!(matches!(
            registry.add("../index.htm", vec![]),
            Err(AssetError::InvalidName(_))
        ));
        assert!(matches!(registry.add(" ", vec![]), Err(AssetError::EmptyName)));
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_add_rename_remove() {
        let mut registry = AssetRegistry::default();
        let a = registry.add("diagram.png", vec![]).unwrap();
        let b = registry.add("notes.pdf", vec![]).unwrap();
        assert_ne!(a, b);

        registry.rename(&a, "map").unwrap();
        assert_eq!(registry.files()[0].path(), "assets/images/map.png");

        let removed = registry.remove(&b).unwrap();
        assert_eq!(removed.name, "notes.pdf");
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            registry.remove(&b),
            Err(AssetError::UnknownAsset(_))
        ));
    }

    #[test]
    fn from_dir_reads_sorted_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("audio")).unwrap();
        std::fs::write(tmp.path().join("zeta.png"), b"png").unwrap();
        std::fs::write(tmp.path().join("alpha.pdf"), b"pdf").unwrap();
        std::fs::write(tmp.path().join("audio/narration.mp3"), b"mp3").unwrap();
        std::fs::write(tmp.path().join(".DS_Store"), b"junk").unwrap();

        let registry = AssetRegistry::from_dir(tmp.path()).unwrap();
        let paths: Vec<&str> = registry.files().iter().map(|f| f.path()).collect();
        assert_eq!(
            paths,
            vec![
                "assets/documents/alpha.pdf",
                "assets/audios/narration.mp3",
                "assets/images/zeta.png",
            ]
        );
        assert_eq!(registry.files()[2].data, b"png");
    }

    #[test]
    fn from_dir_skips_unusable_names() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("v1..2.png"), b"png").unwrap();
        std::fs::write(tmp.path().join("map.png"), b"png").unwrap();
        let registry = AssetRegistry::from_dir(tmp.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.files()[0].name, "map.png");
    }

    #[test]
    fn from_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let registry = AssetRegistry::from_dir(&tmp.path().join("assets")).unwrap();
        assert!(registry.is_empty());
    }
}
