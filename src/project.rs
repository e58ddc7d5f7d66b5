//! Lesson project directories.
//!
//! ```text
//! my-lesson/
//! ├── lesson.toml    # configuration, see `config`
//! ├── menu.json      # page tree in the menu import format
//! └── assets/        # media files, any nesting
//! ```
//!
//! Every part is optional: a missing `lesson.toml` gives the defaults, a
//! missing `menu.json` an empty tree, a missing `assets/` no assets.
//! Loading never validates; that happens at export time.

use crate::assets::{AssetError, AssetRegistry};
use crate::config::{self, ConfigError};
use crate::pages::{ImportError, PageTree, import_tree};
use crate::session::Session;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MENU_FILENAME: &str = "menu.json";
pub const ASSETS_DIR: &str = "assets";

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project directory {0} does not exist")]
    NotFound(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid {path}: {source}")]
    Menu {
        path: PathBuf,
        source: ImportError,
    },
    #[error(transparent)]
    Assets(#[from] AssetError),
}

/// Load a project directory into a fresh session.
pub fn load_project(dir: &Path) -> Result<Session, ProjectError> {
    if !dir.is_dir() {
        return Err(ProjectError::NotFound(dir.to_path_buf()));
    }

    let mut config = config::load_config(dir)?;
    config.pages = load_menu(&dir.join(MENU_FILENAME))?;
    let assets = AssetRegistry::from_dir(&dir.join(ASSETS_DIR))?;

    tracing::debug!(
        dir = %dir.display(),
        pages = config.pages.len(),
        assets = assets.len(),
        "loaded project"
    );
    Ok(Session::new(config, assets))
}

/// Read a menu document into a page tree. A missing file is an empty tree.
pub fn load_menu(path: &Path) -> Result<PageTree, ProjectError> {
    if !path.exists() {
        return Ok(PageTree::default());
    }
    let json = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pages = import_tree(&json).map_err(|source| ProjectError::Menu {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PageTree::new(pages))
}
