//! Session-scoped lesson state.
//!
//! A [`Session`] holds everything an author edits: the configuration with
//! its page tree, and the uploaded assets. Nothing outlives the session.
//! Exports work on a [`Snapshot`], an owned copy taken at export time, so
//! later edits never leak into a package being assembled.

use crate::archive::archive_file_name;
use crate::assemble::{Package, TemplateSource, assemble};
use crate::assets::{AssetError, AssetFile, AssetRegistry};
use crate::config::{ConfigError, LessonConfig};
use crate::pages::{ImportError, PageError, PageTree, PageType, import_tree};

/// Field edits for an existing page. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub page_type: Option<PageType>,
    pub inner_node: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    config: LessonConfig,
    assets: AssetRegistry,
}

impl Session {
    pub fn new(config: LessonConfig, assets: AssetRegistry) -> Self {
        Self { config, assets }
    }

    pub fn config(&self) -> &LessonConfig {
        &self.config
    }

    /// Mutable access to the metadata and template options.
    pub fn config_mut(&mut self) -> &mut LessonConfig {
        &mut self.config
    }

    pub fn pages(&self) -> &PageTree {
        &self.config.pages
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    // ------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------

    pub fn add_page(&mut self, parent_id: Option<&str>) -> Result<String, PageError> {
        self.config.pages.add_page(parent_id)
    }

    pub fn update_page(&mut self, id: &str, update: PageUpdate) -> Result<(), PageError> {
        let page = self
            .config
            .pages
            .page_mut(id)
            .ok_or_else(|| PageError::UnknownPage(id.to_string()))?;
        if let Some(title) = update.title {
            page.title = title;
        }
        if let Some(content) = update.content {
            page.content = content;
        }
        if let Some(description) = update.description {
            page.description = description;
        }
        if let Some(page_type) = update.page_type {
            page.page_type = page_type;
        }
        if let Some(inner_node) = update.inner_node {
            page.inner_node = inner_node;
        }
        Ok(())
    }

    pub fn move_page(&mut self, id: &str, position: usize) -> Result<(), PageError> {
        self.config.pages.move_page(id, position)
    }

    pub fn delete_page(&mut self, id: &str) -> Result<(), PageError> {
        self.config.pages.delete(id).map(|_| ())
    }

    /// Replace the page tree with one imported from a menu document.
    ///
    /// On error the current tree is left untouched. Returns the number of
    /// imported pages.
    pub fn import_menu(&mut self, json: &str) -> Result<usize, ImportError> {
        let tree = PageTree::new(import_tree(json)?);
        let count = tree.len();
        self.config.pages = tree;
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------

    pub fn add_asset(
        &mut self,
        name: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<String, AssetError> {
        self.assets.add(name, data)
    }

    pub fn rename_asset(&mut self, id: &str, new_name: &str) -> Result<(), AssetError> {
        self.assets.rename(id, new_name)
    }

    pub fn remove_asset(&mut self, id: &str) -> Result<(), AssetError> {
        self.assets.remove(id).map(|_| ())
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.config.clone(), self.assets.files().to_vec())
    }

    /// Validate, then assemble a package from a snapshot of the session.
    pub fn export(&self, source: &dyn TemplateSource) -> Result<Package, ConfigError> {
        self.config.validate()?;
        Ok(assemble(&self.snapshot(), source))
    }
}

/// Immutable input of one export.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub config: LessonConfig,
    pub assets: Vec<AssetFile>,
}

impl Snapshot {
    pub fn new(config: LessonConfig, assets: Vec<AssetFile>) -> Self {
        Self { config, assets }
    }

    /// Download name for this snapshot's archive.
    pub fn archive_name(&self) -> String {
        archive_file_name(&self.config.title, self.config.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::EmbeddedTemplates;
    use crate::test_helpers::{sample_config, titles};

    fn session() -> Session {
        Session::new(sample_config(), AssetRegistry::default())
    }

    #[test]
    fn update_page_changes_only_given_fields() {
        let mut session = session();
        let id = session.pages().pages()[0].id.clone();
        session
            .update_page(
                &id,
                PageUpdate {
                    title: Some("Introduction".into()),
                    page_type: Some(PageType::Quiz),
                    ..PageUpdate::default()
                },
            )
            .unwrap();

        let page = session.pages().find(&id).unwrap();
        assert_eq!(page.title, "Introduction");
        assert_eq!(page.page_type, PageType::Quiz);
        assert_eq!(page.content, crate::pages::DEFAULT_CONTENT);
    }

    #[test]
    fn update_unknown_page_is_error() {
        let mut session = session();
        assert!(matches!(
            session.update_page("nope", PageUpdate::default()),
            Err(PageError::UnknownPage(_))
        ));
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let mut session = session();
        let asset = session.add_asset("diagram.png", vec![1]).unwrap();
        let snapshot = session.snapshot();

        let id = session.pages().pages()[0].id.clone();
        session.delete_page(&id).unwrap();
        session.rename_asset(&asset, "flow").unwrap();
        session.config_mut().title = "Changed".into();

        assert_eq!(snapshot.config.pages.len(), 3);
        assert_eq!(snapshot.assets[0].name, "diagram.png");
        assert_eq!(snapshot.config.title, "Storm Surge Basics");
    }

    #[test]
    fn import_menu_replaces_tree() {
        let mut session = session();
        let count = session
            .import_menu(r#"{ "menu": [ { "title": "One", "menu": [ { "title": "Two" } ] } ] }"#)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(titles(&session.pages().walk()), vec!["One", "Two"]);
    }

    #[test]
    fn failed_import_keeps_current_tree() {
        let mut session = session();
        assert!(session.import_menu(r#"{ "pages": [] }"#).is_err());
        assert_eq!(titles(&session.pages().units()), vec!["A", "B", "C"]);
    }

    #[test]
    fn export_requires_valid_config() {
        let mut session = session();
        session.config_mut().title = String::new();
        assert!(matches!(
            session.export(&EmbeddedTemplates),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn export_includes_session_assets() {
        let mut session = session();
        let id = session.add_asset("diagram.png", vec![9, 9]).unwrap();
        session.rename_asset(&id, "surge-map").unwrap();
        let package = session.export(&EmbeddedTemplates).unwrap();
        assert!(package.contains("assets/images/surge-map.png"));
        assert!(!package.contains("assets/images/diagram.png"));
    }

    #[test]
    fn removed_asset_is_not_exported() {
        let mut session = session();
        let id = session.add_asset("notes.pdf", vec![]).unwrap();
        session.remove_asset(&id).unwrap();
        let package = session.export(&EmbeddedTemplates).unwrap();
        assert!(!package.contains("assets/documents/notes.pdf"));
    }

    #[test]
    fn archive_name_from_title_and_variant() {
        assert_eq!(
            session().snapshot().archive_name(),
            "Storm_Surge_Basics_legacy.zip"
        );
    }
}
