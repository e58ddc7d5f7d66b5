//! Lesson page tree.
//!
//! Pages form a tree of at most three levels. Level-1 pages are the lesson
//! *units*: each becomes one generated unit page in the legacy package.
//! Levels 2 and 3 are sections and sub-sections.
//!
//! ## Page Paths
//!
//! Every page carries a `page_path` of the form `<l1>-<l2>-<l3>`, assigned
//! once at creation from the next free slot among its siblings:
//!
//! ```text
//! 1-0-0  Introduction
//! 2-0-0  Storm Surge
//! ├── 2-1-0  What is surge?
//! │   └── 2-1-1  Pressure effects
//! └── 2-2-0  Wind setup
//! 3-0-0  Summary
//! ```
//!
//! Paths are not rewritten when pages move or are deleted; display `order`
//! is. `order` is 1-based and contiguous among siblings at all times. A
//! slot freed by a deletion is never handed out again, so paths stay unique
//! and each names one standard-variant page file.
//!
//! ## Menu Format
//!
//! Trees are imported from and exported to a JSON menu document:
//!
//! ```json
//! { "menu": [
//!     { "title": "Introduction", "page": "1-0-0" },
//!     { "title": "Storm Surge", "innerNode": true, "menu": [
//!         { "title": "What is surge?", "type": "content" }
//!     ] }
//! ] }
//! ```
//!
//! Missing fields are defaulted; nesting depth decides the level.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

static PAGE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-\d+-\d+$").expect("page path pattern must compile"));

/// Deepest level a page may sit at.
pub const MAX_LEVEL: u8 = 3;

/// Content given to pages created without any.
pub const DEFAULT_CONTENT: &str = "<p>Content coming soon.</p>";

#[derive(Error, Debug)]
pub enum PageError {
    #[error("No page with id {0}")]
    UnknownPage(String),
    #[error("Page {0} is at level {MAX_LEVEL} and cannot have children")]
    TooDeep(String),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Menu JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Menu document has no top-level \"menu\" array")]
    MissingMenu,
    #[error("Menu entry \"{0}\" is nested deeper than level {MAX_LEVEL}")]
    TooDeep(String),
}

/// What a page is used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Content,
    Quiz,
    Preassessment,
    Survey,
    Resources,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            PageType::Content => "content",
            PageType::Quiz => "quiz",
            PageType::Preassessment => "preassessment",
            PageType::Survey => "survey",
            PageType::Resources => "resources",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        [
            PageType::Content,
            PageType::Quiz,
            PageType::Preassessment,
            PageType::Survey,
            PageType::Resources,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

/// One lesson content unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    /// Raw markup.
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// 1-based display position among siblings.
    pub order: u32,
    pub page_type: PageType,
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Page>,
    /// `<l1>-<l2>-<l3>` position identifier.
    pub page_path: String,
    /// Navigation-only node (no content of its own).
    #[serde(default)]
    pub inner_node: bool,
}

/// The ordered collection of top-level pages, each owning its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageTree {
    pages: Vec<Page>,
}

impl PageTree {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Top-level pages in stored order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of pages at every level.
    pub fn len(&self) -> usize {
        self.walk().len()
    }

    /// Level-1 pages sorted by display order.
    pub fn units(&self) -> Vec<&Page> {
        let mut units: Vec<&Page> = self.pages.iter().collect();
        units.sort_by_key(|p| p.order);
        units
    }

    /// All pages, depth-first, siblings in display order.
    pub fn walk(&self) -> Vec<&Page> {
        fn visit<'a>(list: &'a [Page], out: &mut Vec<&'a Page>) {
            let mut sorted: Vec<&Page> = list.iter().collect();
            sorted.sort_by_key(|p| p.order);
            for page in sorted {
                out.push(page);
                visit(&page.children, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.pages, &mut out);
        out
    }

    pub fn find(&self, id: &str) -> Option<&Page> {
        self.walk().into_iter().find(|p| p.id == id)
    }

    /// Mutable access for field-level edits (title, content, type).
    pub fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        find_mut(&mut self.pages, id)
    }

    /// Add a page at the end of the top level or of `parent_id`'s children.
    ///
    /// Returns the new page's id.
    pub fn add_page(&mut self, parent_id: Option<&str>) -> Result<String, PageError> {
        let id = self.next_id();
        let (siblings, level, parent_path) = match parent_id {
            None => (&mut self.pages, 1, None),
            Some(pid) => {
                let parent =
                    find_mut(&mut self.pages, pid).ok_or_else(|| PageError::UnknownPage(pid.into()))?;
                if parent.level >= MAX_LEVEL {
                    return Err(PageError::TooDeep(pid.into()));
                }
                let level = parent.level + 1;
                let path = parent.page_path.clone();
                (&mut parent.children, level, Some(path))
            }
        };

        let position = siblings.len() + 1;
        let slot = siblings
            .iter()
            .filter_map(|p| path_slot(&p.page_path, level))
            .max()
            .unwrap_or(0)
            .max(siblings.len())
            + 1;
        siblings.push(Page {
            id: id.clone(),
            title: format!("Page {position}"),
            content: DEFAULT_CONTENT.to_string(),
            description: String::new(),
            order: position as u32,
            page_type: PageType::Content,
            level,
            parent_id: parent_id.map(str::to_string),
            children: Vec::new(),
            page_path: page_path_for(parent_path.as_deref(), level, slot),
            inner_node: false,
        });
        Ok(id)
    }

    /// Delete a page and all of its descendants.
    ///
    /// Remaining siblings are renumbered so `order` stays contiguous.
    /// Returns the removed subtree.
    pub fn delete(&mut self, id: &str) -> Result<Page, PageError> {
        let siblings =
            siblings_of_mut(&mut self.pages, id).ok_or_else(|| PageError::UnknownPage(id.into()))?;
        let index = siblings
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PageError::UnknownPage(id.into()))?;
        let removed = siblings.remove(index);
        renumber(siblings);
        Ok(removed)
    }

    /// Move a page to a 1-based position among its siblings.
    ///
    /// Positions past the end are clamped to the last slot.
    pub fn move_page(&mut self, id: &str, position: usize) -> Result<(), PageError> {
        let siblings =
            siblings_of_mut(&mut self.pages, id).ok_or_else(|| PageError::UnknownPage(id.into()))?;
        siblings.sort_by_key(|p| p.order);
        let index = siblings
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PageError::UnknownPage(id.into()))?;
        let page = siblings.remove(index);
        let target = position.clamp(1, siblings.len() + 1) - 1;
        siblings.insert(target, page);
        renumber(siblings);
        Ok(())
    }

    /// Structural problems in a tree built outside of `add_page`
    /// (deserialized or hand-assembled).
    pub fn structure_problems(&self) -> Vec<String> {
        fn check(list: &[Page], parent: Option<&Page>, problems: &mut Vec<String>) {
            for page in list {
                let expected_level = parent.map_or(1, |p| p.level + 1);
                if page.level != expected_level {
                    problems.push(format!(
                        "page {} is at level {} but should be at level {}",
                        page.id, page.level, expected_level
                    ));
                }
                if page.level > MAX_LEVEL {
                    problems.push(format!("page {} is deeper than level {MAX_LEVEL}", page.id));
                }
                if page.parent_id.as_deref() != parent.map(|p| p.id.as_str()) {
                    problems.push(format!("page {} has a broken parent reference", page.id));
                }
                if !is_page_path(&page.page_path) {
                    problems.push(format!(
                        "page {} has malformed path {:?}",
                        page.id, page.page_path
                    ));
                }
                check(&page.children, Some(page), problems);
            }
        }

        let mut problems = Vec::new();
        check(&self.pages, None, &mut problems);

        let mut ids: Vec<&str> = self.walk().iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        for pair in ids.windows(2).filter(|w| w[0] == w[1]) {
            problems.push(format!("page id {} is used more than once", pair[0]));
        }

        let mut seen = HashSet::new();
        for page in self.walk() {
            if !seen.insert(page.page_path.as_str()) {
                problems.push(format!(
                    "page path {} is used more than once (page {})",
                    page.page_path, page.id
                ));
            }
        }
        problems
    }

    /// Next free `page-N` id.
    fn next_id(&self) -> String {
        let max = self
            .walk()
            .iter()
            .filter_map(|p| p.id.strip_prefix("page-")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("page-{}", max + 1)
    }
}

fn find_mut<'a>(list: &'a mut [Page], id: &str) -> Option<&'a mut Page> {
    for page in list.iter_mut() {
        if page.id == id {
            return Some(page);
        }
        if let Some(found) = find_mut(&mut page.children, id) {
            return Some(found);
        }
    }
    None
}

/// The sibling list that directly contains `id`.
fn siblings_of_mut<'a>(list: &'a mut Vec<Page>, id: &str) -> Option<&'a mut Vec<Page>> {
    if list.iter().any(|p| p.id == id) {
        return Some(list);
    }
    for page in list.iter_mut() {
        if let Some(found) = siblings_of_mut(&mut page.children, id) {
            return Some(found);
        }
    }
    None
}

fn renumber(siblings: &mut [Page]) {
    siblings.sort_by_key(|p| p.order);
    for (i, page) in siblings.iter_mut().enumerate() {
        page.order = i as u32 + 1;
    }
}

/// Whether `path` has the `<l1>-<l2>-<l3>` shape.
pub fn is_page_path(path: &str) -> bool {
    PAGE_PATH.is_match(path)
}

/// The segment of `path` that numbers pages at `level`.
fn path_slot(path: &str, level: u8) -> Option<usize> {
    path.split('-')
        .nth(usize::from(level.clamp(1, MAX_LEVEL)) - 1)?
        .parse()
        .ok()
}

/// Page path for the `position`-th child (1-based) at `level` under a parent path.
///
/// ```text
/// page_path_for(None, 1, 2)          → "2-0-0"
/// page_path_for(Some("2-0-0"), 2, 1) → "2-1-0"
/// page_path_for(Some("2-1-0"), 3, 4) → "2-1-4"
/// ```
pub fn page_path_for(parent_path: Option<&str>, level: u8, position: usize) -> String {
    let mut segments = [0usize; 3];
    if let Some(parent) = parent_path {
        for (slot, part) in segments.iter_mut().zip(parent.split('-')) {
            *slot = part.parse().unwrap_or(0);
        }
    }
    let slot = usize::from(level.clamp(1, MAX_LEVEL)) - 1;
    segments[slot] = position;
    for later in segments.iter_mut().skip(slot + 1) {
        *later = 0;
    }
    format!("{}-{}-{}", segments[0], segments[1], segments[2])
}

// =============================================================================
// Menu import / export
// =============================================================================

/// One entry of a menu document. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    page_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inner_node: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    menu: Option<Vec<MenuEntry>>,
}

/// Import a page tree from a JSON menu document.
///
/// Fails without producing any pages if the document is malformed, has no
/// top-level `menu` array, or nests deeper than three levels.
pub fn import_tree(json: &str) -> Result<Vec<Page>, ImportError> {
    let document: serde_json::Value = serde_json::from_str(json)?;
    let menu = document
        .get("menu")
        .filter(|m| m.is_array())
        .cloned()
        .ok_or(ImportError::MissingMenu)?;
    let entries: Vec<MenuEntry> = serde_json::from_value(menu)?;

    let mut next_id = 1;
    let pages = import_entries(entries, 1, None, &mut next_id)?;
    tracing::debug!(pages = next_id - 1, "imported menu");
    Ok(pages)
}

fn import_entries(
    entries: Vec<MenuEntry>,
    level: u8,
    parent: Option<(&str, &str)>,
    next_id: &mut u32,
) -> Result<Vec<Page>, ImportError> {
    let mut pages = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let position = index + 1;
        let title = entry
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Page {position}"));
        if level > MAX_LEVEL {
            return Err(ImportError::TooDeep(title));
        }

        let page_type = match entry.page_type.as_deref() {
            None => PageType::Content,
            Some(name) => PageType::parse(name).unwrap_or_else(|| {
                tracing::warn!(page = %title, kind = name, "unknown page type, using content");
                PageType::Content
            }),
        };
        let default_path = || page_path_for(parent.map(|(_, path)| path), level, position);
        let page_path = match entry.page.as_deref().map(str::trim) {
            None | Some("") => default_path(),
            Some(given) if is_page_path(given) => given.to_string(),
            Some(given) => {
                tracing::warn!(page = %title, path = given, "malformed page path, using position");
                default_path()
            }
        };

        let id = format!("page-{next_id}");
        *next_id += 1;

        let children = match entry.menu {
            Some(children) if !children.is_empty() => {
                import_entries(children, level + 1, Some((id.as_str(), page_path.as_str())), next_id)?
            }
            _ => Vec::new(),
        };

        pages.push(Page {
            id,
            title,
            content: entry.content.unwrap_or_else(|| DEFAULT_CONTENT.to_string()),
            description: entry.description.unwrap_or_default(),
            order: position as u32,
            page_type,
            level,
            parent_id: parent.map(|(pid, _)| pid.to_string()),
            children,
            page_path,
            inner_node: entry.inner_node.unwrap_or(false),
        });
    }

    Ok(pages)
}

/// Export a page tree as a menu document that [`import_tree`] reads back.
pub fn export_tree(tree: &PageTree) -> serde_json::Value {
    fn entries(list: &[Page]) -> Vec<MenuEntry> {
        let mut sorted: Vec<&Page> = list.iter().collect();
        sorted.sort_by_key(|p| p.order);
        sorted
            .into_iter()
            .map(|page| MenuEntry {
                title: Some(page.title.clone()),
                content: Some(page.content.clone()),
                description: (!page.description.is_empty()).then(|| page.description.clone()),
                page_type: Some(page.page_type.as_str().to_string()),
                page: Some(page.page_path.clone()),
                inner_node: Some(page.inner_node),
                menu: (!page.children.is_empty()).then(|| entries(&page.children)),
            })
            .collect()
    }

    serde_json::json!({ "menu": entries(tree.pages()) })
}
