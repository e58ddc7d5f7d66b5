//! Procedurally generated lesson pages.
//!
//! Static files come from the template manifest; the pages here are built
//! per export from the page tree with [maud](https://maud.lambda.xyz/), so
//! every interpolated title is escaped.
//!
//! ## Legacy Variant
//!
//! - **Unit pages** (`print_<N>.php`): one per level-1 page, N the 1-based
//!   position in display order. They carry the unit title, the lesson banner,
//!   localized footer and a content placeholder. Authored content is
//!   deliberately not embedded: the hosting system fills it in.
//!
//! ## Standard Variant
//!
//! - **Content pages** (`pages/<page_path>.html`): one per page at every
//!   level, with the authored content. Navigation nodes list their children.
//! - **Print view** (`print.html`): every page in reading order, when the
//!   `printable` feature is on.

use crate::config::{Feature, LessonConfig};
use crate::pages::{Page, PageTree};
use crate::variables::{Variable, Variables};
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// File name of the legacy unit page at 1-based `position`.
pub fn unit_page_filename(position: usize) -> String {
    format!("print_{position}.php")
}

/// Package path of a standard-variant content page.
pub fn content_page_filename(page: &Page) -> String {
    format!("pages/{}.html", page.page_path)
}

// ============================================================================
// Shared components
// ============================================================================

/// Renders the document shell. `root` is the relative prefix back to the
/// package root (`""` or `"../"`).
fn base_document(
    title: &str,
    root: &str,
    config: &LessonConfig,
    vars: &Variables,
    content: Markup,
) -> Markup {
    let framework = Feature::Framework.enabled_in(config);
    html! {
        (DOCTYPE)
        html lang=(vars.language().code()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="description" content=(vars.text(Variable::Description));
                meta name="keywords" content=(vars.text(Variable::Keywords));
                title { (title) }
                link rel="stylesheet" href={ (root) "css/base.css" };
                @if framework {
                    link rel="stylesheet" href={ (root) "css/framework.css" };
                }
            }
            body id="top" {
                (content)
                @if framework {
                    script src={ (root) "js/framework.js" } {}
                }
            }
        }
    }
}

/// Lesson banner linking back to the entry point.
fn banner(href: &str, vars: &Variables) -> Markup {
    html! {
        header.banner {
            a.banner-title href=(href) { (vars.text(Variable::Title)) }
        }
    }
}

/// Localized footer: copyright, legal link, back-to-top.
fn footer(vars: &Variables) -> Markup {
    let phrases = vars.phrases();
    html! {
        footer.lesson-footer {
            p.copyright {
                "© " (vars.text(Variable::CopyrightYear)) " " (phrases.copyright_notice)
            }
            p.legal {
                a href=(phrases.legal_notices_url) target="_blank" rel="noopener" {
                    (phrases.legal_notices_text)
                }
            }
            a.back-to-top href="#top" { (phrases.back_to_top) }
        }
    }
}

/// Renders the page-tree navigation. Links are relative to `pages/`.
pub fn render_nav(pages: &[Page], current_id: Option<&str>) -> Markup {
    let mut sorted: Vec<&Page> = pages.iter().collect();
    sorted.sort_by_key(|p| p.order);
    html! {
        ul.lesson-nav {
            @for page in sorted {
                @let is_current = current_id == Some(page.id.as_str());
                li class=[is_current.then_some("current")] {
                    a href={ (page.page_path) ".html" } { (page.title) }
                    @if !page.children.is_empty() {
                        (render_nav(&page.children, current_id))
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page renderers
// ============================================================================

/// Renders a legacy unit page (`print_<N>.php`).
pub fn render_unit_page(
    unit: &Page,
    position: usize,
    config: &LessonConfig,
    vars: &Variables,
) -> String {
    let title = format!("{} | {}", unit.title, vars.text(Variable::Title));
    let content = html! {
        (banner("index.htm", vars))
        (PreEscaped("<?php include 'nav.php'; ?>"))
        main.unit-page data-unit=(position) {
            h1.unit-title { (unit.title) }
            div.unit-content {
                p.content-placeholder { (vars.phrases().content_placeholder) }
            }
        }
        (footer(vars))
    };
    let document = base_document(&title, "", config, vars, content);
    format!(
        "<?php $unit = {position}; include 'template.php'; ?>\n{}",
        document.into_string()
    )
}

/// Renders a standard-variant content page (`pages/<page_path>.html`).
pub fn render_content_page(
    page: &Page,
    tree: &PageTree,
    config: &LessonConfig,
    vars: &Variables,
) -> Markup {
    let title = format!("{} | {}", page.title, vars.text(Variable::Title));
    let mut children: Vec<&Page> = page.children.iter().collect();
    children.sort_by_key(|p| p.order);

    let content = html! {
        (banner("../index.html", vars))
        nav.site-nav {
            (render_nav(tree.pages(), Some(&page.id)))
        }
        main.content-page data-page=(page.page_path) data-type=(page.page_type.as_str()) {
            h1 { (page.title) }
            @if !page.description.is_empty() {
                p.page-description { (page.description) }
            }
            @if page.inner_node {
                ul.section-list {
                    @for child in children {
                        li { a href={ (child.page_path) ".html" } { (child.title) } }
                    }
                }
            } @else {
                article.page-content { (PreEscaped(&page.content)) }
            }
        }
        (footer(vars))
    };
    base_document(&title, "../", config, vars, content)
}

/// Renders the standard-variant print view with every page in reading order.
pub fn render_print_page(tree: &PageTree, config: &LessonConfig, vars: &Variables) -> Markup {
    let content = html! {
        (banner("index.html", vars))
        main.print-view {
            @for page in tree.walk().into_iter().filter(|p| !p.inner_node) {
                section.print-section data-page=(page.page_path) {
                    @match page.level {
                        1 => h1 { (page.title) },
                        2 => h2 { (page.title) },
                        _ => h3 { (page.title) },
                    }
                    (PreEscaped(&page.content))
                }
            }
        }
        (footer(vars))
    };
    base_document(&vars.text(Variable::Title), "", config, vars, content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{page_tree, sample_config};
    use crate::variables::resolve_variables_at;
    use chrono::NaiveDate;

    fn vars_for(config: &LessonConfig) -> Variables {
        resolve_variables_at(config, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
    }

    #[test]
    fn filenames() {
        assert_eq!(unit_page_filename(3), "print_3.php");
        let tree = page_tree(&[("A", &["A1"])]);
        assert_eq!(content_page_filename(&tree.pages()[0]), "pages/1-0-0.html");
        assert_eq!(
            content_page_filename(&tree.pages()[0].children[0]),
            "pages/1-1-0.html"
        );
    }

    #[test]
    fn unit_page_has_banner_and_title() {
        let config = sample_config();
        let vars = vars_for(&config);
        let unit = &config.pages.pages()[1];
        let html = render_unit_page(unit, 2, &config, &vars);

        assert!(html.starts_with("<?php $unit = 2; include 'template.php'; ?>"));
        assert!(html.contains(r#"<a class="banner-title" href="index.htm">Storm Surge Basics</a>"#));
        assert!(html.contains("<h1 class=\"unit-title\">B</h1>"));
        assert!(html.contains("<?php include 'nav.php'; ?>"));
        assert!(html.contains("Back to top"));
    }

    #[test]
    fn unit_page_uses_placeholder_not_content() {
        let mut config = sample_config();
        let id = config.pages.pages()[0].id.clone();
        config.pages.page_mut(&id).unwrap().content = "<p>SECRET AUTHORED TEXT</p>".into();
        let vars = vars_for(&config);
        let html = render_unit_page(&config.pages.pages()[0], 1, &config, &vars);
        assert!(!html.contains("SECRET AUTHORED TEXT"));
        assert!(html.contains("Unit content goes here."));
    }

    #[test]
    fn unit_page_localized_chrome() {
        let mut config = sample_config();
        config.language = "es".into();
        let vars = vars_for(&config);
        let html = render_unit_page(&config.pages.pages()[0], 1, &config, &vars);
        assert!(html.contains(r#"<html lang="es">"#));
        assert!(html.contains("Volver arriba"));
        assert!(html.contains("Todos los derechos reservados."));
    }

    #[test]
    fn unit_page_framework_assets() {
        let mut config = sample_config();
        let vars = vars_for(&config);
        let plain = render_unit_page(&config.pages.pages()[0], 1, &config, &vars);
        assert!(!plain.contains("framework.css"));

        config.framework = true;
        let html = render_unit_page(&config.pages.pages()[0], 1, &config, &vars);
        assert!(html.contains("css/framework.css"));
        assert!(html.contains("js/framework.js"));
    }

    #[test]
    fn unit_title_is_escaped() {
        let mut config = sample_config();
        let id = config.pages.pages()[0].id.clone();
        config.pages.page_mut(&id).unwrap().title = "<script>x</script>".into();
        let vars = vars_for(&config);
        let html = render_unit_page(&config.pages.pages()[0], 1, &config, &vars);
        assert!(!html.contains("<script>x"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn nav_renders_nested_tree_and_current() {
        let tree = page_tree(&[("A", &["A1"]), ("B", &[])]);
        let current = tree.pages()[1].id.clone();
        let html = render_nav(tree.pages(), Some(&current)).into_string();
        assert!(html.contains(r#"href="1-0-0.html""#));
        assert!(html.contains(r#"href="1-1-0.html""#));
        assert!(html.contains(r#"<li class="current"><a href="2-0-0.html">B</a>"#));
    }

    #[test]
    fn content_page_embeds_content() {
        let mut config = sample_config();
        let id = config.pages.pages()[0].id.clone();
        config.pages.page_mut(&id).unwrap().content = "<p>Surge is <b>water</b>.</p>".into();
        let vars = vars_for(&config);
        let html =
            render_content_page(&config.pages.pages()[0], &config.pages, &config, &vars).into_string();
        assert!(html.contains("<p>Surge is <b>water</b>.</p>"));
        assert!(html.contains(r#"href="../css/base.css""#));
        assert!(html.contains(r#"href="../index.html""#));
    }

    #[test]
    fn inner_node_lists_children() {
        let mut config = sample_config();
        config.pages = page_tree(&[("A", &["A1", "A2"])]);
        let id = config.pages.pages()[0].id.clone();
        config.pages.page_mut(&id).unwrap().inner_node = true;
        let vars = vars_for(&config);
        let html =
            render_content_page(&config.pages.pages()[0], &config.pages, &config, &vars).into_string();
        assert!(html.contains("section-list"));
        assert!(html.contains(r#"<a href="1-2-0.html">A2</a>"#));
        assert!(!html.contains("page-content"));
    }

    #[test]
    fn print_page_lists_content_in_reading_order() {
        let mut config = sample_config();
        config.pages = page_tree(&[("A", &["A1"]), ("B", &[])]);
        let vars = vars_for(&config);
        let html = render_print_page(&config.pages, &config, &vars).into_string();
        let a = html.find("<h1>A</h1>").unwrap();
        let a1 = html.find("<h2>A1</h2>").unwrap();
        let b = html.find("<h1>B</h1>").unwrap();
        assert!(a < a1 && a1 < b);
    }
}
