//! Extraction of bookmark candidates from a PSML source document.
//!
//! Documents either carry an explicit table of contents (`toc/toc-tree` with
//! nested `toc-part` elements) that is copied one-to-one, or only headings, in
//! which case the hierarchy is reconstructed from heading levels by the
//! [`TreeBuilder`].

use log::{debug, warn};
use roxmltree::{Document, Node};

use crate::config::OutlineConfig;
use crate::error::Result;
use crate::model::{Bookmark, Bookmarks, NodeId, SourcePosition};
use crate::query;
use crate::tree::TreeBuilder;

/// Level assumed for headings without a usable `level` attribute.
pub const DEFAULT_HEADING_LEVEL: i32 = 3;

/// Level assumed for TOC parts without a usable `level` attribute.
///
/// Being below any cutoff, it always allows descending into children.
pub const DEFAULT_PART_LEVEL: i32 = -1;

/// Where the outline hierarchy of a document comes from.
#[derive(Clone, Copy, Debug)]
pub enum SourceKind<'a, 'input> {
    /// The document carries a non-empty `toc` element.
    Explicit(Node<'a, 'input>),
    /// Headings must be scanned and nested by level.
    Implicit,
}

impl<'a, 'input> SourceKind<'a, 'input> {
    /// Decides the source kind of `document` once.
    pub fn detect(document: &'a Document<'input>) -> Self {
        match child_element(document.root_element(), "toc") {
            Some(toc) if toc.has_children() => Self::Explicit(toc),
            _ => Self::Implicit,
        }
    }

    /// Indicates whether the outline is copied from an explicit TOC.
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

/// Loads bookmarks from an already parsed document.
pub fn load(document: &Document<'_>, config: &OutlineConfig) -> Bookmarks {
    match SourceKind::detect(document) {
        SourceKind::Explicit(toc) => load_from_toc(toc, config.max_level()),
        SourceKind::Implicit => load_from_headings(document, config),
    }
}

/// Parses `text` as XML and loads its bookmarks.
pub fn load_str(text: &str, config: &OutlineConfig) -> Result<Bookmarks> {
    let document = Document::parse(text)?;
    Ok(load(&document, config))
}

fn load_from_toc(toc: Node<'_, '_>, max_level: i32) -> Bookmarks {
    let mut bookmarks = Bookmarks::new();
    if let Some(tree) = child_element(toc, "toc-tree") {
        for part in child_elements(tree, "toc-part") {
            load_part(&mut bookmarks, None, part, max_level);
        }
    }
    bookmarks
}

fn load_part(
    bookmarks: &mut Bookmarks,
    parent: Option<NodeId>,
    part: Node<'_, '_>,
    max_level: i32,
) {
    let bookmark = bookmark_from_part(part);
    let id = match parent {
        Some(parent) => bookmarks.add_child(parent, bookmark, None),
        None => bookmarks.add_root(bookmark, None),
    };

    let level = int_attribute(part, "level", DEFAULT_PART_LEVEL);
    if level < max_level {
        for child in child_elements(part, "toc-part") {
            load_part(bookmarks, Some(id), child, max_level);
        }
    }
}

fn load_from_headings(document: &Document<'_>, config: &OutlineConfig) -> Bookmarks {
    let headings = match query::select(document, config.heading_query()) {
        Ok(headings) => headings,
        Err(err) => {
            warn!("Unable to extract bookmarks from headings: {err}");
            return Bookmarks::new();
        }
    };

    let mut builder = TreeBuilder::new();
    for heading in headings {
        let level = heading_level(heading);
        if level <= config.max_level() {
            let position = SourcePosition(heading.range().start);
            builder.push(bookmark_from_heading(heading), level, Some(position));
        } else {
            debug!("Ignoring heading at level {level}");
        }
    }
    builder.finish()
}

fn heading_level(heading: Node<'_, '_>) -> i32 {
    match int_attribute(heading, "level", DEFAULT_HEADING_LEVEL) {
        level if level < 1 => DEFAULT_HEADING_LEVEL,
        level => level,
    }
}

/// Creates a bookmark from a `toc-part` element.
///
/// The name joins the `prefix` and normalized `title` attributes, the anchor
/// is the `idref` attribute.
pub fn bookmark_from_part(part: Node<'_, '_>) -> Bookmark {
    let title = normalize_space(part.attribute("title").unwrap_or_default());
    let prefix = part.attribute("prefix").unwrap_or_default();
    let anchor = part.attribute("idref").unwrap_or_default();
    Bookmark::new(join_prefix(prefix, &title), anchor)
}

/// Creates a bookmark from a heading element.
///
/// The name joins the `prefix` attribute and the normalized text content, the
/// anchor is the `id` attribute.
pub fn bookmark_from_heading(heading: Node<'_, '_>) -> Bookmark {
    let title = normalize_space(&text_content(heading));
    let prefix = heading.attribute("prefix").unwrap_or_default();
    let anchor = heading.attribute("id").unwrap_or_default();
    Bookmark::new(join_prefix(prefix, &title), anchor)
}

fn join_prefix(prefix: &str, title: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        title.to_string()
    } else {
        normalize_space(&format!("{prefix} {title}"))
    }
}

/// Trims `text` and collapses every run of whitespace into a single space.
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|text| text.text())
        .collect()
}

fn int_attribute(node: Node<'_, '_>, name: &str, default: i32) -> i32 {
    node.attribute(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn child_elements<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|child| child.is_element() && child.tag_name().name() == name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(bookmarks: &Bookmarks, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| bookmarks.node(*id).name().to_string())
            .collect()
    }

    fn load_xml(xml: &str, max_level: i32) -> Bookmarks {
        load_str(xml, &OutlineConfig::new().with_max_level(max_level)).expect("parse xml")
    }

    const HEADINGS: &str = "<document>\
        <heading level=\"1\" id=\"h-1\">Title</heading>\
        <heading level=\"2\" id=\"h-2\" prefix=\"A\">Part A</heading>\
        <heading level=\"3\" id=\"h-3\">Example 1</heading>\
        <heading level=\"3\" id=\"h-4\">Example 2</heading>\
        <heading level=\"4\" id=\"h-5\">Ignored</heading>\
        <heading level=\"2\" id=\"h-6\" prefix=\"B\">Part B</heading>\
        <heading level=\"3\" id=\"h-7\">Example 3</heading>\
        </document>";

    #[test]
    fn headings_respect_max_level() {
        let bookmarks = load_xml(HEADINGS, 3);

        assert_eq!(names(&bookmarks, bookmarks.roots()), vec!["Title"]);
        let root = bookmarks.roots()[0];
        let parts = bookmarks.children(root);
        assert_eq!(names(&bookmarks, parts), vec!["A Part A", "B Part B"]);
        assert_eq!(
            names(&bookmarks, bookmarks.children(parts[0])),
            vec!["Example 1", "Example 2"]
        );
        assert_eq!(
            names(&bookmarks, bookmarks.children(parts[1])),
            vec!["Example 3"]
        );
        assert!(bookmarks.walk().all(|(_, _, node)| node.name() != "Ignored"));
        assert_eq!(bookmarks.node(parts[1]).anchor(), "h-6");
    }

    #[test]
    fn headings_capture_source_position() {
        let bookmarks = load_xml(HEADINGS, 6);

        let root = bookmarks.node(bookmarks.roots()[0]);
        let offset = HEADINGS.find("<heading").expect("heading");
        assert_eq!(root.position(), Some(SourcePosition(offset)));
    }

    #[test]
    fn malformed_heading_level_defaults_to_three() {
        let xml = "<document>\
            <heading level=\"1\">Top</heading>\
            <heading level=\"x\">Deep</heading>\
            <heading level=\"0\">Zero</heading>\
            </document>";
        let bookmarks = load_xml(xml, 6);

        let root = bookmarks.roots()[0];
        let ghost = bookmarks.children(root)[0];
        assert!(bookmarks.node(ghost).is_ghost());
        assert_eq!(
            names(&bookmarks, bookmarks.children(ghost)),
            vec!["Deep", "Zero"]
        );
    }

    #[test]
    fn section_titles_are_headings() {
        let xml = "<document>\
            <section><title level=\"1\">  Overview \n of   things </title></section>\
            <section><title level=\"2\"><b>Nested</b> text</title></section>\
            </document>";
        let bookmarks = load_xml(xml, 6);

        let root = bookmarks.roots()[0];
        assert_eq!(bookmarks.node(root).name(), "Overview of things");
        assert_eq!(names(&bookmarks, bookmarks.children(root)), vec!["Nested text"]);
    }

    #[test]
    fn broken_heading_query_yields_empty_outline() {
        let config = OutlineConfig::new().with_heading_query("heading[");
        let bookmarks = load_str(HEADINGS, &config).expect("parse xml");

        assert!(bookmarks.is_empty());
    }

    const TOC: &str = "<document>\
        <toc><toc-tree>\
        <toc-part level=\"1\" title=\"Introduction\" idref=\"p-1\">\
        <toc-part level=\"2\" prefix=\"1.1\" title=\" Scope \" idref=\"p-2\">\
        <toc-part level=\"3\" title=\"Details\" idref=\"p-3\"/>\
        </toc-part>\
        </toc-part>\
        <toc-part level=\"1\" title=\"Appendix\" idref=\"p-4\"/>\
        </toc-tree></toc>\
        <heading level=\"1\">Ignored heading</heading>\
        </document>";

    #[test]
    fn explicit_toc_is_copied() {
        let bookmarks = load_xml(TOC, 6);

        assert_eq!(
            names(&bookmarks, bookmarks.roots()),
            vec!["Introduction", "Appendix"]
        );
        let intro = bookmarks.roots()[0];
        let scope = bookmarks.children(intro)[0];
        assert_eq!(bookmarks.node(scope).name(), "1.1 Scope");
        assert_eq!(bookmarks.node(scope).anchor(), "p-2");
        assert_eq!(names(&bookmarks, bookmarks.children(scope)), vec!["Details"]);
    }

    #[test]
    fn explicit_toc_stops_descending_at_cutoff() {
        let bookmarks = load_xml(TOC, 2);

        let intro = bookmarks.roots()[0];
        let scope = bookmarks.children(intro)[0];
        assert_eq!(bookmarks.node(scope).name(), "1.1 Scope");
        assert!(bookmarks.children(scope).is_empty());
    }

    #[test]
    fn parts_without_level_always_descend() {
        let xml = "<document><toc><toc-tree>\
            <toc-part title=\"A\"><toc-part title=\"B\"><toc-part title=\"C\"/></toc-part></toc-part>\
            </toc-tree></toc></document>";
        let bookmarks = load_xml(xml, 1);

        assert_eq!(bookmarks.depth(), 3);
    }

    #[test]
    fn childless_toc_falls_back_to_headings() {
        let xml = "<document><toc/><heading level=\"1\">Fallback</heading></document>";
        let document = Document::parse(xml).expect("xml");

        assert!(!SourceKind::detect(&document).is_explicit());
        let bookmarks = load(&document, &OutlineConfig::new());
        assert_eq!(names(&bookmarks, bookmarks.roots()), vec!["Fallback"]);
    }

    #[test]
    fn whitespace_only_toc_is_explicit_and_empty() {
        let xml = "<document><toc>  </toc><heading level=\"1\">Ignored</heading></document>";
        let document = Document::parse(xml).expect("xml");

        assert!(SourceKind::detect(&document).is_explicit());
        assert!(load(&document, &OutlineConfig::new()).is_empty());
    }

    #[test]
    fn toc_without_tree_is_empty() {
        let xml = "<document><toc><title>Contents</title></toc><heading level=\"1\">H</heading></document>";

        assert!(load_xml(xml, 6).is_empty());
    }

    #[test]
    fn normalize_space_collapses_runs() {
        assert_eq!(normalize_space("  a \t b\n\nc "), "a b c");
        assert_eq!(normalize_space(" \n "), "");
    }
}
