//! Mapping of bookmarks onto page locations.

use crate::layout::{LayoutBox, LayoutQuery};
use crate::model::BookmarkNode;

/// Where an outline entry jumps to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Destination {
    /// A precise location on a page.
    Xyz {
        /// Zero-based page index in the artifact.
        page_index: usize,
        /// Distance in points from the bottom of the page.
        top: f32,
    },
    /// No precise location: open a page fitted to its width.
    FitPage,
}

impl Destination {
    /// Returns the page index of precise destinations.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            Self::Xyz { page_index, .. } => Some(*page_index),
            Self::FitPage => None,
        }
    }
}

/// Resolves the destination of `node`.
///
/// A non-empty anchor is looked up by identifier, otherwise the position
/// captured when the node was created is used.  Nodes whose box cannot be
/// found resolve to [`Destination::FitPage`].
pub fn resolve<L>(layout: &L, node: &BookmarkNode) -> Destination
where
    L: LayoutQuery + ?Sized,
{
    let layout_box = if node.anchor().is_empty() {
        node.position().and_then(|position| layout.box_at(position))
    } else {
        layout.box_by_id(node.anchor())
    };

    layout_box
        .and_then(|layout_box| locate(layout, layout_box))
        .unwrap_or(Destination::FitPage)
}

/// Computes the page and vertical offset of a rendered box.
pub fn locate<L>(layout: &L, layout_box: &LayoutBox) -> Option<Destination>
where
    L: LayoutQuery + ?Sized,
{
    let page = layout.page_containing(layout_box.page_ref_y())?;
    let dots_per_point = layout.dots_per_point();

    let distance_from_top =
        i64::from(page.margin_top()) + i64::from(layout_box.abs_y()) - i64::from(page.top());
    let page_height = page.height() as f32 / dots_per_point;
    let top = page_height - distance_from_top as f32 / dots_per_point;

    Some(Destination::Xyz {
        page_index: layout.start_page() + page.ordinal(),
        top,
    })
}
