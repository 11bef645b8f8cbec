//! Read-only view of an already paginated rendering.
//!
//! Coordinates are expressed in device units.  The whole document is laid
//! out as one continuous vertical strip: page `n` starts where page `n - 1`
//! ends, and box positions are absolute within that strip.

use std::collections::HashMap;

use crate::model::SourcePosition;

/// Queries needed to turn a bookmark into a page location.
pub trait LayoutQuery {
    /// Returns the box rendered for the element with the given identifier.
    fn box_by_id(&self, id: &str) -> Option<&LayoutBox>;

    /// Returns the box rendered for the element at `position` in the source.
    fn box_at(&self, position: SourcePosition) -> Option<&LayoutBox>;

    /// Returns the page containing the absolute vertical coordinate `y`.
    fn page_containing(&self, y: i32) -> Option<&PageGeometry>;

    /// Number of device units per PDF point.
    fn dots_per_point(&self) -> f32;

    /// Offset added to page ordinals when addressing pages of the artifact.
    fn start_page(&self) -> usize {
        0
    }
}

/// How a box participates in layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxKind {
    /// Block-level box, located by its top edge.
    Block,
    /// Line box, located by its text baseline.
    Inline {
        /// Distance from the top of the box to the baseline.
        baseline: i32,
    },
}

/// Geometry of a rendered box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutBox {
    abs_y: i32,
    kind: BoxKind,
}

impl LayoutBox {
    /// Creates a block box whose top edge lies at `abs_y`.
    pub fn block(abs_y: i32) -> Self {
        Self {
            abs_y,
            kind: BoxKind::Block,
        }
    }

    /// Creates an inline box whose top edge lies at `abs_y`.
    pub fn inline(abs_y: i32, baseline: i32) -> Self {
        Self {
            abs_y,
            kind: BoxKind::Inline { baseline },
        }
    }

    /// Absolute position of the top edge.
    pub fn abs_y(&self) -> i32 {
        self.abs_y
    }

    /// Returns the layout kind.
    pub fn kind(&self) -> BoxKind {
        self.kind
    }

    /// Vertical coordinate used to pick the page holding this box.
    ///
    /// Inline content uses its baseline so that a line straddling a page
    /// break is attributed to the page where its text is visible.
    pub fn page_ref_y(&self) -> i32 {
        match self.kind {
            BoxKind::Block => self.abs_y,
            BoxKind::Inline { baseline } => self.abs_y.saturating_add(baseline),
        }
    }
}

/// Geometry of a single page in the vertical strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageGeometry {
    ordinal: usize,
    top: i32,
    height: i32,
    margin_top: i32,
}

impl PageGeometry {
    /// Describes a page of a rendering backend.
    ///
    /// `top` is the absolute position of the page's top edge in the same
    /// vertical strip as the boxes, `margin_top` the combined top margin,
    /// border and padding of the page box.
    pub fn new(ordinal: usize, top: i32, height: i32, margin_top: i32) -> Self {
        Self {
            ordinal,
            top,
            height,
            margin_top,
        }
    }

    /// Zero-based page number.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Absolute position of the page's top edge.
    pub fn top(&self) -> i32 {
        self.top
    }

    /// Absolute position just below the page's bottom edge.
    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }

    /// Page height.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Combined top margin, border and padding of the page box.
    pub fn margin_top(&self) -> i32 {
        self.margin_top
    }
}

/// An in-memory [`LayoutQuery`] assembled from known page and box geometry.
#[derive(Clone, Debug)]
pub struct PagedLayout {
    pages: Vec<PageGeometry>,
    by_id: HashMap<String, LayoutBox>,
    by_position: HashMap<SourcePosition, LayoutBox>,
    dots_per_point: f32,
    start_page: usize,
}

impl Default for PagedLayout {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PagedLayout {
    /// Creates an empty layout using the given device resolution.
    pub fn new(dots_per_point: f32) -> Self {
        Self {
            pages: Vec::new(),
            by_id: HashMap::new(),
            by_position: HashMap::new(),
            dots_per_point,
            start_page: 0,
        }
    }

    /// Appends a page below the previous one and returns the updated layout.
    pub fn with_page(mut self, height: i32, margin_top: i32) -> Self {
        self.push_page(height, margin_top);
        self
    }

    /// Appends a page below the previous one.
    pub fn push_page(&mut self, height: i32, margin_top: i32) -> &PageGeometry {
        let top = self.pages.last().map(PageGeometry::bottom).unwrap_or(0);
        let ordinal = self.pages.len();
        self.pages
            .push(PageGeometry::new(ordinal, top, height, margin_top));
        &self.pages[ordinal]
    }

    /// Registers the box of the element with identifier `id`.
    pub fn with_box(mut self, id: impl Into<String>, layout_box: LayoutBox) -> Self {
        self.by_id.insert(id.into(), layout_box);
        self
    }

    /// Registers the box of the element at `position` in the source.
    pub fn with_box_at(mut self, position: SourcePosition, layout_box: LayoutBox) -> Self {
        self.by_position.insert(position, layout_box);
        self
    }

    /// Sets the offset added to page ordinals and returns the updated layout.
    pub fn with_start_page(mut self, start_page: usize) -> Self {
        self.start_page = start_page;
        self
    }

    /// Registers the box of the element with identifier `id`.
    pub fn insert_box(&mut self, id: impl Into<String>, layout_box: LayoutBox) {
        self.by_id.insert(id.into(), layout_box);
    }

    /// Returns the pages in order.
    pub fn pages(&self) -> &[PageGeometry] {
        &self.pages
    }
}

impl LayoutQuery for PagedLayout {
    fn box_by_id(&self, id: &str) -> Option<&LayoutBox> {
        self.by_id.get(id)
    }

    fn box_at(&self, position: SourcePosition) -> Option<&LayoutBox> {
        self.by_position.get(&position)
    }

    fn page_containing(&self, y: i32) -> Option<&PageGeometry> {
        if y < 0 {
            return None;
        }
        // Pages are contiguous, so anything below the last page clamps to it.
        let index = self.pages.partition_point(|page| page.top <= y);
        self.pages.get(index.checked_sub(1)?)
    }

    fn dots_per_point(&self) -> f32 {
        self.dots_per_point
    }

    fn start_page(&self) -> usize {
        self.start_page
    }
}
