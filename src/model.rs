//! Data structures describing a bookmark outline.
//!
//! The outline is a forest stored in an arena: every [`BookmarkNode`] lives in
//! a single vector owned by [`Bookmarks`] and refers to its children through
//! [`NodeId`] indices.  Children never point back at their parent.

use std::fmt;

/// Index of a node inside a [`Bookmarks`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Lookup key for the rendered box of a source element.
///
/// The value is the byte offset of the element in the source text.  It is
/// only a key: the box itself stays owned by the layout that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePosition(pub usize);

/// Label carried by a bookmark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bookmark {
    /// A bookmark read from the source document.
    Real {
        /// Display text shown in the outline panel.
        name: String,
        /// Identifier of the target element, empty when the node carries a position instead.
        anchor: String,
    },
    /// Placeholder synthesized to fill a gap between heading levels.
    Ghost,
}

impl Bookmark {
    /// Creates a bookmark read from the source document.
    pub fn new(name: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self::Real {
            name: name.into(),
            anchor: anchor.into(),
        }
    }

    /// Returns the display text, empty for ghosts.
    pub fn name(&self) -> &str {
        match self {
            Self::Real { name, .. } => name,
            Self::Ghost => "",
        }
    }

    /// Returns the anchor, empty for ghosts.
    pub fn anchor(&self) -> &str {
        match self {
            Self::Real { anchor, .. } => anchor,
            Self::Ghost => "",
        }
    }

    /// Indicates whether this label was synthesized.
    pub fn is_ghost(&self) -> bool {
        matches!(self, Self::Ghost)
    }
}

/// A single entry of the outline forest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookmarkNode {
    bookmark: Bookmark,
    position: Option<SourcePosition>,
    children: Vec<NodeId>,
}

impl BookmarkNode {
    fn new(bookmark: Bookmark, position: Option<SourcePosition>) -> Self {
        Self {
            bookmark,
            position,
            children: Vec::new(),
        }
    }

    /// Returns the label.
    pub fn bookmark(&self) -> &Bookmark {
        &self.bookmark
    }

    /// Returns the display text.
    pub fn name(&self) -> &str {
        self.bookmark.name()
    }

    /// Returns the anchor identifier, empty when none was given.
    pub fn anchor(&self) -> &str {
        self.bookmark.anchor()
    }

    /// Returns the position captured when the node was created, if any.
    pub fn position(&self) -> Option<SourcePosition> {
        self.position
    }

    /// Returns the children in discovery order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Indicates whether the node is a synthesized placeholder.
    pub fn is_ghost(&self) -> bool {
        self.bookmark.is_ghost()
    }
}

/// A forest of bookmarks.
///
/// Nodes are only ever appended: a node is created once, attached either as a
/// root or as the last child of an existing node, and never moved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bookmarks {
    nodes: Vec<BookmarkNode>,
    roots: Vec<NodeId>,
}

impl Bookmarks {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new top-level node and returns its identifier.
    pub fn add_root(&mut self, bookmark: Bookmark, position: Option<SourcePosition>) -> NodeId {
        let id = self.allocate(bookmark, position);
        self.roots.push(id);
        id
    }

    /// Appends a new node under `parent` and returns its identifier.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this forest.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        bookmark: Bookmark,
        position: Option<SourcePosition>,
    ) -> NodeId {
        let id = self.allocate(bookmark, position);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn allocate(&mut self, bookmark: Bookmark, position: Option<SourcePosition>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(BookmarkNode::new(bookmark, position));
        id
    }

    /// Returns the top-level nodes in the order they were created.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the node with the given identifier.
    pub fn get(&self, id: NodeId) -> Option<&BookmarkNode> {
        self.nodes.get(id.0)
    }

    /// Returns the node with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this forest.
    pub fn node(&self, id: NodeId) -> &BookmarkNode {
        &self.nodes[id.0]
    }

    /// Returns the children of `id`, or an empty slice for unknown identifiers.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(BookmarkNode::children).unwrap_or(&[])
    }

    /// Total number of nodes, ghosts included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Indicates whether the forest has no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of synthesized placeholder nodes.
    pub fn ghost_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_ghost()).count()
    }

    /// Depth of the deepest branch, `0` for an empty forest.
    pub fn depth(&self) -> usize {
        self.walk().map(|(depth, _, _)| depth).max().unwrap_or(0)
    }

    /// Iterates over every reachable node depth-first, in stored child order.
    ///
    /// Depths start at `1` for roots, which matches the bookmark level.
    pub fn walk(&self) -> Walk<'_> {
        let stack = self.roots.iter().rev().map(|id| (1, *id)).collect();
        Walk {
            bookmarks: self,
            stack,
        }
    }
}

impl fmt::Display for Bookmarks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut previous = 0;
        for (depth, _, node) in self.walk() {
            if depth > previous {
                if previous > 0 {
                    f.write_str(" [")?;
                }
            } else {
                for _ in depth..previous {
                    f.write_str("}]")?;
                }
                f.write_str("}, ")?;
            }
            write!(f, "{{{} @{}", node.name(), node.anchor())?;
            previous = depth;
        }
        for _ in 1..previous {
            f.write_str("}]")?;
        }
        if previous > 0 {
            f.write_str("}")?;
        }
        f.write_str("]")
    }
}

/// Depth-first iterator returned by [`Bookmarks::walk`].
pub struct Walk<'a> {
    bookmarks: &'a Bookmarks,
    stack: Vec<(usize, NodeId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, NodeId, &'a BookmarkNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        let bookmarks = self.bookmarks;
        let node = bookmarks.node(id);
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, *child)));
        Some((depth, id, node))
    }
}
