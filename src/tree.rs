//! Reconstruction of an outline tree from a flat sequence of leveled headings.

use crate::model::{Bookmark, Bookmarks, NodeId, SourcePosition};

/// Builds a [`Bookmarks`] forest from headings delivered in document order.
///
/// The builder keeps the lineage of the most recently placed heading on an
/// ancestor stack, so the stack length always equals the level of the last
/// node pushed.  When a heading skips levels, ghost nodes are synthesized so
/// that every node ends up at the depth named by its level.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    bookmarks: Bookmarks,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the next heading and returns its identifier.
    ///
    /// Levels below `1` start a new root, just like level `1`.
    pub fn push(
        &mut self,
        bookmark: Bookmark,
        level: i32,
        position: Option<SourcePosition>,
    ) -> NodeId {
        let level = usize::try_from(level).unwrap_or(0).max(1);

        // Drop siblings and their descendants.
        self.stack.truncate(level - 1);

        if level == 1 {
            let id = self.bookmarks.add_root(bookmark, position);
            self.stack.push(id);
            return id;
        }

        let mut parent = self.stack.last().copied();
        while self.stack.len() + 1 < level {
            let ghost = match parent {
                Some(parent) => self.bookmarks.add_child(parent, Bookmark::Ghost, None),
                None => self.bookmarks.add_root(Bookmark::Ghost, None),
            };
            self.stack.push(ghost);
            parent = Some(ghost);
        }

        let id = match parent {
            Some(parent) => self.bookmarks.add_child(parent, bookmark, position),
            None => self.bookmarks.add_root(bookmark, position),
        };
        self.stack.push(id);
        id
    }

    /// Consumes the builder and returns the forest.
    pub fn finish(self) -> Bookmarks {
        self.bookmarks
    }
}

/// Builds a forest from `(bookmark, level)` pairs in document order.
pub fn build<I>(headings: I) -> Bookmarks
where
    I: IntoIterator<Item = (Bookmark, i32)>,
{
    let mut builder = TreeBuilder::new();
    for (bookmark, level) in headings {
        builder.push(bookmark, level, None);
    }
    builder.finish()
}
