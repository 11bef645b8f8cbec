//! Emission of a bookmark forest into a navigable outline.

use log::{debug, info};

use crate::destination::{self, Destination};
use crate::layout::LayoutQuery;
use crate::model::{Bookmarks, NodeId};

/// Receives outline entries as the forest is walked.
pub trait OutlineSink {
    /// Handle of an entry already added to the sink.
    type Entry: Copy;

    /// Adds an entry under `parent`, or at the top level when `parent` is `None`.
    fn add_entry(
        &mut self,
        parent: Option<Self::Entry>,
        title: &str,
        destination: &Destination,
    ) -> Self::Entry;

    /// Asks viewers to show the outline panel when the artifact is opened.
    fn use_outlines(&mut self);
}

/// Writes every bookmark into `sink` depth-first and returns the entry count.
///
/// An empty forest leaves the sink untouched.
pub fn write_outline<L, S>(bookmarks: &Bookmarks, layout: &L, sink: &mut S) -> usize
where
    L: LayoutQuery + ?Sized,
    S: OutlineSink + ?Sized,
{
    if bookmarks.is_empty() {
        info!("No bookmarks to render");
        return 0;
    }

    sink.use_outlines();

    let mut pending: Vec<(Option<S::Entry>, NodeId)> =
        bookmarks.roots().iter().rev().map(|id| (None, *id)).collect();
    let mut written = 0;
    while let Some((parent, id)) = pending.pop() {
        let node = bookmarks.node(id);
        debug!("Writing bookmark {} {}", node.name(), node.anchor());

        let target = destination::resolve(layout, node);
        let entry = sink.add_entry(parent, node.name(), &target);
        pending.extend(node.children().iter().rev().map(|child| (Some(entry), *child)));
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutBox, PagedLayout};
    use crate::model::Bookmark;
    use crate::tree;

    #[derive(Default)]
    struct Recorder {
        entries: Vec<(Option<usize>, String, Destination)>,
        use_outlines: bool,
    }

    impl OutlineSink for Recorder {
        type Entry = usize;

        fn add_entry(
            &mut self,
            parent: Option<usize>,
            title: &str,
            destination: &Destination,
        ) -> usize {
            self.entries.push((parent, title.to_string(), *destination));
            self.entries.len() - 1
        }

        fn use_outlines(&mut self) {
            self.use_outlines = true;
        }
    }

    #[test]
    fn empty_forest_has_no_side_effects() {
        let mut recorder = Recorder::default();

        let written = write_outline(&Bookmarks::new(), &PagedLayout::default(), &mut recorder);

        assert_eq!(written, 0);
        assert!(!recorder.use_outlines);
        assert!(recorder.entries.is_empty());
    }

    #[test]
    fn entries_follow_depth_first_order() {
        let bookmarks = tree::build([
            (Bookmark::new("A", "a"), 1),
            (Bookmark::new("A.1", ""), 2),
            (Bookmark::new("A.1.1", ""), 3),
            (Bookmark::new("A.2", ""), 2),
            (Bookmark::new("B", ""), 1),
        ]);
        let layout = PagedLayout::new(1.0)
            .with_page(800, 0)
            .with_box("a", LayoutBox::block(100));
        let mut recorder = Recorder::default();

        let written = write_outline(&bookmarks, &layout, &mut recorder);

        assert_eq!(written, 5);
        assert!(recorder.use_outlines);
        let shape: Vec<_> = recorder
            .entries
            .iter()
            .map(|(parent, title, _)| (*parent, title.as_str()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (None, "A"),
                (Some(0), "A.1"),
                (Some(1), "A.1.1"),
                (Some(0), "A.2"),
                (None, "B"),
            ]
        );
        assert_eq!(
            recorder.entries[0].2,
            Destination::Xyz {
                page_index: 0,
                top: 700.0,
            }
        );
        assert_eq!(recorder.entries[4].2, Destination::FitPage);
    }

    #[test]
    fn ghosts_are_written_with_empty_titles() {
        let bookmarks = tree::build([(Bookmark::new("Deep", ""), 3)]);
        let mut recorder = Recorder::default();

        write_outline(&bookmarks, &PagedLayout::default(), &mut recorder);

        let titles: Vec<_> = recorder.entries.iter().map(|entry| entry.1.as_str()).collect();
        assert_eq!(titles, vec!["", "", "Deep"]);
    }

    #[test]
    fn deep_ghost_chains_are_written() {
        let bookmarks = tree::build([(Bookmark::new("Deep", ""), 100_000)]);
        let mut recorder = Recorder::default();

        let written = write_outline(&bookmarks, &PagedLayout::default(), &mut recorder);

        assert_eq!(written, 100_000);
        let last = recorder.entries.last().expect("entry");
        assert_eq!(last.0, Some(99_998));
        assert_eq!(last.1, "Deep");
    }
}
