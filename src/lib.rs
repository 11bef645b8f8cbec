//! Core entry point for the psml_outline crate.
//!
//! Bookmarks are read from a PSML document ([`source`]), nested by level
//! ([`tree`]), resolved against the geometry of the rendered pages
//! ([`layout`], [`destination`]) and written as a navigable outline
//! ([`outline`], and [`pdf`] for `lopdf` documents).

pub mod config;
pub mod destination;
pub mod error;
pub mod layout;
pub mod model;
pub mod outline;
pub mod query;
pub mod source;
pub mod tree;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use config::OutlineConfig;
pub use destination::Destination;
pub use error::{OutlineError, Result};
pub use layout::{LayoutQuery, PagedLayout};
pub use model::{Bookmark, BookmarkNode, Bookmarks, NodeId, SourcePosition};
pub use outline::{write_outline, OutlineSink};
