//! Error type shared by the outline pipeline.

use thiserror::Error;

/// Errors that can occur while loading a source document or embedding an outline.
///
/// Only conditions that prevent any output from being produced surface here.
/// Malformed levels, unresolved anchors and level gaps are repaired in place.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// The source text is not well-formed XML.
    #[error("Failed to parse source document: {0}")]
    Xml(#[from] roxmltree::Error),
    /// A node-set query expression could not be parsed.
    #[error("Invalid query expression '{expression}': {reason}")]
    Query {
        /// The offending expression.
        expression: String,
        /// What the parser expected at the failure point.
        reason: String,
    },
    /// The PDF bytes could not be parsed or written by `lopdf`.
    #[cfg(feature = "pdf")]
    #[error("Failed to process PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    /// Reading or writing the artifact failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A required catalog entry was missing from the document trailer.
    #[error("PDF catalog entry is missing")]
    MissingCatalog,
    /// The catalog object was not a dictionary, preventing outline injection.
    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = OutlineError> = std::result::Result<T, E>;
