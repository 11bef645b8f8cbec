//! Extraction settings for the hierarchy source reader.

/// Default depth cutoff applied to both explicit and heading-derived outlines.
pub const DEFAULT_MAX_LEVEL: i32 = 6;

/// Node-set query selecting heading-like elements when no explicit TOC exists.
pub const DEFAULT_HEADING_QUERY: &str = "//heading|//section/title";

/// Settings that control how bookmarks are extracted from a source document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineConfig {
    max_level: i32,
    heading_query: String,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            heading_query: DEFAULT_HEADING_QUERY.to_string(),
        }
    }
}

impl OutlineConfig {
    /// Creates a configuration using the crate defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the maximum bookmark level.
    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    /// Returns the query used to select headings in implicit mode.
    pub fn heading_query(&self) -> &str {
        &self.heading_query
    }

    /// Sets the maximum bookmark level and returns the updated configuration.
    pub fn with_max_level(mut self, max_level: i32) -> Self {
        self.max_level = max_level;
        self
    }

    /// Replaces the heading query and returns the updated configuration.
    pub fn with_heading_query(mut self, query: impl Into<String>) -> Self {
        self.heading_query = query.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = OutlineConfig::new();
        assert_eq!(config.max_level(), 6);
        assert_eq!(config.heading_query(), "//heading|//section/title");
    }

    #[test]
    fn builder_overrides_values() {
        let config = OutlineConfig::new()
            .with_max_level(3)
            .with_heading_query("//title");
        assert_eq!(config.max_level(), 3);
        assert_eq!(config.heading_query(), "//title");
    }
}
