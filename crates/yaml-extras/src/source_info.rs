//! Source location information for YAML nodes and directive errors.

use std::fmt;

/// Source location of a node in the document it was composed from.
///
/// Directive errors carry one of these so a failed load can point at the
/// offending tag: `children.yml:4:9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Optional filename or source identifier
    pub file: Option<String>,

    /// Character offset from start of source (0-based)
    pub offset: usize,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters not bytes)
    pub col: usize,

    /// Length in characters
    pub len: usize,
}

impl SourceInfo {
    /// Create a new SourceInfo with all fields specified.
    pub fn new(file: Option<String>, offset: usize, line: usize, col: usize, len: usize) -> Self {
        Self {
            file,
            offset,
            line,
            col,
            len,
        }
    }

    /// Create a SourceInfo from a yaml-rust2::Marker.
    ///
    /// The marker provides the starting position. Length must be computed
    /// separately based on the content.
    pub fn from_marker(marker: &yaml_rust2::scanner::Marker, len: usize) -> Self {
        Self {
            file: None,
            offset: marker.index(),
            line: marker.line(), // yaml-rust2 lines are already 1-based
            col: marker.col() + 1,
            len,
        }
    }

    /// Set the filename for this source location.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
            line: 1,
            col: 1,
            len: 0,
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.col),
            None => write!(f, "<input>:{}:{}", self.line, self.col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info_creation() {
        let info = SourceInfo::new(Some("test.yaml".into()), 10, 2, 5, 8);
        assert_eq!(info.file, Some("test.yaml".into()));
        assert_eq!(info.offset, 10);
        assert_eq!(info.line, 2);
        assert_eq!(info.col, 5);
        assert_eq!(info.len, 8);
    }

    #[test]
    fn test_display_with_and_without_file() {
        let info = SourceInfo::new(None, 0, 3, 7, 1);
        assert_eq!(info.to_string(), "<input>:3:7");
        assert_eq!(info.with_file("doc.yml").to_string(), "doc.yml:3:7");
    }

    #[test]
    fn test_from_marker_lines_and_columns() {
        let stream = crate::EventStream::parse("a: 1\nb: 22\n", None).unwrap();
        let value = stream
            .events()
            .iter()
            .rev()
            .find(|e| matches!(e.event, yaml_rust2::Event::Scalar(..)))
            .unwrap();
        let info = SourceInfo::from_marker(&value.marker, 2);
        assert_eq!(info.offset, 8);
        assert_eq!(info.line, 2);
        assert_eq!(info.col, 4);
        assert_eq!(info.len, 2);
    }

    #[test]
    fn test_default() {
        let info = SourceInfo::default();
        assert_eq!(info.file, None);
        assert_eq!(info.offset, 0);
        assert_eq!(info.line, 1);
        assert_eq!(info.col, 1);
        assert_eq!(info.len, 0);
    }
}
