//! Document paths for error reporting
//!
//! Every validation and render error is tagged with the path from the
//! document root to the offending field, e.g. `slots.main.children[2].kind`.

use serde::Serialize;
use std::fmt;

/// One step in a document path: an object field or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object field access (`slots`, `kind`, ...)
    Field(String),
    /// Sequence index access (`children[2]`)
    Index(usize),
}

/// An ordered walk from the document root to a field.
///
/// Paths are cheap to extend; the validator and renderer clone-and-push as
/// they descend so sibling walks never observe each other's segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocPath(Vec<PathSegment>);

impl DocPath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// True if this path addresses the document root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path with a field segment appended.
    #[must_use]
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Returns a new path with an index segment appended.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// The segments of this path, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for DocPath {
    fn from(field: &str) -> Self {
        DocPath::root().field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_displays_as_marker() {
        assert_eq!(DocPath::root().to_string(), "<root>");
        assert!(DocPath::root().is_root());
    }

    #[test]
    fn nested_path_uses_dots_and_brackets() {
        let path = DocPath::root()
            .field("slots")
            .field("main")
            .field("children")
            .index(2)
            .field("kind");
        assert_eq!(path.to_string(), "slots.main.children[2].kind");
    }

    #[test]
    fn extending_a_path_leaves_the_original_untouched() {
        let base = DocPath::root().field("slots");
        let extended = base.field("main");
        assert_eq!(base.to_string(), "slots");
        assert_eq!(extended.to_string(), "slots.main");
    }

    #[test]
    fn path_serializes_as_mixed_sequence() {
        let path = DocPath::root().field("children").index(1);
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!(["children", 1]));
    }
}
