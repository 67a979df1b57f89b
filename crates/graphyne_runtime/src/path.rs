//! Persistent response paths.
//!
//! A `Path` is an immutable linked list shared structurally between
//! siblings: extending a path never mutates the parent, so concurrent
//! field tasks can hold cheap clones of their own branch.

use std::sync::Arc;

use crate::error::PathSegment;

/// A path from the response root to one field or list position.
#[derive(Debug, Clone, Default)]
pub struct Path {
    node: Option<Arc<PathNode>>,
}

#[derive(Debug)]
struct PathNode {
    segment: PathSegment,
    parent_type: Option<String>,
    previous: Option<Arc<PathNode>>,
}

impl Path {
    /// The empty path at the response root.
    #[must_use]
    pub fn root() -> Self {
        Self { node: None }
    }

    /// Extends the path with a field step, recording the parent type
    /// the field was selected on.
    #[must_use]
    pub fn field(&self, key: impl Into<String>, parent_type: impl Into<String>) -> Self {
        Self {
            node: Some(Arc::new(PathNode {
                segment: PathSegment::Field(key.into()),
                parent_type: Some(parent_type.into()),
                previous: self.node.clone(),
            })),
        }
    }

    /// Extends the path with a list index step.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self {
            node: Some(Arc::new(PathNode {
                segment: PathSegment::Index(index),
                parent_type: None,
                previous: self.node.clone(),
            })),
        }
    }

    /// Returns true if this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.node.is_none()
    }

    /// Number of steps from the root.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut current = self.node.as_deref();
        while let Some(node) = current {
            len += 1;
            current = node.previous.as_deref();
        }
        len
    }

    /// Returns true if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// Materializes the path as segments ordered root to leaf.
    #[must_use]
    pub fn to_segments(&self) -> Vec<PathSegment> {
        let mut segments = Vec::with_capacity(self.len());
        let mut current = self.node.as_deref();
        while let Some(node) = current {
            segments.push(node.segment.clone());
            current = node.previous.as_deref();
        }
        segments.reverse();
        segments
    }

    /// Returns `(parent_type, response_key)` of the innermost field
    /// step, skipping over list indexes.
    #[must_use]
    pub fn nearest_field(&self) -> Option<(&str, &str)> {
        let mut current = self.node.as_deref();
        while let Some(node) = current {
            if let (PathSegment::Field(key), Some(parent)) =
                (&node.segment, node.parent_type.as_deref())
            {
                return Some((parent, key));
            }
            current = node.previous.as_deref();
        }
        None
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (position, segment) in self.to_segments().iter().enumerate() {
            match segment {
                PathSegment::Field(name) if position == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_ordered_root_to_leaf() {
        let path = Path::root()
            .field("users", "Query")
            .index(2)
            .field("name", "User");
        assert_eq!(
            path.to_segments(),
            vec![
                PathSegment::Field("users".to_string()),
                PathSegment::Index(2),
                PathSegment::Field("name".to_string()),
            ]
        );
        assert_eq!(path.len(), 3);
        assert!(!path.is_root());
    }

    #[test]
    fn test_extension_leaves_parent_untouched() {
        let parent = Path::root().field("users", "Query");
        let left = parent.index(0);
        let right = parent.index(1);
        assert_eq!(parent.len(), 1);
        assert_eq!(left.to_segments()[1], PathSegment::Index(0));
        assert_eq!(right.to_segments()[1], PathSegment::Index(1));
    }

    #[test]
    fn test_nearest_field_skips_indexes() {
        let path = Path::root().field("items", "Query").index(4).index(0);
        assert_eq!(path.nearest_field(), Some(("Query", "items")));
        assert_eq!(Path::root().nearest_field(), None);
    }

    #[test]
    fn test_display() {
        let path = Path::root()
            .field("users", "Query")
            .index(2)
            .field("name", "User");
        assert_eq!(path.to_string(), "users[2].name");
        assert_eq!(Path::root().to_string(), "");
    }
}
