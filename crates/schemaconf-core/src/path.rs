//! Field paths into a value tree or a bound message.
//!
//! Paths render the way they read in configuration files:
//! `server.http.addr`, `servers[0].addr`, `labels["region"]`.

use std::fmt;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named field or mapping key written in dotted form.
    Field(String),
    /// A position inside a sequence.
    Index(usize),
    /// A map key that is rendered in bracket form.
    Key(String),
}

/// A path from the root of a tree (or message) to one of its nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, pointing at the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` if this path points at the root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the path segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns a new path extended by a named field.
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.with(PathSegment::Field(name.into()))
    }

    /// Returns a new path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        self.with(PathSegment::Index(index))
    }

    /// Returns a new path extended by a bracketed map key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.with(PathSegment::Key(key.into()))
    }

    /// Appends a segment in place.
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Removes the last segment in place.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    fn with(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    /// Parses a dotted path such as `server.http.addr`.
    fn from(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| PathSegment::Field(s.to_string()))
            .collect();
        Self { segments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mixed_segments() {
        let path = FieldPath::root()
            .field("servers")
            .index(0)
            .field("labels")
            .key("region");
        assert_eq!(path.to_string(), r#"servers[0].labels["region"]"#);
    }

    #[test]
    fn test_root_renders_empty() {
        assert!(FieldPath::root().is_root());
        assert_eq!(FieldPath::root().to_string(), "");
    }

    #[test]
    fn test_from_dotted() {
        let path = FieldPath::from("server.http.addr");
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "server.http.addr");
    }
}
