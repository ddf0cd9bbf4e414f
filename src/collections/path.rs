// ============================================================================
// spark-state - Paths
// Addressing nested locations across maps and sequences
// ============================================================================
//
// A path is an ordered list of segments. Each segment is either a map key or
// a sequence index; one path can cross containers of different kinds.
//
// Resolution rules:
// - Key segment on a map: that key
// - Index segment on a map: the decimal key (`3` addresses `"3"`)
// - Index segment on a sequence: that position
// - Key segment on a sequence: only if the key parses as an index
// ============================================================================

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// =============================================================================
// PATH SEGMENT
// =============================================================================

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Position in a sequence
    Index(usize),
    /// Key in a map
    Key(String),
}

impl PathSegment {
    /// True for index segments. Decides the kind of container materialised
    /// for a missing branch.
    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }

    /// The sequence position this segment addresses, if any.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(k) => k.parse().ok(),
        }
    }

    /// The map key this segment addresses.
    pub fn to_key(&self) -> String {
        match self {
            PathSegment::Index(i) => i.to_string(),
            PathSegment::Key(k) => k.clone(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<i32> for PathSegment {
    /// Negative numbers can never be a position, so they become keys.
    fn from(n: i32) -> Self {
        match usize::try_from(n) {
            Ok(index) => PathSegment::Index(index),
            Err(_) => PathSegment::Key(n.to_string()),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

// =============================================================================
// PATH
// =============================================================================

/// An owned sequence of [`PathSegment`]s.
///
/// Derefs to `[PathSegment]`, so `&path` can be passed to any path operation.
///
/// # Example
///
/// ```
/// use spark_state::{path, Path};
///
/// let built = path!["users", 0, "name"];
/// let parsed: Path = "users.0.name".parse()?;
/// assert_eq!(built, parsed);
/// # Ok::<(), spark_state::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Create a path from segments
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Append a segment (builder style)
    pub fn push(mut self, segment: impl Into<PathSegment>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Consume into the segment list
    pub fn into_segments(self) -> Vec<PathSegment> {
        self.segments
    }
}

impl Deref for Path {
    type Target = [PathSegment];

    fn deref(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl AsRef<[PathSegment]> for Path {
    fn as_ref(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Error;

    /// Parse a dotted path. All-digit components become indices; the empty
    /// string is the empty path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Path::default());
        }

        s.split('.')
            .map(|component| {
                if component.is_empty() {
                    return Err(Error::InvalidPath {
                        path: s.to_string(),
                        reason: "empty component".to_string(),
                    });
                }
                Ok(match component.parse::<usize>() {
                    Ok(index) if component.bytes().all(|b| b.is_ascii_digit()) => {
                        PathSegment::Index(index)
                    }
                    _ => PathSegment::Key(component.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path::new)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn segment_resolution() {
        assert_eq!(PathSegment::from(3).as_index(), Some(3));
        assert_eq!(PathSegment::from("7").as_index(), Some(7));
        assert_eq!(PathSegment::from("name").as_index(), None);
        assert_eq!(PathSegment::from(3).to_key(), "3");
        assert_eq!(PathSegment::from(-1), PathSegment::Key("-1".to_string()));
        assert!(PathSegment::from(0).is_index());
        assert!(!PathSegment::from("0").is_index());
    }

    #[test]
    fn macro_and_builder_agree() {
        let built = Path::default().push("a").push(0usize).push("b");
        assert_eq!(built, path!["a", 0, "b"]);
        assert_eq!(built.len(), 3);
        assert!(path![].is_empty());
    }

    #[test]
    fn parse_dotted() {
        let p: Path = "a.0.b".parse().unwrap();
        assert_eq!(p, path!["a", 0, "b"]);
        assert_eq!(p.to_string(), "a.0.b");

        let empty: Path = "".parse().unwrap();
        assert!(empty.is_empty());

        // Signs and spaces are not indices
        let p: Path = "+1. 2".parse().unwrap();
        assert!(p.iter().all(|s| !s.is_index()));
    }

    #[test]
    fn parse_rejects_empty_components() {
        let err = "a..b".parse::<Path>().unwrap_err();
        assert!(err.is_path_error());
        assert!(err.to_string().contains("a..b"));
    }

    #[test]
    fn serde_form_is_plain_array() {
        let p = path!["a", 1];
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"["a",1]"#);

        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
