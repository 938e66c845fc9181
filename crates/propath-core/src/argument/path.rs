//! Dotted path expressions
//!
//! `addr.city` walks two properties; `addr?.city` marks `addr` null-safe,
//! so a null `addr` resolves the whole path to a typed null instead of
//! failing. `?` may only end a segment.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Syntax error in a path expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Nothing to resolve
    #[error("Empty path expression")]
    Empty,

    /// Two separators in a row, or a separator at either end
    #[error("Empty segment {position} in path {path}")]
    EmptySegment {
        /// Full path
        path: String,
        /// 0-based segment index
        position: usize,
    },

    /// `?` anywhere but the end of a segment
    #[error("Misplaced '?' at offset {offset} in path {path}: only allowed before '.' or at the end")]
    MisplacedNullSafe {
        /// Full path
        path: String,
        /// Byte offset of the offending `?`
        offset: usize,
    },
}

/// One path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Property name
    pub name: String,
    /// A null here ends resolution with a typed null
    pub null_safe: bool,
}

/// Parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    raw: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parse a path expression
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        let mut offset = 0;
        for (position, part) in path.split('.').enumerate() {
            let (name, null_safe) = match part.strip_suffix('?') {
                Some(name) => (name, true),
                None => (part, false),
            };
            if let Some(i) = name.find('?') {
                return Err(PathError::MisplacedNullSafe {
                    path: path.to_string(),
                    offset: offset + i,
                });
            }
            if name.is_empty() {
                return Err(PathError::EmptySegment {
                    path: path.to_string(),
                    position,
                });
            }
            segments.push(Segment {
                name: name.to_string(),
                null_safe,
            });
            offset += part.len() + 1;
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// Source text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; a parsed path has at least one segment
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether any segment is null-safe
    pub fn has_null_safe(&self) -> bool {
        self.segments.iter().any(|s| s.null_safe)
    }
}

impl FromStr for PathExpr {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
