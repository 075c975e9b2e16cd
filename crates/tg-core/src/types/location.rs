//! Source positions for declarations and members.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position within the source buffer.
///
/// - `line` is 1-indexed (first line is line 1)
/// - `column` is 0-indexed, counted in UTF-8 bytes
/// - `byte_offset` is the absolute byte position from the start of the buffer
///
/// # Examples
///
/// ```
/// use tg_core::SourceLocation;
///
/// let loc = SourceLocation::new(3, 4, 40);
/// assert_eq!(loc.to_string(), "3:4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (0-indexed).
    pub column: u32,

    /// Absolute byte offset.
    pub byte_offset: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, column: u32, byte_offset: u32) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range `[start, end)` in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    /// First position covered by the span.
    pub start: SourceLocation,

    /// Position just past the last covered byte.
    pub end: SourceLocation,
}

impl SourceSpan {
    /// Creates a span from two locations.
    #[inline]
    #[must_use]
    pub const fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.byte_offset.saturating_sub(self.start.byte_offset)
    }

    /// Returns `true` if the span covers no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `offset` falls inside the span.
    #[inline]
    #[must_use]
    pub const fn contains(&self, offset: u32) -> bool {
        offset >= self.start.byte_offset && offset < self.end.byte_offset
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        assert_eq!(SourceLocation::new(10, 5, 245).to_string(), "10:5");
    }

    #[test]
    fn test_location_ordering_follows_lines() {
        let a = SourceLocation::new(1, 9, 9);
        let b = SourceLocation::new(2, 0, 12);
        assert!(a < b);
    }

    #[test]
    fn test_span_contains() {
        let span = SourceSpan::new(SourceLocation::new(1, 0, 0), SourceLocation::new(1, 20, 20));
        assert_eq!(span.len(), 20);
        assert!(span.contains(0));
        assert!(span.contains(19));
        assert!(!span.contains(20));
        assert_eq!(span.to_string(), "1:0-1:20");
    }

    #[test]
    fn test_empty_span() {
        let loc = SourceLocation::new(4, 2, 30);
        assert!(SourceSpan::new(loc, loc).is_empty());
    }
}
