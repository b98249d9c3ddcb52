//! Text span types for source location tracking.
//!
//! Expression positions are measured in characters, not bytes, so that an
//! error offset points at the same place a caller sees in the source string.

use std::fmt;
use std::ops::Range;

/// A position in expression text, measured as a character offset from the start.
pub type TextPos = u32;

/// A span in expression text, defined by a start position and a length.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextSpan {
    /// The character offset where this span starts.
    pub start: TextPos,
    /// The length of this span in characters.
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// Create an empty span at a position.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self {
            start: pos,
            length: 0,
        }
    }

    /// The end position of this span (exclusive).
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Convert this character span to a byte range within `text`.
    ///
    /// Positions past the end of the text clamp to `text.len()`.
    pub fn to_byte_range(&self, text: &str) -> Range<usize> {
        let byte_at = |pos: TextPos| {
            text.char_indices()
                .nth(pos as usize)
                .map(|(i, _)| i)
                .unwrap_or(text.len())
        };
        byte_at(self.start)..byte_at(self.end())
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end())
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_end() {
        let span = TextSpan::new(2, 3);
        assert_eq!(span.end(), 5);
        assert!(!span.is_empty());
        assert!(TextSpan::empty(4).is_empty());
    }

    #[test]
    fn test_byte_range_counts_characters() {
        let text = "é + x";
        let span = TextSpan::new(4, 1);
        assert_eq!(&text[span.to_byte_range(text)], "x");
        assert_eq!(TextSpan::empty(99).to_byte_range(text), text.len()..text.len());
    }
}
