//! Line/column positions for diagnostics.

use std::fmt;

/// A 1-based line and column in an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number in characters, starting at 1.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of a byte offset within `input`.
    ///
    /// Newlines are located with `memchr`; the column counts UTF-8 characters, not
    /// bytes. Offsets past the end clamp to the end of the input.
    pub fn from_offset(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let prefix = &input[..offset];

        let line = memchr::memchr_iter(b'\n', prefix).count() + 1;
        let line_start = memchr::memrchr(b'\n', prefix).map_or(0, |i| i + 1);
        let column = String::from_utf8_lossy(&prefix[line_start..]).chars().count() + 1;

        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_character() {
        assert_eq!(Position::from_offset(b"<a/>", 0), Position::new(1, 1));
    }

    #[test]
    fn test_after_newlines() {
        let input = b"<a>\n  <b/>\n</a>";
        // Offset of "<b/>"
        assert_eq!(Position::from_offset(input, 6), Position::new(2, 3));
        assert_eq!(Position::from_offset(input, input.len()), Position::new(3, 5));
    }

    #[test]
    fn test_columns_count_characters() {
        let input = "<a é='x'/>".as_bytes();
        // 'é' is two bytes; the quote after '=' is the 7th character.
        let offset = input.iter().position(|&b| b == b'\'').unwrap();
        assert_eq!(Position::from_offset(input, offset), Position::new(1, 7));
    }
}
