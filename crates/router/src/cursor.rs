//! Character cursor used by the pattern compiler.

/// A cursor over the characters of a route pattern.
///
/// The cursor tracks the byte index of the next unread character so that
/// compile errors can point at the exact spot in the pattern text. Iteration
/// is forward-only; [`CharCursor::peek`] looks ahead without consuming.
#[derive(Debug, Clone)]
pub(crate) struct CharCursor<'a> {
    pattern: &'a str,
    index: usize,
}

impl<'a> CharCursor<'a> {
    pub(crate) fn new(pattern: &'a str) -> Self {
        Self { pattern, index: 0 }
    }

    /// Byte index of the next unread character.
    ///
    /// Equals the pattern length once the cursor is exhausted.
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Returns the next character without consuming it.
    pub(crate) fn peek(&self) -> Option<char> {
        self.pattern[self.index..].chars().next()
    }
}

impl Iterator for CharCursor<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        Some(c)
    }
}
