//! Splits a statement into placeholder, string literal and other segments.

use super::{ParseError, Span};

/// The driver-neutral placeholder marker.
pub const MARKER: char = '?';

/// The string literal delimiter.
pub const QUOTE: char = '\'';

/// The escape character inside string literals.
pub const ESCAPE: char = '\\';

/// The kind of a statement segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// A maximal run containing neither a marker nor a quote.
    Other,
    /// A single placeholder marker.
    Placeholder,
    /// A quoted string literal, delimiters included.
    Literal,
}

/// A classified span of the input statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// What the span holds.
    pub kind: SegmentKind,
    /// Where it is in the input.
    pub span: Span,
}

/// Splits a statement into segments, left to right.
///
/// Yields `Err` once for an unterminated literal, then stops.
pub struct Splitter<'a> {
    /// The input statement.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current segment.
    start: usize,
}

impl<'a> Splitter<'a> {
    /// Creates a new splitter for the given statement.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn make_segment(&self, kind: SegmentKind) -> Segment {
        Segment {
            kind,
            span: Span::new(self.start, self.pos),
        }
    }

    fn scan_other(&mut self) -> Segment {
        while self.peek().is_some_and(|c| c != MARKER && c != QUOTE) {
            self.advance();
        }
        self.make_segment(SegmentKind::Other)
    }

    fn scan_literal(&mut self) -> Result<Segment, ParseError> {
        self.advance(); // consume opening quote

        loop {
            match self.advance() {
                Some(ESCAPE) => {
                    // The escaped character is taken verbatim, even a quote
                    if self.advance().is_none() {
                        return Err(self.unterminated());
                    }
                }
                Some(QUOTE) => break,
                Some(_) => {}
                None => return Err(self.unterminated()),
            }
        }

        Ok(self.make_segment(SegmentKind::Literal))
    }

    fn unterminated(&mut self) -> ParseError {
        let position = self.start;
        self.pos = self.input.len();
        ParseError::unterminated_literal(position)
    }

    /// Scans the next segment, or `None` at end of input.
    pub fn next_segment(&mut self) -> Option<Result<Segment, ParseError>> {
        self.start = self.pos;

        match self.peek()? {
            MARKER => {
                self.advance();
                Some(Ok(self.make_segment(SegmentKind::Placeholder)))
            }
            QUOTE => Some(self.scan_literal()),
            _ => Some(Ok(self.scan_other())),
        }
    }
}

impl Iterator for Splitter<'_> {
    type Item = Result<Segment, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_segment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(SegmentKind, &str)> {
        Splitter::new(input)
            .map(|s| {
                let s = s.expect("split failed");
                (s.kind, s.span.slice(input))
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(kinds("").is_empty());
    }

    #[test]
    fn test_other_only() {
        assert_eq!(kinds("SELECT 1"), vec![(SegmentKind::Other, "SELECT 1")]);
    }

    #[test]
    fn test_adjacent_markers() {
        assert_eq!(
            kinds("??"),
            vec![
                (SegmentKind::Placeholder, "?"),
                (SegmentKind::Placeholder, "?"),
            ]
        );
    }

    #[test]
    fn test_literal_with_escaped_quote() {
        assert_eq!(
            kinds(r"a='x\'?'"),
            vec![
                (SegmentKind::Other, "a="),
                (SegmentKind::Literal, r"'x\'?'"),
            ]
        );
    }

    #[test]
    fn test_doubled_quotes_are_two_literals() {
        assert_eq!(
            kinds("'it''s'"),
            vec![
                (SegmentKind::Literal, "'it'"),
                (SegmentKind::Literal, "'s'"),
            ]
        );
    }

    #[test]
    fn test_unterminated_literal() {
        let mut splitter = Splitter::new("a = 'abc");
        assert!(splitter.next().unwrap().is_ok());
        let err = splitter.next().unwrap().unwrap_err();
        assert_eq!(err.position, 4);
        assert!(splitter.next().is_none());
    }

    #[test]
    fn test_trailing_escape_is_unterminated() {
        let err = Splitter::new(r"'abc\").find_map(Result::err).unwrap();
        assert_eq!(err.position, 0);
    }

    #[test]
    fn test_multibyte_characters() {
        assert_eq!(
            kinds("é=?'ü?'"),
            vec![
                (SegmentKind::Other, "é="),
                (SegmentKind::Placeholder, "?"),
                (SegmentKind::Literal, "'ü?'"),
            ]
        );
    }
}
