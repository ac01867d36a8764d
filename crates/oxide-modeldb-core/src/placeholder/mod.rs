//! Placeholder translation.
//!
//! Statements are written with the driver-neutral `?` marker. Before they
//! reach the backend every marker outside a string literal is rewritten to
//! the positional `$1`, `$2`, ... form:
//!
//! ```rust
//! use oxide_modeldb_core::placeholder::translate;
//!
//! let sql = translate(r"SELECT * FROM t WHERE a=? AND b='esc\'aped?' AND c=?").unwrap();
//! assert_eq!(sql, r"SELECT * FROM t WHERE a=$1 AND b='esc\'aped?' AND c=$2");
//! ```
//!
//! String literals are single quoted and may contain backslash escapes,
//! including an escaped quote. A marker inside a literal is data, not a
//! placeholder, and is copied through untouched.

mod cache;
mod error;
mod span;
mod splitter;

pub use cache::translate_cached;
pub use error::ParseError;
pub use span::Span;
pub use splitter::{Segment, SegmentKind, Splitter, ESCAPE, MARKER, QUOTE};

/// Splits a statement into its segments.
///
/// # Errors
///
/// Returns a [`ParseError`] if a string literal is not terminated.
pub fn split(statement: &str) -> Result<Vec<Segment>, ParseError> {
    Splitter::new(statement).collect()
}

/// Rewrites every placeholder marker into its `$n` positional form.
///
/// # Errors
///
/// Returns a [`ParseError`] if a string literal is not terminated.
pub fn translate(statement: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(statement.len() + 8);
    let mut index = 1_usize;

    for segment in Splitter::new(statement) {
        let segment = segment?;
        match segment.kind {
            SegmentKind::Placeholder => {
                out.push('$');
                out.push_str(&index.to_string());
                index += 1;
            }
            SegmentKind::Other | SegmentKind::Literal => {
                out.push_str(segment.span.slice(statement));
            }
        }
    }

    Ok(out)
}

/// Counts the placeholder markers outside string literals.
///
/// # Errors
///
/// Returns a [`ParseError`] if a string literal is not terminated.
pub fn count_placeholders(statement: &str) -> Result<usize, ParseError> {
    Splitter::new(statement).try_fold(0, |count, segment| {
        Ok(count + usize::from(segment?.kind == SegmentKind::Placeholder))
    })
}
