//! Process-wide memoization of translated statements.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use super::{translate, ParseError};

static TRANSLATIONS: OnceLock<RwLock<HashMap<Box<str>, &'static str>>> = OnceLock::new();

/// Translates a statement, memoizing the result for the process lifetime.
///
/// Entries are never evicted, so translated statements are leaked once per
/// distinct input and handed out as `&'static str`. Two threads translating
/// the same new statement may both do the work; only the first result is
/// published.
///
/// # Errors
///
/// Returns a [`ParseError`] if the statement has an unterminated string
/// literal. Failures are not cached.
pub fn translate_cached(statement: &str) -> Result<&'static str, ParseError> {
    let cache = TRANSLATIONS.get_or_init(RwLock::default);

    let hit = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(statement)
        .copied();
    if let Some(sql) = hit {
        return Ok(sql);
    }

    let translated = translate(statement)?;
    let mut entries = cache.write().unwrap_or_else(PoisonError::into_inner);
    Ok(*entries
        .entry(Box::from(statement))
        .or_insert_with(|| Box::leak(translated.into_boxed_str())))
}
