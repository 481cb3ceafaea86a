//! Text canonicalization for comparing free-text names coming out of the directory.
//!
//! Two flavours:
//! - [`normalize`]: lowercase, NFD-decomposed with combining marks removed, trimmed.
//!   Punctuation survives, so group identifiers like `"G-1 (Norte)"` stay distinct.
//! - [`normalize_strict`]: [`normalize`] plus removal of anything outside `[a-z0-9\s]`.
//!   Used for person names on the login and roster-filter paths.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_ALNUM_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());

/// Lowercase, strip diacritics and trim. Total and idempotent.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    // Lowercasing can reintroduce decomposable forms for a handful of code points; fold again.
    let folded: String = folded.nfd().filter(|c| !is_combining_mark(*c)).collect();
    folded.trim().to_string()
}

/// [`normalize`], then drop every character outside `[a-z0-9\s]`.
pub fn normalize_strict(input: &str) -> String {
    let base = normalize(input);
    NON_ALNUM_SPACE.replace_all(&base, "").trim().to_string()
}
