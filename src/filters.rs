//! Category whitelist and title stop-word predicates.
//!
//! Both are pure functions over a store's configured lists. Category
//! patterns are inclusion rules: a category is out unless some pattern
//! matches it.

/// A parsed whitelist pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryPattern<'a> {
    /// `*substr*`
    Contains(&'a str),
    /// `*suffix`
    EndsWith(&'a str),
    /// `prefix*`
    StartsWith(&'a str),
    /// No wildcard.
    Exact(&'a str),
}

impl<'a> CategoryPattern<'a> {
    pub fn parse(pattern: &'a str) -> Self {
        match (pattern.starts_with('*'), pattern.ends_with('*')) {
            (true, true) => CategoryPattern::Contains(pattern.trim_matches('*')),
            (true, false) => CategoryPattern::EndsWith(pattern.trim_start_matches('*')),
            (false, true) => CategoryPattern::StartsWith(pattern.trim_end_matches('*')),
            (false, false) => CategoryPattern::Exact(pattern),
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match *self {
            CategoryPattern::Contains(needle) => category.contains(needle),
            CategoryPattern::EndsWith(suffix) => category.ends_with(suffix),
            CategoryPattern::StartsWith(prefix) => category.starts_with(prefix),
            CategoryPattern::Exact(exact) => category == exact,
        }
    }
}

/// Returns `true` when `category` matches none of `patterns`.
///
/// An empty or absent category is never matched against the patterns; the
/// result is `skip_empty` instead, so by default such records pass.
pub fn is_out_of_category<S: AsRef<str>>(
    category: Option<&str>,
    patterns: &[S],
    skip_empty: bool,
) -> bool {
    let category = match category {
        Some(category) if !category.is_empty() => category,
        _ => return skip_empty,
    };
    !patterns
        .iter()
        .any(|pattern| CategoryPattern::parse(pattern.as_ref()).matches(category))
}

/// Returns `true` when any stop word occurs verbatim in `title`.
/// Matching is case-sensitive.
pub fn has_stop_words<S: AsRef<str>>(title: &str, stop_words: &[S]) -> bool {
    stop_words
        .iter()
        .any(|stop_word| title.contains(stop_word.as_ref()))
}
