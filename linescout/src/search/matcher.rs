//! The pattern-matching capability and its two interchangeable backends.
//!
//! The pipeline never names a concrete engine: it holds an
//! `Arc<dyn Matcher>` built by [`build_matcher`] from the configured
//! [`MatcherEngine`]. Both backends are byte-offset-exact, return ordered
//! non-overlapping matches, and are safe to share read-only across worker
//! threads. Literal-mode helpers and the word-boundary test live here too.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

use crate::config::MatcherEngine;
use crate::errors::{Result, SearchError};
use crate::results::Match;

type CacheKey = (MatcherEngine, String, bool);

// Compiled backends are cached per (engine, pattern, caseless) so repeated
// runs inside one process reuse the compilation.
static MATCHER_CACHE: Lazy<DashMap<CacheKey, Arc<dyn Matcher>>> = Lazy::new(DashMap::new);

/// The capability contract both backend engines satisfy.
pub trait Matcher: Send + Sync {
    /// All matches in `text`, offsets ascending, non-overlapping.
    fn find_all(&self, text: &str) -> Vec<Match>;

    /// Whether the pattern matches the entire text.
    fn matches(&self, text: &str) -> bool;

    /// The first match, if any.
    fn find_first(&self, text: &str) -> Option<Match>;
}

/// Builds (or fetches from the cache) the configured backend.
///
/// An invalid pattern is a fatal error carrying the backend's own
/// human-readable message; failures are never cached.
pub fn build_matcher(
    engine: MatcherEngine,
    pattern: &str,
    case_insensitive: bool,
) -> Result<Arc<dyn Matcher>> {
    let key = (engine, pattern.to_string(), case_insensitive);
    if let Some(entry) = MATCHER_CACHE.get(&key) {
        return Ok(entry.clone());
    }

    let matcher: Arc<dyn Matcher> = match engine {
        MatcherEngine::Regex => Arc::new(RegexMatcher::new(pattern, case_insensitive)?),
        MatcherEngine::Pcre2 => Arc::new(Pcre2Matcher::new(pattern, case_insensitive)?),
    };
    MATCHER_CACHE.insert(key, matcher.clone());
    Ok(matcher)
}

/// Backend over the `regex` crate.
#[derive(Debug)]
pub struct RegexMatcher {
    regex: regex::Regex,
    // Anchored sibling compiled once for whole-line tests
    anchored: regex::Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let build = |p: &str| {
            regex::RegexBuilder::new(p)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| SearchError::invalid_pattern(e.to_string()))
        };
        Ok(Self {
            regex: build(pattern)?,
            anchored: build(&format!("^(?:{pattern})$"))?,
        })
    }
}

impl Matcher for RegexMatcher {
    fn find_all(&self, text: &str) -> Vec<Match> {
        self.regex
            .find_iter(text)
            .map(|m| Match {
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
            })
            .collect()
    }

    fn matches(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }

    fn find_first(&self, text: &str) -> Option<Match> {
        self.regex.find(text).map(|m| Match {
            start: m.start(),
            end: m.end(),
            text: m.as_str().to_string(),
        })
    }
}

/// Backend over the `pcre2` crate.
#[derive(Debug)]
pub struct Pcre2Matcher {
    regex: pcre2::bytes::Regex,
    anchored: pcre2::bytes::Regex,
}

impl Pcre2Matcher {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let build = |p: &str| {
            pcre2::bytes::RegexBuilder::new()
                .caseless(case_insensitive)
                .utf(true)
                .build(p)
                .map_err(|e| SearchError::invalid_pattern(e.to_string()))
        };
        Ok(Self {
            regex: build(pattern)?,
            anchored: build(&format!("^(?:{pattern})$"))?,
        })
    }
}

impl Matcher for Pcre2Matcher {
    fn find_all(&self, text: &str) -> Vec<Match> {
        let mut matches = Vec::new();
        for found in self.regex.find_iter(text.as_bytes()) {
            match found {
                Ok(m) => {
                    if let Some(slice) = text.get(m.start()..m.end()) {
                        matches.push(Match {
                            start: m.start(),
                            end: m.end(),
                            text: slice.to_string(),
                        });
                    }
                }
                Err(e) => {
                    debug!("PCRE2 match error: {}", e);
                    break;
                }
            }
        }
        matches
    }

    fn matches(&self, text: &str) -> bool {
        self.anchored.is_match(text.as_bytes()).unwrap_or(false)
    }

    fn find_first(&self, text: &str) -> Option<Match> {
        let m = self.regex.find(text.as_bytes()).ok().flatten()?;
        let slice = text.get(m.start()..m.end())?;
        Some(Match {
            start: m.start(),
            end: m.end(),
            text: slice.to_string(),
        })
    }
}

/// All occurrences of `pattern` in `text` as a literal substring.
///
/// Case folding is ASCII lowercasing applied to both sides; it preserves
/// byte lengths, so offsets computed on the folded text index the original.
pub fn literal_find_all(text: &str, pattern: &str, fold_case: bool) -> Vec<Match> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let collect = |haystack: &str, needle: &str| {
        haystack
            .match_indices(needle)
            .map(|(start, found)| Match {
                start,
                end: start + found.len(),
                text: text[start..start + found.len()].to_string(),
            })
            .collect()
    };

    if fold_case {
        collect(&text.to_ascii_lowercase(), &pattern.to_ascii_lowercase())
    } else {
        collect(text, pattern)
    }
}

/// Whole-line equality for literal mode.
pub fn literal_line_match(text: &str, pattern: &str, fold_case: bool) -> bool {
    if fold_case {
        text.eq_ignore_ascii_case(pattern)
    } else {
        text == pattern
    }
}

fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Whether the match at `start..end` in `text` sits on word boundaries.
///
/// A word character is `_` or any alphanumeric code point. Both ends are
/// tested independently: the character before `start` and the character at
/// `end` must each be absent or non-word.
pub fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !is_word_char(c));
    let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
    before_ok && after_ok
}
