// src/insight/suggestions.rs — Pull actionable bullet points out of model output

use crate::infra::config::SuggestionsConfig;

/// At most this many suggestions are returned.
pub const MAX_SUGGESTIONS: usize = 4;
/// A stripped bullet must be strictly longer than this (in characters).
pub const MIN_SUGGESTION_LEN: usize = 10;
/// Length cap applied by the server-side extractor.
pub const SERVER_MAX_SUGGESTION_LEN: Option<usize> = Some(100);
/// The browser-side extractor applies no cap.
pub const CLIENT_MAX_SUGGESTION_LEN: Option<usize> = None;

/// Returned when the text has no usable bullets.
pub const FALLBACK_SUGGESTIONS: [&str; 4] = [
    "Add a clear, benefit-driven headline above the fold",
    "Place a single primary call-to-action near the top of the page",
    "Show social proof such as testimonials or customer logos",
    "Reduce page load time by compressing images and deferring scripts",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionLimits {
    pub max_count: usize,
    pub min_len: usize,
    pub max_len: Option<usize>,
}

impl SuggestionLimits {
    pub const SERVER: Self = Self {
        max_count: MAX_SUGGESTIONS,
        min_len: MIN_SUGGESTION_LEN,
        max_len: SERVER_MAX_SUGGESTION_LEN,
    };

    pub const CLIENT: Self = Self {
        max_count: MAX_SUGGESTIONS,
        min_len: MIN_SUGGESTION_LEN,
        max_len: CLIENT_MAX_SUGGESTION_LEN,
    };

    fn accepts(&self, candidate: &str) -> bool {
        let len = candidate.chars().count();
        len > self.min_len && self.max_len.map_or(true, |max| len <= max)
    }
}

impl Default for SuggestionLimits {
    fn default() -> Self {
        Self::SERVER
    }
}

impl From<&SuggestionsConfig> for SuggestionLimits {
    fn from(c: &SuggestionsConfig) -> Self {
        Self {
            max_count: c.max_count,
            min_len: c.min_len,
            max_len: c.max_len.filter(|&n| n > 0),
        }
    }
}

/// Extract up to `limits.max_count` bullet or numbered lines, in order.
///
/// Falls back to [`FALLBACK_SUGGESTIONS`] when nothing qualifies.
pub fn extract_suggestions(text: &str, limits: &SuggestionLimits) -> Vec<String> {
    let found: Vec<String> = text
        .lines()
        .filter_map(|line| strip_marker(line.trim()))
        .map(str::trim)
        .filter(|rest| limits.accepts(rest))
        .take(limits.max_count)
        .map(str::to_string)
        .collect();

    if found.is_empty() {
        fallback_suggestions(limits.max_count)
    } else {
        found
    }
}

pub fn fallback_suggestions(max_count: usize) -> Vec<String> {
    FALLBACK_SUGGESTIONS
        .iter()
        .take(max_count)
        .map(|s| s.to_string())
        .collect()
}

/// Strip a leading `- `, `• `, `* ` or `12. ` marker. `None` if the line has none.
fn strip_marker(line: &str) -> Option<&str> {
    for bullet in ['-', '•', '*'] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.starts_with(char::is_whitespace).then_some(rest);
        }
    }

    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}
