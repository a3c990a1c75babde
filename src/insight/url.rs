// src/insight/url.rs — Website URL normalization and validation
//
// Purely syntactic: no DNS lookup, no reachability check.

use serde::{Deserialize, Serialize};
use url::Url;

pub const URL_REQUIRED: &str = "URL is required";
pub const URL_FORMAT_HINT: &str = "Please enter a valid URL (e.g., https://example.com)";

/// Characters removed before parsing so the value can be echoed into HTML,
/// prompts and JSON without breaking out of its context.
const STRIPPED_CHARS: &[char] = &['<', '>', '"', '\''];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlValidation {
    pub is_valid: bool,
    pub sanitized_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UrlValidation {
    fn valid(sanitized_url: String) -> Self {
        Self {
            is_valid: true,
            sanitized_url,
            error: None,
        }
    }

    fn invalid(sanitized_url: String, error: &str) -> Self {
        Self {
            is_valid: false,
            sanitized_url,
            error: Some(error.to_string()),
        }
    }
}

/// Normalize a user-supplied website URL and decide whether it is usable.
pub fn validate_and_sanitize_url(raw: &str) -> UrlValidation {
    if raw.trim().is_empty() {
        return UrlValidation::invalid(String::new(), URL_REQUIRED);
    }

    let stripped: String = raw.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return UrlValidation::invalid(String::new(), URL_REQUIRED);
    }

    let sanitized = if has_http_prefix(stripped) || has_explicit_scheme(stripped) {
        stripped.to_string()
    } else {
        format!("https://{stripped}")
    };

    match Url::parse(&sanitized) {
        Ok(parsed)
            if matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty()) =>
        {
            UrlValidation::valid(sanitized)
        }
        _ => UrlValidation::invalid(sanitized, URL_FORMAT_HINT),
    }
}

fn has_http_prefix(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// `ftp://x.com`, `javascript://...` and friends carry their own scheme;
/// prefixing them would smuggle the scheme into the host part.
fn has_explicit_scheme(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
