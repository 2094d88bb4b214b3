use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_QUERY_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "token",
        "access_token",
        "refresh_token",
        "api_key",
        "apikey",
        "key",
        "secret",
        "password",
        "signature",
    ]
    .into_iter()
    .collect()
});

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(Token|Bearer)\s+([A-Za-z0-9._~+/=-]{6,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r#"("(?:password|token|access_token|refresh_token|secret|api_key)"\s*:\s*)"[^"]*""#)
                .expect("inline redaction regex"),
            "$1\"***REDACTED***\"",
        ),
        (
            Regex::new(r#"\b(password|passwd|token|api[_-]?key|secret|access[_-]?token|refresh[_-]?token)\b\s*=\s*([^\s&"'`]+)"#)
                .expect("inline redaction regex"),
            "$1=***REDACTED***",
        ),
    ]
});

/// Masks credentials that commonly leak into response bodies and headers.
pub fn redact_text(value: &str) -> String {
    INLINE_REDACTION_PATTERNS
        .iter()
        .fold(value.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

/// Masks sensitive query parameters and userinfo in a feed URL before it is
/// logged. Unparseable input falls back to inline text redaction.
pub fn redact_feed(feed: &str) -> String {
    let Ok(mut url) = Url::parse(feed) else {
        return redact_text(feed);
    };
    if url.password().is_some() {
        let _ = url.set_password(Some(INLINE_REDACTION));
    }
    if url.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let masked = if SENSITIVE_QUERY_KEYS.contains(key.to_lowercase().as_str()) {
                INLINE_REDACTION.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), masked)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::{redact_feed, redact_text};

    #[test]
    fn redact_text_masks_authorization_values() {
        assert_eq!(
            redact_text("Authorization: Token abcdef123456"),
            "Authorization: Token ***REDACTED***"
        );
        assert_eq!(
            redact_text(r#"{"token": "s3cr3t", "detail": "bad"}"#),
            r#"{"token": "***REDACTED***", "detail": "bad"}"#
        );
    }

    #[test]
    fn redact_feed_masks_sensitive_query_params() {
        let out = redact_feed("https://api.example.com/items?page=2&token=abc");
        assert!(out.contains("page=2"));
        assert!(!out.contains("abc"));
    }

    #[test]
    fn redact_feed_leaves_plain_urls_alone() {
        assert_eq!(
            redact_feed("https://api.example.com/items/"),
            "https://api.example.com/items/"
        );
    }
}
