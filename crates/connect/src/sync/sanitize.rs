//! Redaction of failure details before they are recorded.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Longest detail kept in a platform result, in characters.
pub const MAX_DETAIL_CHARS: usize = 500;

const REDACTED: &str = "[REDACTED]";

lazy_static! {
    /// `Authorization: Bearer abc`, `Basic abc`
    static ref AUTH_SCHEME_REGEX: Regex =
        Regex::new(r"(?i)\b(bearer|basic)\s+[A-Za-z0-9._~+/=-]+")
            .expect("Invalid regex pattern");

    /// `api_key=...`, `"password": "..."`, `access-token: ...`
    static ref SECRET_PAIR_REGEX: Regex = Regex::new(
        r#"(?i)\b((?:api[_-]?key|access[_-]?token|refresh[_-]?token|token|secret|client[_-]?secret|password|credentials?[_-]?ref)"?\s*[:=]\s*"?)[^\s",&}]+"#
    )
    .expect("Invalid regex pattern");
}

/// Strips the connection's credential reference and anything shaped like a
/// secret from `detail`, then truncates it.
pub fn sanitize_detail(detail: &str, credentials_ref: &str) -> String {
    let mut cleaned = detail.trim().to_string();

    let credentials_ref = credentials_ref.trim();
    if !credentials_ref.is_empty() {
        cleaned = cleaned.replace(credentials_ref, REDACTED);
    }

    let cleaned = AUTH_SCHEME_REGEX.replace_all(&cleaned, |caps: &Captures| {
        format!("{} {}", &caps[1], REDACTED)
    });
    let cleaned = SECRET_PAIR_REGEX.replace_all(&cleaned, |caps: &Captures| {
        format!("{}{}", &caps[1], REDACTED)
    });

    truncate_chars(&cleaned, MAX_DETAIL_CHARS)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_ref_is_removed() {
        let out = sanitize_detail("vault lookup failed for vault://t1/shopify", "vault://t1/shopify");
        assert_eq!(out, "vault lookup failed for [REDACTED]");
    }

    #[test]
    fn test_bearer_tokens_are_removed() {
        let out = sanitize_detail("401 with header Authorization: Bearer eyJhbGci.abc-123", "");
        assert!(!out.contains("eyJhbGci"));
        assert!(out.contains("Bearer [REDACTED]"));
    }

    #[test]
    fn test_secret_pairs_are_removed() {
        let out = sanitize_detail(
            r#"GET /orders?api_key=sk_live_42&page=2 failed; body {"password": "hunter2"}"#,
            "",
        );
        assert!(!out.contains("sk_live_42"));
        assert!(!out.contains("hunter2"));
        assert!(out.contains("api_key=[REDACTED]"));
        assert!(out.contains("page=2"));
    }

    #[test]
    fn test_plain_messages_pass_through() {
        assert_eq!(
            sanitize_detail("  upstream returned 500  ", "ref-1"),
            "upstream returned 500"
        );
    }

    #[test]
    fn test_long_details_are_truncated() {
        let out = sanitize_detail(&"é".repeat(MAX_DETAIL_CHARS + 50), "");
        assert_eq!(out.chars().count(), MAX_DETAIL_CHARS + 3);
        assert!(out.ends_with("..."));
    }
}
