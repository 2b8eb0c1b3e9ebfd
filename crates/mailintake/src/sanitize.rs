//! Helpers for sanitizing attacker-influenced names and for keeping
//! secrets out of log output.
//!
//! Attachment filenames come straight from email headers or HTTP responses,
//! so they are cleaned here before any filesystem use. Cloud download URLs
//! usually carry access tokens in their query string, so they are redacted
//! before being logged.

use std::path::Path;

use reqwest::Url;

/// Maximum number of characters of a URL written to the log.
const MAX_LOGGED_URL_CHARS: usize = 80;

/// Cleans a raw filename so it can be joined onto a storage directory.
///
/// Path separators (`/` and `\`) and control characters become `_`, and
/// surrounding whitespace is trimmed. Returns `None` when nothing usable is
/// left (empty, `.` or `..`), in which case the caller picks a fallback name.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let cleaned = cleaned.trim();
    match cleaned {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Returns the lower-cased extension of `filename` including the leading dot
/// (`"CV.PDF"` → `".pdf"`), or `None` if it has none.
///
/// Dotfiles such as `.profile` have no extension.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

/// Strips credentials, query string and fragment from a URL and truncates
/// the result for logging.
///
/// - `https://mail.qq.com/ftn/download?k=secret` → `https://mail.qq.com/ftn/download`
/// - `not a url?token=1` → `not a url`
pub fn redact_url(url: &str) -> String {
    let redacted = match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    truncate_chars(&redacted, MAX_LOGGED_URL_CHARS)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}
