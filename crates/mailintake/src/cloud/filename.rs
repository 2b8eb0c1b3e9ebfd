//! Naming downloaded payloads.

use reqwest::Url;

use crate::sanitize::sanitize_filename;

/// Used when neither the headers nor the URL yield a usable name.
pub const FALLBACK_FILENAME: &str = "downloaded_file.bin";

/// Picks a safe filename for a payload served from `url`.
///
/// Tries the `Content-Disposition` header first, then the last path segment
/// of the URL, then [`FALLBACK_FILENAME`]. The result is percent-decoded and
/// sanitized.
pub fn derive_filename(content_disposition: Option<&str>, url: &Url) -> String {
    content_disposition
        .and_then(from_content_disposition)
        .and_then(|name| sanitize_filename(&name))
        .or_else(|| from_url(url).and_then(|name| sanitize_filename(&name)))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Extracts the filename parameter of a `Content-Disposition` value.
///
/// `filename*` (RFC 5987, `charset'lang'value`) wins over `filename`.
pub fn from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(value) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(unquote(raw.trim()).as_str()),
            "filename" => plain = Some(percent_decode(&unquote(raw.trim()))),
            _ => {}
        }
    }

    let usable = |name: &String| !name.is_empty();
    extended.filter(usable).or_else(|| plain.filter(usable))
}

/// Last non-empty path segment of `url`, percent-decoded.
pub fn from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(percent_decode)
}

/// Splits on `;` outside double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else {
                    out.push(c);
                }
            }
            out
        }
        None => value.to_string(),
    }
}

fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let _charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn percent_decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
