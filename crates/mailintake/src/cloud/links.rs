//! Heuristics for spotting cloud download links in HTML.

use std::collections::HashSet;

use regex::Regex;

/// Extracts download URLs from HTML. Implementations decide what counts as
/// a candidate; the resolver only follows what they return, in order.
pub trait LinkStrategy: Send + Sync {
    /// Links in a message's HTML body worth requesting.
    fn candidate_links(&self, html: &str) -> Vec<String>;

    /// Direct-download links found on a landing page.
    fn direct_links(&self, page: &str) -> Vec<String>;
}

/// Matches URLs containing any of a list of tokens, case-insensitively.
///
/// In message bodies only `href` targets are considered. On landing pages
/// any bare URL containing a token counts, plus `downUrl = "..."`
/// assignments in inline scripts.
#[derive(Debug, Clone)]
pub struct TokenLinkStrategy {
    href: Regex,
    bare_url: Regex,
    down_url: Regex,
}

impl TokenLinkStrategy {
    /// Builds the patterns for `tokens`. Tokens are literals, not regexes.
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Result<Self, regex::Error> {
        let alternation = tokens
            .iter()
            .map(|t| regex::escape(t.as_ref().trim()))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            href: Regex::new(&format!(
                r#"(?i)href\s*=\s*["'](http[^"']*(?:{})[^"']*)["']"#,
                alternation
            ))?,
            bare_url: Regex::new(&format!(
                r#"(?i)https?://[^"'\s<>]*(?:{})[^"'\s<>]*"#,
                alternation
            ))?,
            down_url: Regex::new(r#"(?i)downUrl\s*[:=]\s*["']([^"']+)["']"#)?,
        })
    }
}

impl LinkStrategy for TokenLinkStrategy {
    fn candidate_links(&self, html: &str) -> Vec<String> {
        dedup(
            self.href
                .captures_iter(html)
                .filter_map(|c| c.get(1))
                .map(|m| normalize_link(m.as_str())),
        )
    }

    fn direct_links(&self, page: &str) -> Vec<String> {
        let bare = self.bare_url.find_iter(page).map(|m| m.as_str());
        let assigned = self
            .down_url
            .captures_iter(page)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str());
        dedup(bare.chain(assigned).map(normalize_link))
    }
}

/// Undoes HTML entity escaping of `&` in a URL taken from markup.
pub fn normalize_link(raw: &str) -> String {
    raw.trim().replace("&amp;", "&")
}

fn dedup(links: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links.filter(|link| seen.insert(link.clone())).collect()
}
