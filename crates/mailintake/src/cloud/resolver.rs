//! Follows cloud download links to the file they eventually serve.
//!
//! A candidate link from the message body either serves the file directly
//! or returns an HTML landing page that carries the real download URL. Both
//! shapes are handled; deeper chains are not. Links are tried in order and
//! the first one that yields an accepted file wins.

use std::collections::HashSet;
use std::path::PathBuf;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, Url};
use tracing::{debug, info, warn};

use crate::config::CloudConfig;
use crate::sanitize::{file_extension, redact_url};
use crate::storage::FileStore;

use super::error::{CloudError, LinkFailure};
use super::filename::derive_filename;
use super::links::{normalize_link, LinkStrategy, TokenLinkStrategy};

const MAX_REDIRECTS: usize = 10;

/// Outcome of resolving one message's cloud links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Saved(PathBuf),
    Miss(CloudMiss),
}

/// Why no file was resolved. Informational, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudMiss {
    /// The message had no HTML body or no candidate links in it.
    NoLinks,
    /// Every candidate link was tried and abandoned.
    Exhausted { attempted: usize },
}

impl std::fmt::Display for CloudMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudMiss::NoLinks => write!(f, "no cloud links found"),
            CloudMiss::Exhausted { attempted } => {
                write!(f, "all {} cloud links exhausted", attempted)
            }
        }
    }
}

pub struct CloudLinkResolver {
    client: Client,
    strategy: Box<dyn LinkStrategy>,
    allowed_extensions: HashSet<String>,
    allowed_content_types: Vec<String>,
    store: FileStore,
}

impl CloudLinkResolver {
    /// Builds a resolver writing accepted files to `store`.
    pub fn new(config: &CloudConfig, store: FileStore) -> Result<Self, CloudError> {
        Ok(Self {
            client: build_client(config)?,
            strategy: Box::new(TokenLinkStrategy::new(config.tokens.as_slice())?),
            allowed_extensions: config.allowed_extensions.iter().cloned().collect(),
            allowed_content_types: config.allowed_content_types.clone(),
            store,
        })
    }

    /// Replaces the link heuristic.
    pub fn with_strategy(mut self, strategy: impl LinkStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Whether a payload may be stored: the extension is whitelisted or the
    /// content type starts with an allowed prefix.
    pub fn accepts(&self, filename: &str, content_type: &str) -> bool {
        let by_extension =
            file_extension(filename).is_some_and(|ext| self.allowed_extensions.contains(&ext));
        let by_type = !content_type.is_empty()
            && self
                .allowed_content_types
                .iter()
                .any(|prefix| content_type.starts_with(prefix.as_str()));
        by_extension || by_type
    }

    /// Scans `html` for candidate links and returns the first file saved.
    pub async fn resolve(&self, uid: &str, html: Option<&str>) -> Resolution {
        let links = html
            .map(|body| self.strategy.candidate_links(body))
            .unwrap_or_default();
        if links.is_empty() {
            debug!(uid, "no cloud links in message body");
            return Resolution::Miss(CloudMiss::NoLinks);
        }

        debug!(uid, count = links.len(), "trying cloud links");
        for link in &links {
            match self.follow(link).await {
                Ok(path) => {
                    info!(uid, link = %redact_url(link), path = %path.display(), "cloud attachment saved");
                    return Resolution::Saved(path);
                }
                Err(failure) => {
                    warn!(uid, link = %redact_url(link), "cloud link abandoned: {}", failure);
                }
            }
        }

        let miss = CloudMiss::Exhausted {
            attempted: links.len(),
        };
        info!(uid, "{}", miss);
        Resolution::Miss(miss)
    }

    /// Requests a candidate link. A non-HTML answer is the payload; an HTML
    /// answer is a landing page whose direct links are tried in turn.
    async fn follow(&self, link: &str) -> Result<PathBuf, LinkFailure> {
        let url = parse_link(link)?;
        let response = self.get(url).await?;

        if !is_html(&response) {
            return self.save_payload(response).await;
        }

        let page_url = response.url().clone();
        let page = response.text().await?;
        let direct_links = self.strategy.direct_links(&page);
        debug!(
            page = %redact_url(page_url.as_str()),
            count = direct_links.len(),
            "landing page"
        );

        let mut last_failure = LinkFailure::NoDirectLinks;
        for direct in direct_links {
            let attempt = match page_url.join(&direct) {
                Ok(url) => self.fetch_direct(url).await,
                Err(e) => Err(LinkFailure::InvalidUrl(e.to_string())),
            };
            match attempt {
                Ok(path) => return Ok(path),
                Err(failure) => {
                    debug!(link = %redact_url(&direct), "direct link skipped: {}", failure);
                    last_failure = failure;
                }
            }
        }
        Err(last_failure)
    }

    /// Requests a link from a landing page. Another HTML page here is most
    /// likely a login or captcha wall and is skipped.
    async fn fetch_direct(&self, url: Url) -> Result<PathBuf, LinkFailure> {
        let response = self.get(url).await?;
        if is_html(&response) {
            return Err(LinkFailure::LandingPage);
        }
        self.save_payload(response).await
    }

    async fn get(&self, url: Url) -> Result<Response, LinkFailure> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LinkFailure::Status(status));
        }
        Ok(response)
    }

    /// Checks the whitelist, then streams the body to the attachment store.
    /// A body that fails midway leaves no file behind.
    async fn save_payload(&self, mut response: Response) -> Result<PathBuf, LinkFailure> {
        let content_type = header_str(&response, CONTENT_TYPE).to_ascii_lowercase();
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok());
        let filename = derive_filename(disposition, response.url());

        if !self.accepts(&filename, &content_type) {
            return Err(LinkFailure::Rejected {
                filename,
                content_type,
            });
        }

        let mut file = self.store.create(&filename).await?;
        let mut written = 0usize;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = file.write_chunk(&chunk).await {
                        file.discard().await;
                        return Err(e.into());
                    }
                    written += chunk.len();
                }
                Ok(None) => break,
                Err(e) => {
                    file.discard().await;
                    return Err(e.into());
                }
            }
        }

        let path = file.finish().await?;
        debug!(file = %filename, bytes = written, "download complete");
        Ok(path)
    }
}

fn build_client(config: &CloudConfig) -> Result<Client, CloudError> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = config.cookie.as_deref().filter(|c| !c.is_empty()) {
        let mut value =
            HeaderValue::from_str(cookie).map_err(|_| CloudError::InvalidHeader("Cookie"))?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }

    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .connect_timeout(config.connect_timeout())
        .read_timeout(config.read_timeout());
    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

fn parse_link(link: &str) -> Result<Url, LinkFailure> {
    Url::parse(&normalize_link(link)).map_err(|e| LinkFailure::InvalidUrl(e.to_string()))
}

fn header_str(response: &Response, name: reqwest::header::HeaderName) -> &str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn is_html(response: &Response) -> bool {
    header_str(response, CONTENT_TYPE)
        .to_ascii_lowercase()
        .contains("text/html")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CloudLinkResolver {
        let config = CloudConfig {
            use_system_proxy: false,
            ..CloudConfig::default()
        };
        let dir = std::env::temp_dir().join("mailintake-resolver-unit");
        CloudLinkResolver::new(&config, FileStore::new(dir)).unwrap()
    }

    #[test]
    fn test_accepts_by_extension() {
        let r = resolver();
        assert!(r.accepts("cv.pdf", ""));
        assert!(r.accepts("archive.7z", "text/plain"));
        assert!(!r.accepts("photo.jpg", "image/jpeg"));
    }

    #[test]
    fn test_accepts_by_content_type_prefix() {
        let r = resolver();
        assert!(r.accepts("download", "application/pdf"));
        assert!(r.accepts(
            "file",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
        assert!(r.accepts("blob", "application/octet-stream; charset=binary"));
        assert!(!r.accepts("download", ""));
        assert!(!r.accepts("setup.exe", "application/x-msdownload"));
    }

    #[tokio::test]
    async fn test_resolve_without_html_is_miss() {
        let r = resolver();
        assert_eq!(r.resolve("1", None).await, Resolution::Miss(CloudMiss::NoLinks));
        assert_eq!(
            r.resolve("1", Some("<p>thanks</p>")).await,
            Resolution::Miss(CloudMiss::NoLinks)
        );
    }

    #[test]
    fn test_invalid_cookie_rejected() {
        let config = CloudConfig {
            cookie: Some("bad\nvalue".to_string()),
            ..CloudConfig::default()
        };
        let result = CloudLinkResolver::new(&config, FileStore::new("unused"));
        assert!(matches!(result, Err(CloudError::InvalidHeader("Cookie"))));
    }

    #[test]
    fn test_parse_link_unescapes_entities() {
        let url = parse_link("http://mail.qq.com/ftn/download?a=1&amp;b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
        assert!(parse_link("not a url").is_err());
    }
}
