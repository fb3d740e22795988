// Page fetching behind the `PageFetcher` trait.
//
// The watcher depends only on the trait; the concrete strategy (direct HTTP,
// proxied HTTP) is selected from config when the fetcher is built. Every
// failure mode — transport error, timeout, non-2xx status, anti-bot challenge
// page — collapses into `FetchError`; the cycle loop treats them all the same
// way (skip the cycle, retry next interval).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER};
use thiserror::Error;

use crate::config::Config;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANG: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Phrases that identify an anti-bot interstitial served in place of the
/// roster page. Matched case-insensitively against the body.
const CHALLENGE_MARKERS: &[&str] = &[
    "just a moment",
    "checking your browser",
    "cf-challenge",
    "cf-turnstile",
    "attention required",
];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("challenge page served instead of roster")]
    ChallengePage,
}

// ---------------------------------------------------------------------------
// PageFetcher trait
// ---------------------------------------------------------------------------

/// Capability for obtaining the raw markup of the online-players page.
///
/// Implementations must apply their own bounded timeout and must not retry
/// internally; retry policy belongs to the cycle loop.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Plain (or proxied) HTTP fetcher sending a realistic browser header set.
pub struct HttpFetcher {
    http: reqwest::Client,
    url: String,
    referer: String,
}

impl HttpFetcher {
    /// Build a fetcher from config. Applies the request timeout, browser
    /// User-Agent, and the outbound proxy (with basic auth) when configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT);

        if let Some(proxy_cfg) = &config.proxy {
            let mut proxy = reqwest::Proxy::all(&proxy_cfg.url)?;
            if let (Some(user), Some(pass)) = (&proxy_cfg.username, &proxy_cfg.password) {
                proxy = proxy.basic_auth(user, pass);
            }
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            http: builder.build()?,
            referer: origin_of(&config.roster_url),
            url: config.roster_url.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .http
            .get(&self.url)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANG)
            .header(REFERER, &self.referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        if is_challenge_page(&body) {
            return Err(FetchError::ChallengePage);
        }

        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Detect anti-bot interstitial markup masquerading as a 200 response.
pub(crate) fn is_challenge_page(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// The `scheme://host/` prefix of a URL, used as the Referer header.
/// Falls back to the full URL when it doesn't look like an absolute URL.
pub(crate) fn origin_of(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let rest = &url[scheme_end + 3..];
        let host_end = rest.find('/').map(|i| scheme_end + 3 + i).unwrap_or(url.len());
        let mut origin = url[..host_end].to_string();
        origin.push('/');
        return origin;
    }
    url.to_string()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cloudflare_interstitial() {
        let body = "<html><head><title>Just a moment...</title></head></html>";
        assert!(is_challenge_page(body));
    }

    #[test]
    fn detects_challenge_markers_case_insensitively() {
        assert!(is_challenge_page("<div class=\"CF-Challenge\"></div>"));
        assert!(is_challenge_page("Checking Your Browser before accessing"));
    }

    #[test]
    fn normal_roster_page_is_not_a_challenge() {
        let body = "<html><table><tr><td>Alienwarre</td><td>527</td></tr></table></html>";
        assert!(!is_challenge_page(body));
    }

    #[test]
    fn empty_body_is_not_a_challenge() {
        assert!(!is_challenge_page(""));
    }

    #[test]
    fn origin_strips_path() {
        assert_eq!(
            origin_of("https://ntotenkai.com.br/online"),
            "https://ntotenkai.com.br/"
        );
    }

    #[test]
    fn origin_of_bare_host() {
        assert_eq!(origin_of("https://example.com"), "https://example.com/");
    }

    #[test]
    fn origin_of_non_url_is_passed_through() {
        assert_eq!(origin_of("not a url"), "not a url");
    }
}
