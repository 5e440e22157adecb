use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; agentstock/0.1; +https://github.com/) reqwest";
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-ZA,en;q=0.9";

/// Fetches the text body of a URL. Any non-success outcome is an error.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP fetcher with a per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            warn!("status {} for {}", status, url);
            bail!("Failed to fetch {}: HTTP {}", url, status);
        }

        response
            .text()
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

/// Serves pages from memory. Unknown URLs fail like a 404 would.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        match self.pages.get(url) {
            Some(html) => Ok(html.clone()),
            None => bail!("Failed to fetch {}: HTTP 404 Not Found", url),
        }
    }
}
