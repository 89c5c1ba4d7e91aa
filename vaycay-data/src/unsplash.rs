//! Unsplash keyword image search.
//!
//! [`UnsplashClient`] implements [`ImageSearchProvider`] with the
//! `/search/photos` endpoint, returning each hit's `urls.regular` in
//! relevance order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;
use vaycay_core::{ImageSearchProvider, ProviderError};

use crate::http::{
    self, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client, endpoint,
    parse_base_url, require_credential,
};

/// Default Unsplash API root.
pub const DEFAULT_BASE_URL: &str = "https://api.unsplash.com";

/// Default number of results requested per search.
pub const DEFAULT_PER_PAGE: u8 = 10;

/// Default content safety filter.
pub const DEFAULT_CONTENT_FILTER: &str = "high";

const RATE_LIMIT_HEADER: &str = "x-ratelimit-remaining";

/// Configuration for [`UnsplashClient`].
#[derive(Clone)]
pub struct UnsplashConfig {
    /// Access key sent as the `client_id` query parameter.
    pub access_key: String,
    /// API root, e.g. [`DEFAULT_BASE_URL`].
    pub base_url: String,
    /// Results requested per search.
    pub per_page: u8,
    /// `content_filter` value, `low` or `high`.
    pub content_filter: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl std::fmt::Debug for UnsplashConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsplashConfig")
            .field("access_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("per_page", &self.per_page)
            .field("content_filter", &self.content_filter)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for UnsplashConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            per_page: DEFAULT_PER_PAGE,
            content_filter: DEFAULT_CONTENT_FILTER.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl UnsplashConfig {
    /// Create a configuration for `access_key` with default settings.
    #[must_use]
    pub fn new(access_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            ..Default::default()
        }
    }

    /// Point the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the number of results requested per search.
    #[must_use]
    pub const fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page;
        self
    }

    /// Set the content safety filter.
    #[must_use]
    pub fn with_content_filter(mut self, filter: impl Into<String>) -> Self {
        self.content_filter = filter.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchPhoto>,
}

#[derive(Debug, Deserialize)]
struct SearchPhoto {
    urls: Option<PhotoUrls>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
}

impl SearchResponse {
    fn into_urls(self) -> Vec<String> {
        self.results
            .into_iter()
            .filter_map(|photo| photo.urls.and_then(|urls| urls.regular))
            .collect()
    }
}

/// HTTP client for Unsplash photo search.
pub struct UnsplashClient {
    client: Client,
    base: Url,
    config: UnsplashConfig,
}

impl std::fmt::Debug for UnsplashClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsplashClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UnsplashClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn new(access_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(UnsplashConfig::new(access_key))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank, the base URL is unusable, or
    /// the HTTP client fails to build.
    pub fn with_config(config: UnsplashConfig) -> Result<Self, ProviderBuildError> {
        require_credential(&config.access_key, "Unsplash access key")?;
        let base = parse_base_url(&config.base_url)?;
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    fn search_url(&self, keyword: &str) -> Url {
        let mut url = endpoint(&self.base, "search/photos");
        url.query_pairs_mut()
            .append_pair("query", keyword)
            .append_pair("client_id", &self.config.access_key)
            .append_pair("per_page", &self.config.per_page.to_string())
            .append_pair("content_filter", &self.config.content_filter);
        url
    }
}

fn log_rate_limit(response: &reqwest::Response) {
    let Some(remaining) = response
        .headers()
        .get(RATE_LIMIT_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return;
    };
    if remaining.trim() == "0" {
        log::warn!("Unsplash rate limit exhausted");
    } else {
        log::debug!("Unsplash requests remaining: {remaining}");
    }
}

#[async_trait]
impl ImageSearchProvider for UnsplashClient {
    async fn search_images(&self, keyword: &str) -> Result<Vec<String>, ProviderError> {
        let url = self.search_url(keyword);
        let response = http::send(&self.client, url, self.config.timeout).await?;
        log_rate_limit(&response);
        let body: SearchResponse = http::decode(response).await?;
        Ok(body.into_urls())
    }
}
