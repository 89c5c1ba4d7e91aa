//! Shared HTTP plumbing for the provider clients.
//!
//! Requests are plain `GET`s with credentials in the query string, so every
//! URL is passed through [`redact`] before it is logged or copied into a
//! [`ProviderError`].

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;
use vaycay_core::ProviderError;

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "vaycay-engine/0.1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CREDENTIAL_PARAMS: [&str; 2] = ["key", "client_id"];
const REDACTED: &str = "REDACTED";

/// Failures while constructing a provider client.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// The configured base URL does not parse.
    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The configured base URL cannot have path segments appended.
    #[error("base URL {url} cannot carry a path")]
    NotHierarchical {
        /// The rejected value.
        url: String,
    },
    /// A required credential was blank.
    #[error("{what} must not be empty")]
    MissingCredential {
        /// Which credential was missing.
        what: &'static str,
    },
}

pub(crate) fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, ProviderBuildError> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(ProviderBuildError::HttpClient)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ProviderBuildError> {
    let url = Url::parse(raw).map_err(|source| ProviderBuildError::InvalidBaseUrl {
        url: raw.to_owned(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ProviderBuildError::NotHierarchical {
            url: raw.to_owned(),
        });
    }
    Ok(url)
}

pub(crate) fn require_credential(
    value: &str,
    what: &'static str,
) -> Result<(), ProviderBuildError> {
    if value.trim().is_empty() {
        return Err(ProviderBuildError::MissingCredential { what });
    }
    Ok(())
}

/// Append `path` to the base URL's path, tolerating a trailing slash.
pub(crate) fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(path.split('/'));
    }
    url
}

fn is_credential(name: &str) -> bool {
    CREDENTIAL_PARAMS.contains(&name)
}

/// Render `url` with credential query values replaced.
pub(crate) fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(name, _)| is_credential(&name)) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let shown = if is_credential(&name) {
                REDACTED.to_owned()
            } else {
                value.into_owned()
            };
            (name.into_owned(), shown)
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

fn describe(error: &reqwest::Error) -> String {
    std::error::Error::source(error)
        .map_or_else(|| error.to_string(), |source| format!("{error}: {source}"))
}

/// Convert a reqwest error to a [`ProviderError`].
///
/// reqwest embeds the request URL in its messages, so it is stripped and the
/// redacted form supplied by the caller is used instead.
pub(crate) fn convert_reqwest_error(
    error: reqwest::Error,
    url: &str,
    timeout: Duration,
) -> ProviderError {
    let error = error.without_url();
    if error.is_timeout() {
        return ProviderError::Timeout {
            url: url.to_owned(),
            timeout_secs: timeout.as_secs(),
        };
    }

    if let Some(status) = error.status() {
        return ProviderError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    ProviderError::Network {
        url: url.to_owned(),
        message: describe(&error),
    }
}

/// Issue a `GET` and reject non-success statuses.
pub(crate) async fn send(
    client: &Client,
    url: Url,
    timeout: Duration,
) -> Result<Response, ProviderError> {
    let shown = redact(&url);
    log::debug!("GET {shown}");
    client
        .get(url)
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(|err| convert_reqwest_error(err, &shown, timeout))
}

/// Decode a JSON response body.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    response.json().await.map_err(|err| ProviderError::Decode {
        message: describe(&err.without_url()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://maps.example.com/maps/api", "https://maps.example.com/maps/api/geocode/json")]
    #[case("https://maps.example.com/maps/api/", "https://maps.example.com/maps/api/geocode/json")]
    #[case("http://127.0.0.1:8080", "http://127.0.0.1:8080/geocode/json")]
    fn endpoint_appends_segments(#[case] base: &str, #[case] expected: &str) {
        let base = parse_base_url(base).expect("base should parse");
        assert_eq!(endpoint(&base, "geocode/json").as_str(), expected);
    }

    #[rstest]
    fn endpoint_on_bare_host_starts_at_root() {
        let base = parse_base_url("https://api.example.com").expect("base should parse");
        assert_eq!(endpoint(&base, "search/photos").path(), "/search/photos");
    }

    #[rstest]
    #[case("not a url")]
    #[case("")]
    fn unparseable_base_is_rejected(#[case] raw: &str) {
        assert!(matches!(
            parse_base_url(raw),
            Err(ProviderBuildError::InvalidBaseUrl { .. })
        ));
    }

    #[rstest]
    fn opaque_base_is_rejected() {
        assert!(matches!(
            parse_base_url("mailto:maps@example.com"),
            Err(ProviderBuildError::NotHierarchical { .. })
        ));
    }

    #[rstest]
    #[case("https://h.test/p?address=Seattle&key=s3cret", "https://h.test/p?address=Seattle&key=REDACTED")]
    #[case("https://h.test/p?query=pier&client_id=abc&per_page=10", "https://h.test/p?query=pier&client_id=REDACTED&per_page=10")]
    #[case("https://h.test/p?query=pier", "https://h.test/p?query=pier")]
    fn redact_hides_credentials(#[case] raw: &str, #[case] expected: &str) {
        let url = Url::parse(raw).expect("url should parse");
        assert_eq!(redact(&url), expected);
    }

    #[rstest]
    fn blank_credentials_are_rejected() {
        assert!(matches!(
            require_credential("  ", "API key"),
            Err(ProviderBuildError::MissingCredential { what: "API key" })
        ));
        assert!(require_credential("k", "API key").is_ok());
    }
}
