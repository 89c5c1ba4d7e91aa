//! Error taxonomy shared by providers and services.
//!
//! Network-facing operations return one of these as a typed outcome; none of
//! them is fatal to the caller.

use thiserror::Error;

/// Transport or decoding failure reported by a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request could not be sent or the connection dropped.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL with credentials redacted.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The transport gave up waiting for a response.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL with credentials redacted.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        /// Request URL with credentials redacted.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to decode provider response: {message}")]
    Decode {
        /// Decoder error description.
        message: String,
    },
    /// The provider reported an application-level failure.
    #[error("provider returned {status}: {message}")]
    Service {
        /// Provider status code, e.g. `REQUEST_DENIED`.
        status: String,
        /// Provider error message, if any.
        message: String,
    },
}

/// A lookup produced no usable value.
///
/// Returned by the coordinate resolver for empty input, empty geocoding
/// results and upstream failures alike.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no coordinate found for {query:?}")]
pub struct NotFound {
    /// The location text as supplied by the caller.
    pub query: String,
}

/// Failures from a discovery request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// The location text could not be geocoded.
    #[error("location {location:?} could not be found")]
    LocationNotFound {
        /// The location text as supplied by the caller.
        location: String,
    },
    /// The nearby search succeeded but returned nothing.
    #[error("no {category} results near {location:?}")]
    NoResults {
        /// The category label as supplied by the caller.
        category: String,
        /// The location text as supplied by the caller.
        location: String,
    },
    /// The places provider failed.
    #[error("places provider failed: {0}")]
    Upstream(#[from] ProviderError),
}

/// Failures from a place-detail request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailError {
    /// The place id was blank.
    #[error("place id must not be empty")]
    EmptyPlaceId,
    /// The places provider failed.
    #[error("place details unavailable: {0}")]
    Upstream(#[from] ProviderError),
}

/// Failures from the favorites synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FavoritesError {
    /// No user session is active.
    #[error("no signed-in user; favorites are unavailable")]
    NoSession,
    /// The remote write failed and the optimistic change was rolled back.
    #[error("failed to save favorite change for {place_id}: {source}")]
    WriteFailed {
        /// Place whose mutation failed.
        place_id: String,
        /// Underlying store failure.
        #[source]
        source: ProviderError,
    },
    /// Subscribing to the remote change stream failed.
    #[error("failed to subscribe to favorites for {user}: {source}")]
    SubscribeFailed {
        /// User whose collection could not be followed.
        user: String,
        /// Underlying store failure.
        #[source]
        source: ProviderError,
    },
    /// Reading the remote collection failed.
    #[error("failed to load favorites: {0}")]
    LoadFailed(#[source] ProviderError),
    /// The session ended while the write was in flight; its result was
    /// discarded.
    #[error("session changed before the change to {place_id} completed")]
    SessionChanged {
        /// Place whose mutation was discarded.
        place_id: String,
    },
    /// The background task carrying the mutation stopped before reporting.
    #[error("change to {place_id} was interrupted")]
    Interrupted {
        /// Place whose mutation outcome is unknown.
        place_id: String,
    },
}

/// Failures from the travel-preferences service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferencesError {
    /// No user session is active.
    #[error("no signed-in user; preferences are unavailable")]
    NoSession,
    /// The preference text was blank.
    #[error("preference must not be empty")]
    Empty,
    /// The index does not address an existing preference.
    #[error("preference index {index} is out of range for {len} entries")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current number of preferences.
        len: usize,
    },
    /// Reading or writing the remote store failed.
    #[error("preferences store failed: {0}")]
    Store(#[from] ProviderError),
}
