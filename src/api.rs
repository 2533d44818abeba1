//! Remote poem API: the `PoemSource` seam and its HTTP implementation.
//!
//! Endpoints (relative to the configured base URL):
//!   GET /poems/random                                  → Poem
//!   GET /poems/{id}                                    → Poem
//!   GET /poems/similar/{id}                            → [Poem]
//!   GET /poems/search?query_text=<text>&poems_num=<n>  → [Poem]

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use log::{debug, warn};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::poem::Poem;

/// HTTP status the service uses for throttling.
const TOO_MANY_REQUESTS: u16 = 429;

/// Why a request did not yield a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// HTTP 429 from the service.
    RateLimited,
    /// Any other non-success status.
    Status(u16),
    /// Connection, DNS, TLS or timeout failure.
    Transport(String),
    /// The body was not the JSON shape we expected.
    Decode(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited by server (HTTP {TOO_MANY_REQUESTS})"),
            Self::Status(code) => write!(f, "server returned HTTP {code}"),
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::Decode(message) => write!(f, "invalid response body: {message}"),
        }
    }
}

impl Error for FetchError {}

impl From<ureq::Error> for FetchError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::StatusCode(TOO_MANY_REQUESTS) => Self::RateLimited,
            ureq::Error::StatusCode(code) => Self::Status(code),
            ureq::Error::Json(e) => Self::Decode(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Source of poems. The controller only talks to this trait so tests can
/// substitute canned responses for the network.
pub trait PoemSource {
    fn random(&self) -> Result<Poem, FetchError>;
    fn by_id(&self, id: &str) -> Result<Poem, FetchError>;
    fn similar(&self, id: &str) -> Result<Vec<Poem>, FetchError>;
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Poem>, FetchError>;
}

/// Blocking HTTP client for the poem service.
pub struct ApiClient {
    agent: Agent,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/poems/{path}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("api: GET {url}");
        let result = self
            .agent
            .get(url)
            .call()
            .and_then(|mut response| response.body_mut().read_json::<T>());
        result.map_err(|e| {
            let err = FetchError::from(e);
            warn!("api: GET {url} failed: {err}");
            err
        })
    }
}

/// Percent-encode an id for use as a single path segment.
fn path_segment(id: &str) -> String {
    utf8_percent_encode(id, NON_ALPHANUMERIC).to_string()
}

impl PoemSource for ApiClient {
    fn random(&self) -> Result<Poem, FetchError> {
        self.get_json(&self.endpoint("random"))
    }

    fn by_id(&self, id: &str) -> Result<Poem, FetchError> {
        self.get_json(&self.endpoint(&path_segment(id)))
    }

    fn similar(&self, id: &str) -> Result<Vec<Poem>, FetchError> {
        self.get_json(&self.endpoint(&format!("similar/{}", path_segment(id))))
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<Poem>, FetchError> {
        let url = self.endpoint("search");
        debug!("api: GET {url} query_text={query:?} poems_num={limit}");
        let result = self
            .agent
            .get(&url)
            .query("query_text", query)
            .query("poems_num", limit.to_string())
            .call()
            .and_then(|mut response| response.body_mut().read_json::<Vec<Poem>>());
        result.map_err(|e| {
            let err = FetchError::from(e);
            warn!("api: search {query:?} failed: {err}");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_rate_limited() {
        assert_eq!(
            FetchError::from(ureq::Error::StatusCode(429)),
            FetchError::RateLimited
        );
        assert_eq!(
            FetchError::from(ureq::Error::StatusCode(404)),
            FetchError::Status(404)
        );
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://poems.invalid:8000/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://poems.invalid:8000");
        assert_eq!(
            client.endpoint("random"),
            "http://poems.invalid:8000/poems/random"
        );
    }

    #[test]
    fn ids_are_encoded_as_one_segment() {
        assert_eq!(path_segment("17"), "17");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn display_messages() {
        assert_eq!(FetchError::Status(500).to_string(), "server returned HTTP 500");
        assert!(FetchError::RateLimited.to_string().contains("429"));
    }
}
