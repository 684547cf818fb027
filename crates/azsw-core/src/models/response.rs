//! Response snapshots stored in and served from cache partitions.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A whole response: status, headers and body snapshot.
///
/// The body is reference counted, so `clone()` is the cheap equivalent of
/// `Response.clone()`: one copy goes into the partition, the other back to
/// the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseSource::Network => write!(f, "network"),
            ResponseSource::Cache => write!(f, "cache"),
        }
    }
}

/// Result of handling one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the page talks to the network directly.
    Bypassed,
    /// A response was produced.
    Served {
        response: Response,
        source: ResponseSource,
    },
    /// Intercepted, but neither network nor cache produced a response.
    Unavailable,
}

impl FetchOutcome {
    pub fn from_cache(response: Response) -> Self {
        FetchOutcome::Served {
            response,
            source: ResponseSource::Cache,
        }
    }

    pub fn from_network(response: Response) -> Self {
        FetchOutcome::Served {
            response,
            source: ResponseSource::Network,
        }
    }

    /// Cached response or `Unavailable`.
    pub fn cached_or_unavailable(cached: Option<Response>) -> Self {
        match cached {
            Some(response) => FetchOutcome::from_cache(response),
            None => FetchOutcome::Unavailable,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Served { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Served { source, .. } => Some(*source),
            _ => None,
        }
    }
}
