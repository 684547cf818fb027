//! Intercepted request as seen by the engine.

use crate::error::{Result, SwError};
use reqwest::Method;
use std::fmt;
use url::Url;

/// Declared destination of a request (`Sec-Fetch-Dest` / `Request.destination`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    #[default]
    Empty,
    Document,
    Image,
    Font,
    Script,
    Style,
    Manifest,
    Other(String),
}

impl Destination {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" => Destination::Empty,
            "document" => Destination::Document,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "manifest" => Destination::Manifest,
            other => Destination::Other(other.to_string()),
        }
    }
}

/// Request mode (`Sec-Fetch-Mode` / `Request.mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl RequestMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigate" => RequestMode::Navigate,
            "same-origin" => RequestMode::SameOrigin,
            "no-cors" => RequestMode::NoCors,
            _ => RequestMode::Cors,
        }
    }
}

/// A request intercepted from the page.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub destination: Destination,
    pub mode: RequestMode,
}

impl Request {
    /// Create a request with an already parsed URL.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            destination: Destination::Empty,
            mode: RequestMode::Cors,
        }
    }

    /// Create a GET request from an absolute URL string.
    pub fn get(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| SwError::InvalidUrl {
            input: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(Method::GET, parsed))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Case-insensitive header lookup (first match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Identity of this request inside a cache partition.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Normalized cache key: method plus absolute URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(method: &Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        RequestKey(format!("{} {}", method.as_str(), url))
    }

    /// Key for a GET of `path` resolved against `scope`.
    pub fn for_path(scope: &Url, path: &str) -> Result<Self> {
        let url = scope.join(path).map_err(|e| SwError::InvalidUrl {
            input: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(&Method::GET, &url))
    }

    /// Rebuild a key from its stored string form.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        RequestKey(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
