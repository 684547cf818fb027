//! Request classification.
//!
//! Maps every intercepted request to exactly one [`RequestClass`], or to
//! `None` when the engine must not intercept it at all. The classes overlap
//! (an `.svg` under `/api/` is both an image and an API call), so the
//! predicates are evaluated in a fixed precedence order:
//!
//! 1. non-GET → excluded
//! 2. non-http(s) scheme → excluded
//! 3. navigation
//! 4. font
//! 5. image
//! 6. API
//! 7. static asset (JS/CSS)
//! 8. default

use crate::config::ClassifierRules;
use crate::error::{Result, SwError};
use crate::models::{Destination, Request, RequestMode};
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Traffic class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    Navigation,
    Font,
    Image,
    Api,
    StaticAsset,
    Default,
}

impl RequestClass {
    /// All classes in precedence order.
    pub const ALL: [RequestClass; 6] = [
        RequestClass::Navigation,
        RequestClass::Font,
        RequestClass::Image,
        RequestClass::Api,
        RequestClass::StaticAsset,
        RequestClass::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Navigation => "navigation",
            RequestClass::Font => "font",
            RequestClass::Image => "image",
            RequestClass::Api => "api",
            RequestClass::StaticAsset => "static_asset",
            RequestClass::Default => "default",
        }
    }
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct Classifier {
    font_hosts: Vec<String>,
    font_ext: Option<Regex>,
    image_ext: Option<Regex>,
    static_ext: Option<Regex>,
    api_host_markers: Vec<String>,
    api_path_markers: Vec<String>,
}

/// `(?i)\.(a|b|c)$`, matched against the URL path. An empty list matches nothing.
fn extension_pattern(extensions: &[String]) -> Result<Option<Regex>> {
    if extensions.is_empty() {
        return Ok(None);
    }
    let alternatives = extensions
        .iter()
        .map(|ext| regex::escape(ext.trim_start_matches('.')))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)\.({})$", alternatives);
    Regex::new(&pattern).map(Some).map_err(|e| SwError::Config {
        message: format!("Invalid extension pattern {}: {}", pattern, e),
    })
}

fn matches_extension(pattern: &Option<Regex>, path: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(path))
}

impl Classifier {
    pub fn new(rules: &ClassifierRules) -> Result<Self> {
        Ok(Self {
            font_hosts: rules.font_hosts.clone(),
            font_ext: extension_pattern(&rules.font_extensions)?,
            image_ext: extension_pattern(&rules.image_extensions)?,
            static_ext: extension_pattern(&rules.static_extensions)?,
            api_host_markers: rules.api_host_markers.clone(),
            api_path_markers: rules.api_path_markers.clone(),
        })
    }

    /// Classify a request; `None` means "do not intercept".
    pub fn classify(&self, request: &Request) -> Option<RequestClass> {
        if request.method != Method::GET {
            return None;
        }
        if !matches!(request.url.scheme(), "http" | "https") {
            return None;
        }

        let class = if self.is_navigation(request) {
            RequestClass::Navigation
        } else if self.is_font(request) {
            RequestClass::Font
        } else if self.is_image(request) {
            RequestClass::Image
        } else if self.is_api(request) {
            RequestClass::Api
        } else if self.is_static_asset(request) {
            RequestClass::StaticAsset
        } else {
            RequestClass::Default
        };
        Some(class)
    }

    fn is_navigation(&self, request: &Request) -> bool {
        request.mode == RequestMode::Navigate
            || (request.method == Method::GET
                && request
                    .header("accept")
                    .is_some_and(|accept| accept.contains("text/html")))
    }

    fn is_font(&self, request: &Request) -> bool {
        let host = request.url.host_str().unwrap_or_default();
        self.font_hosts.iter().any(|h| h == host)
            || matches_extension(&self.font_ext, request.url.path())
    }

    fn is_image(&self, request: &Request) -> bool {
        request.destination == Destination::Image
            || matches_extension(&self.image_ext, request.url.path())
    }

    fn is_api(&self, request: &Request) -> bool {
        let host = request.url.host_str().unwrap_or_default();
        let path = request.url.path();
        self.api_host_markers.iter().any(|m| host.contains(m.as_str()))
            || self.api_path_markers.iter().any(|m| path.contains(m.as_str()))
    }

    fn is_static_asset(&self, request: &Request) -> bool {
        matches_extension(&self.static_ext, request.url.path())
    }
}

/// Classify with a freshly compiled rule set.
pub fn classify(request: &Request, rules: &ClassifierRules) -> Result<Option<RequestClass>> {
    Ok(Classifier::new(rules)?.classify(request))
}
