//! Cache-first.

use super::{FetchStrategy, PartitionTarget, StrategyContext};
use crate::error::Result;
use crate::models::{FetchOutcome, Request};
use async_trait::async_trait;
use tracing::debug;

/// Serve from cache; on a miss fetch, store and return.
///
/// Fonts use this unbounded (they never rotate); images use it with the
/// image cap and a placeholder fallback.
#[derive(Debug, Clone)]
pub struct CacheFirst {
    target: PartitionTarget,
    fallback: Option<String>,
}

impl CacheFirst {
    pub fn new(target: PartitionTarget) -> Self {
        Self {
            target,
            fallback: None,
        }
    }

    /// Cached path served when the network fails on a miss.
    ///
    /// Without a fallback the network error propagates.
    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback = Some(path.into());
        self
    }
}

#[async_trait]
impl FetchStrategy for CacheFirst {
    fn name(&self) -> &'static str {
        "cache-first"
    }

    async fn execute(&self, ctx: &StrategyContext, request: &Request) -> Result<FetchOutcome> {
        if let Some(cached) = ctx.cached(request) {
            return Ok(FetchOutcome::from_cache(cached));
        }

        match ctx.fetcher.fetch(request).await {
            Ok(response) => {
                ctx.store(&self.target, request, response.clone());
                Ok(FetchOutcome::from_network(response))
            }
            Err(e) if e.is_network() => match &self.fallback {
                Some(path) => {
                    debug!("Network failed for {}; serving {}", request.url, path);
                    Ok(FetchOutcome::cached_or_unavailable(ctx.cached_path(path)))
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}
