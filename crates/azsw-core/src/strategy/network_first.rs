//! Network-first with cache fallback.

use super::{FetchStrategy, PartitionTarget, StrategyContext};
use crate::error::Result;
use crate::models::{FetchOutcome, Request};
use async_trait::async_trait;
use tracing::debug;

/// Try the network; on failure fall back to the cache.
///
/// Used for navigations (stored in the static partition, offline shell as
/// last resort), API calls (stored in the capped dynamic partition) and the
/// default class (nothing stored).
#[derive(Debug, Clone)]
pub struct NetworkFirst {
    target: Option<PartitionTarget>,
    offline_fallback: Option<String>,
}

impl NetworkFirst {
    /// Store successful responses into `target`.
    pub fn storing(target: PartitionTarget) -> Self {
        Self {
            target: Some(target),
            offline_fallback: None,
        }
    }

    /// Never write to the cache; only read it when offline.
    pub fn without_storage() -> Self {
        Self {
            target: None,
            offline_fallback: None,
        }
    }

    /// Path served from cache when neither network nor an exact match answers.
    pub fn with_offline_fallback(mut self, path: impl Into<String>) -> Self {
        self.offline_fallback = Some(path.into());
        self
    }
}

#[async_trait]
impl FetchStrategy for NetworkFirst {
    fn name(&self) -> &'static str {
        if self.target.is_some() {
            "network-first"
        } else {
            "network-first-no-store"
        }
    }

    async fn execute(&self, ctx: &StrategyContext, request: &Request) -> Result<FetchOutcome> {
        let error = match ctx.fetcher.fetch(request).await {
            Ok(response) => {
                if let Some(target) = &self.target {
                    ctx.store(target, request, response.clone());
                }
                return Ok(FetchOutcome::from_network(response));
            }
            Err(e) if e.is_network() => e,
            Err(e) => return Err(e),
        };

        debug!("Network failed for {}: {}; trying cache", request.url, error);
        if let Some(cached) = ctx.cached(request) {
            return Ok(FetchOutcome::from_cache(cached));
        }
        let shell = self
            .offline_fallback
            .as_deref()
            .and_then(|path| ctx.cached_path(path));
        Ok(FetchOutcome::cached_or_unavailable(shell))
    }
}
