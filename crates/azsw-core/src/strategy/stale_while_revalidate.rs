//! Stale-while-revalidate.

use super::{FetchStrategy, PartitionTarget, StrategyContext};
use crate::error::{Result, SwError};
use crate::models::{FetchOutcome, Request, Response};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Answer from cache immediately and refresh the entry in the background.
///
/// The refresh runs as a detached task on every request. With a cached entry
/// its handle is dropped and the cached response returned at once; on a cold
/// cache the same task is awaited and its result returned.
#[derive(Debug, Clone)]
pub struct StaleWhileRevalidate {
    target: PartitionTarget,
}

impl StaleWhileRevalidate {
    pub fn new(target: PartitionTarget) -> Self {
        Self { target }
    }
}

async fn revalidate(
    ctx: StrategyContext,
    target: PartitionTarget,
    request: Request,
) -> Result<Response> {
    match ctx.fetcher.fetch(&request).await {
        Ok(response) => {
            ctx.store(&target, &request, response.clone());
            debug!("Revalidated {}", request.url);
            Ok(response)
        }
        Err(e) => {
            warn!("Revalidation of {} failed: {}", request.url, e);
            Err(e)
        }
    }
}

#[async_trait]
impl FetchStrategy for StaleWhileRevalidate {
    fn name(&self) -> &'static str {
        "stale-while-revalidate"
    }

    async fn execute(&self, ctx: &StrategyContext, request: &Request) -> Result<FetchOutcome> {
        let cached = ctx.cached(request);
        let refresh = tokio::spawn(revalidate(
            ctx.clone(),
            self.target.clone(),
            request.clone(),
        ));

        if let Some(cached) = cached {
            // Detached; its outcome only affects future requests.
            drop(refresh);
            return Ok(FetchOutcome::from_cache(cached));
        }

        let response = refresh
            .await
            .map_err(|e| SwError::Other(format!("Revalidation task failed: {}", e)))??;
        Ok(FetchOutcome::from_network(response))
    }
}
