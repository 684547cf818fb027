//! Caching strategies and the class → strategy table.
//!
//! Each strategy is a small stateless object parameterized by the partition
//! it writes to, an optional entry cap, and an optional fallback path. The
//! [`StrategyTable`] maps every [`RequestClass`] to one of them.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;
pub use stale_while_revalidate::StaleWhileRevalidate;

use crate::classify::RequestClass;
use crate::config::{EngineConfig, PartitionKind};
use crate::error::Result;
use crate::models::{FetchOutcome, Request, RequestKey, Response};
use crate::network::DynFetcher;
use crate::storage::{enforce_cap, CacheStorage};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Partition a strategy writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTarget {
    pub name: String,
    /// Entry cap enforced after each write; `None` is unbounded.
    pub max_entries: Option<usize>,
}

impl PartitionTarget {
    pub fn from_config(config: &EngineConfig, kind: PartitionKind) -> Self {
        Self {
            name: config.partition_name(kind),
            max_entries: config.max_entries(kind),
        }
    }
}

/// Everything a strategy needs besides the request itself.
#[derive(Clone)]
pub struct StrategyContext {
    pub storage: Arc<dyn CacheStorage>,
    pub fetcher: DynFetcher,
    /// Origin that fallback paths resolve against.
    pub scope: Url,
}

impl StrategyContext {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: DynFetcher, scope: Url) -> Self {
        Self {
            storage,
            fetcher,
            scope,
        }
    }

    /// Cached response for the request from any partition.
    ///
    /// A storage failure counts as a miss.
    pub fn cached(&self, request: &Request) -> Option<Response> {
        self.lookup(&request.key())
    }

    /// Cached response for a GET of `path` under the scope.
    pub fn cached_path(&self, path: &str) -> Option<Response> {
        match RequestKey::for_path(&self.scope, path) {
            Ok(key) => self.lookup(&key),
            Err(e) => {
                warn!("Invalid fallback path {}: {}", path, e);
                None
            }
        }
    }

    fn lookup(&self, key: &RequestKey) -> Option<Response> {
        match self.storage.match_any(key) {
            Ok(hit) => {
                debug!("Cache {} for {}", if hit.is_some() { "hit" } else { "miss" }, key);
                hit
            }
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", key, e);
                None
            }
        }
    }

    /// Best-effort write followed by the partition's cap.
    ///
    /// Failures are logged and swallowed; they never affect the response
    /// already obtained for the page.
    pub fn store(&self, target: &PartitionTarget, request: &Request, response: Response) {
        let key = request.key();
        if let Err(e) = self.storage.put(&target.name, &key, &response) {
            warn!("Failed to cache {} in {}: {}", key, target.name, e);
            return;
        }
        if let Some(max) = target.max_entries {
            if let Err(e) = enforce_cap(self.storage.as_ref(), &target.name, max) {
                warn!("Failed to trim {}: {}", target.name, e);
            }
        }
    }
}

/// A caching strategy.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produce the outcome for one intercepted request.
    async fn execute(&self, ctx: &StrategyContext, request: &Request) -> Result<FetchOutcome>;
}

/// Shared strategy handle.
pub type DynStrategy = Arc<dyn FetchStrategy>;

/// One strategy per request class.
#[derive(Clone)]
pub struct StrategyTable {
    navigation: DynStrategy,
    font: DynStrategy,
    image: DynStrategy,
    api: DynStrategy,
    static_asset: DynStrategy,
    default: DynStrategy,
}

impl StrategyTable {
    /// The standard table:
    ///
    /// | class | strategy | partition |
    /// |---|---|---|
    /// | navigation | network-first, offline shell fallback | static |
    /// | font | cache-first | static |
    /// | image | cache-first, placeholder fallback, capped | image |
    /// | api | network-first, capped | dynamic |
    /// | static asset | stale-while-revalidate | static |
    /// | default | network-first, no storage | - |
    pub fn from_config(config: &EngineConfig) -> Self {
        let static_target = PartitionTarget::from_config(config, PartitionKind::Static);
        let image_target = PartitionTarget::from_config(config, PartitionKind::Image);
        let dynamic_target = PartitionTarget::from_config(config, PartitionKind::Dynamic);

        Self {
            navigation: Arc::new(
                NetworkFirst::storing(static_target.clone())
                    .with_offline_fallback(config.offline_shell.clone()),
            ),
            font: Arc::new(CacheFirst::new(static_target.clone())),
            image: Arc::new(
                CacheFirst::new(image_target).with_fallback(config.image_placeholder.clone()),
            ),
            api: Arc::new(NetworkFirst::storing(dynamic_target)),
            static_asset: Arc::new(StaleWhileRevalidate::new(static_target)),
            default: Arc::new(NetworkFirst::without_storage()),
        }
    }

    /// Replace the strategy of one class.
    pub fn with_strategy(mut self, class: RequestClass, strategy: DynStrategy) -> Self {
        *self.slot_mut(class) = strategy;
        self
    }

    pub fn strategy_for(&self, class: RequestClass) -> &DynStrategy {
        match class {
            RequestClass::Navigation => &self.navigation,
            RequestClass::Font => &self.font,
            RequestClass::Image => &self.image,
            RequestClass::Api => &self.api,
            RequestClass::StaticAsset => &self.static_asset,
            RequestClass::Default => &self.default,
        }
    }

    fn slot_mut(&mut self, class: RequestClass) -> &mut DynStrategy {
        match class {
            RequestClass::Navigation => &mut self.navigation,
            RequestClass::Font => &mut self.font,
            RequestClass::Image => &mut self.image,
            RequestClass::Api => &mut self.api,
            RequestClass::StaticAsset => &mut self.static_asset,
            RequestClass::Default => &mut self.default,
        }
    }
}
