//! The cache engine: lifecycle, fetch interception, push and sync hooks.

use crate::classify::{Classifier, RequestClass};
use crate::config::EngineConfig;
use crate::error::{Result, SwError};
use crate::lifecycle::{self, ActivationReport, InstallReport, WorkerState};
use crate::models::{FetchOutcome, Request};
use crate::network::{DynFetcher, HttpFetcher};
use crate::notification::{
    build_notification, route_click, ClickOutcome, DynClientHost, DynNotifier, HeadlessHost,
    NotificationClick, NotificationSpec,
};
use crate::storage::{CacheStorage, MemoryStorage, PartitionStats};
use crate::strategy::{StrategyContext, StrategyTable};
use crate::sync::{handle_sync, SyncOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

/// Snapshot of the engine for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub state: WorkerState,
    pub version: String,
    pub partitions: Vec<PartitionStats>,
}

/// Builder for [`CacheEngine`].
///
/// # Example
///
/// ```rust,ignore
/// use azsw_core::{CacheEngine, EngineConfig, SqliteStorage};
/// use std::sync::Arc;
///
/// let engine = CacheEngine::builder(EngineConfig::default())
///     .storage(Arc::new(SqliteStorage::open_path("cache.db")?))
///     .build()?;
/// ```
pub struct CacheEngineBuilder {
    config: EngineConfig,
    storage: Option<Arc<dyn CacheStorage>>,
    fetcher: Option<DynFetcher>,
    clients: Option<DynClientHost>,
    notifier: Option<DynNotifier>,
    strategies: Option<StrategyTable>,
}

impl CacheEngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            storage: None,
            fetcher: None,
            clients: None,
            notifier: None,
            strategies: None,
        }
    }

    /// Partition storage.
    ///
    /// Default: a fresh [`MemoryStorage`]
    pub fn storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Network access.
    ///
    /// Default: [`HttpFetcher`]
    pub fn fetcher(mut self, fetcher: DynFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Window management used by activation and notification clicks.
    ///
    /// Default: [`HeadlessHost`]
    pub fn client_host(mut self, clients: DynClientHost) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Notification display.
    ///
    /// Default: [`HeadlessHost`]
    pub fn notifier(mut self, notifier: DynNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the class → strategy table built from the config.
    pub fn strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Validate the configuration and assemble the engine in state `Parsed`.
    pub fn build(self) -> Result<CacheEngine> {
        self.config.validate()?;
        let classifier = Classifier::new(&self.config.classifier)?;

        let storage: Arc<dyn CacheStorage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new()),
        };
        let fetcher: DynFetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()?),
        };
        let strategies = self
            .strategies
            .unwrap_or_else(|| StrategyTable::from_config(&self.config));

        let ctx = StrategyContext::new(storage, fetcher, self.config.scope.clone());
        Ok(CacheEngine {
            classifier,
            strategies,
            ctx,
            clients: self.clients.unwrap_or_else(|| Arc::new(HeadlessHost)),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(HeadlessHost)),
            state: RwLock::new(WorkerState::Parsed),
            transition: Mutex::new(()),
            config: self.config,
        })
    }
}

/// The request-interception engine.
///
/// One instance is shared (`Arc<CacheEngine>`) by every concurrent handler.
/// Lifecycle transitions are serialized; fetch, push, click and sync calls
/// never wait on each other.
pub struct CacheEngine {
    config: EngineConfig,
    classifier: Classifier,
    strategies: StrategyTable,
    ctx: StrategyContext,
    clients: DynClientHost,
    notifier: DynNotifier,
    state: RwLock<WorkerState>,
    transition: Mutex<()>,
}

impl CacheEngine {
    pub fn builder(config: EngineConfig) -> CacheEngineBuilder {
        CacheEngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.ctx.storage
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
        info!("Service worker {}", state);
    }

    async fn expect_state(&self, expected: WorkerState) -> Result<()> {
        let actual = self.state().await;
        if actual != expected {
            return Err(SwError::InvalidState {
                expected: expected.as_str(),
                actual: actual.as_str(),
            });
        }
        Ok(())
    }

    /// Pre-cache the seed set.
    ///
    /// On failure the engine becomes `Redundant` and existing partitions are
    /// left as they were.
    pub async fn install(&self) -> Result<InstallReport> {
        let _guard = self.transition.lock().await;
        self.expect_state(WorkerState::Parsed).await?;
        self.set_state(WorkerState::Installing).await;

        let storage = self.ctx.storage.as_ref();
        match lifecycle::install(&self.config, storage, self.ctx.fetcher.as_ref()).await {
            Ok(report) => {
                info!("Cached {} seed entries in {}", report.cached, report.partition);
                self.set_state(WorkerState::Installed).await;
                Ok(report)
            }
            Err(e) => {
                error!("Install failed: {}", e);
                self.set_state(WorkerState::Redundant).await;
                Err(e)
            }
        }
    }

    /// Remove stale partitions, claim open pages and start intercepting.
    pub async fn activate(&self) -> Result<ActivationReport> {
        let _guard = self.transition.lock().await;
        self.expect_state(WorkerState::Installed).await?;
        self.set_state(WorkerState::Activating).await;

        let storage = self.ctx.storage.as_ref();
        match lifecycle::activate(&self.config, storage, self.clients.as_ref()).await {
            Ok(report) => {
                self.set_state(WorkerState::Activated).await;
                Ok(report)
            }
            Err(e) => {
                error!("Activation failed: {}", e);
                self.set_state(WorkerState::Installed).await;
                Err(e)
            }
        }
    }

    /// Class of a request under this engine's rules.
    pub fn classify(&self, request: &Request) -> Option<RequestClass> {
        self.classifier.classify(request)
    }

    /// Answer an intercepted request.
    ///
    /// Returns [`FetchOutcome::Bypassed`] when the engine is not activated or
    /// the request is excluded; the caller then performs the request itself.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome> {
        if !self.state().await.intercepts() {
            return Ok(FetchOutcome::Bypassed);
        }
        let Some(class) = self.classify(request) else {
            debug!("Not intercepting {} {}", request.method, request.url);
            return Ok(FetchOutcome::Bypassed);
        };

        let strategy = self.strategies.strategy_for(class);
        debug!(
            "{} {} classified as {}, using {}",
            request.method,
            request.url,
            class,
            strategy.name()
        );
        strategy.execute(&self.ctx, request).await
    }

    /// Build and display the notification for a push message.
    pub async fn handle_push(&self, payload: Option<&[u8]>) -> Result<NotificationSpec> {
        let spec = build_notification(payload, &self.config.notifications);
        self.notifier.show(&spec).await?;
        Ok(spec)
    }

    /// Route a notification click to an existing or new window.
    pub async fn handle_notification_click(
        &self,
        click: &NotificationClick,
    ) -> Result<ClickOutcome> {
        route_click(click, self.clients.as_ref(), self.notifier.as_ref()).await
    }

    pub fn handle_sync(&self, tag: &str) -> SyncOutcome {
        handle_sync(tag, &self.config.sync_tag)
    }

    pub fn stats(&self) -> Result<Vec<PartitionStats>> {
        self.ctx.storage.stats()
    }

    pub async fn status(&self) -> Result<EngineStatus> {
        Ok(EngineStatus {
            state: self.state().await,
            version: self.config.version.clone(),
            partitions: self.stats()?,
        })
    }
}
