//! AZ Fanpage service-worker core - offline-first request caching engine.
//!
//! The engine classifies every intercepted request into one of six traffic
//! classes and answers it with a per-class strategy (network-first,
//! cache-first or stale-while-revalidate) over three versioned cache
//! partitions. It also owns the install / activate lifecycle, push
//! notification display and notification click routing.
//!
//! The engine is host agnostic: network access, window management and
//! notification display are traits, and storage is either in memory or
//! SQLite.
//!
//! # Example
//!
//! ```rust,ignore
//! use azsw_core::{CacheEngine, EngineConfig, Request};
//!
//! #[tokio::main]
//! async fn main() -> azsw_core::Result<()> {
//!     let engine = CacheEngine::builder(EngineConfig::default()).build()?;
//!     engine.install().await?;
//!     engine.activate().await?;
//!
//!     let request = Request::get("https://www.azfanpage.nl/logo.png")?;
//!     let outcome = engine.handle_fetch(&request).await?;
//!     println!("served from {:?}", outcome.source());
//!
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod network;
pub mod notification;
pub mod storage;
pub mod strategy;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use classify::{classify, Classifier, RequestClass};
pub use config::{CacheDefaults, ClassifierRules, EngineConfig, PartitionConfig, PartitionKind};
pub use engine::{CacheEngine, CacheEngineBuilder, EngineStatus};
pub use error::{Result, SwError};
pub use lifecycle::{ActivationReport, InstallReport, WorkerState};
pub use models::{
    Destination, FetchOutcome, Request, RequestKey, RequestMode, Response, ResponseSource,
};
pub use network::{DynFetcher, Fetcher, HttpFetcher};
pub use notification::{
    ClickOutcome, ClientHost, HeadlessHost, NotificationAction, NotificationClick,
    NotificationDefaults, NotificationSpec, Notifier, WindowClient,
};
pub use storage::{CacheStorage, MemoryStorage, PartitionStats, SqliteStorage};
pub use strategy::{
    CacheFirst, FetchStrategy, NetworkFirst, StaleWhileRevalidate, StrategyContext, StrategyTable,
};
pub use sync::SyncOutcome;
