//! Seed-set pre-caching.

use crate::config::{EngineConfig, PartitionKind};
use crate::error::{Result, SwError};
use crate::models::{Request, RequestKey, Response};
use crate::network::Fetcher;
use crate::storage::CacheStorage;
use futures::future::try_join_all;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    /// Partition the seed set was written to.
    pub partition: String,
    /// Number of seed entries written.
    pub cached: usize,
    /// Activation may follow without waiting for old pages to close.
    pub skip_waiting: bool,
}

async fn fetch_seed(
    config: &EngineConfig,
    fetcher: &dyn Fetcher,
    path: &str,
) -> Result<(RequestKey, Response)> {
    let url = config.scope.join(path).map_err(|e| SwError::InvalidUrl {
        input: path.to_string(),
        message: e.to_string(),
    })?;
    let request = Request::new(Method::GET, url);

    let response = fetcher.fetch(&request).await.map_err(|e| SwError::InstallFailed {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    if !response.is_ok() {
        return Err(SwError::InstallFailed {
            path: path.to_string(),
            message: format!("HTTP {}", response.status),
        });
    }

    debug!("Fetched seed {}", path);
    Ok((request.key(), response))
}

/// Fetch every seed path and write them all into the static partition.
///
/// The seed set is all-or-nothing: one failed fetch or non-2xx status fails
/// the install before anything is written.
pub async fn install(
    config: &EngineConfig,
    storage: &dyn CacheStorage,
    fetcher: &dyn Fetcher,
) -> Result<InstallReport> {
    let partition = config.partition_name(PartitionKind::Static);
    info!("Caching {} seed paths into {}", config.seed_paths.len(), partition);

    let entries = try_join_all(
        config
            .seed_paths
            .iter()
            .map(|path| fetch_seed(config, fetcher, path)),
    )
    .await?;

    storage.open(&partition)?;
    storage.put_all(&partition, &entries)?;

    Ok(InstallReport {
        partition,
        cached: entries.len(),
        skip_waiting: true,
    })
}
