//! Version migration and client claim.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::notification::ClientHost;
use crate::storage::CacheStorage;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    /// Stale partitions removed, in creation order.
    pub deleted: Vec<String>,
    /// Open pages were claimed.
    pub claimed: bool,
}

/// Delete every partition of this namespace that is not a current one, then
/// claim all open pages.
///
/// Partitions outside the namespace are never touched.
pub async fn activate(
    config: &EngineConfig,
    storage: &dyn CacheStorage,
    clients: &dyn ClientHost,
) -> Result<ActivationReport> {
    let mut deleted = Vec::new();
    for name in storage.partition_names()? {
        if config.is_stale_partition(&name) {
            info!("Deleting old cache: {}", name);
            if storage.delete_partition(&name)? {
                deleted.push(name);
            }
        }
    }

    clients.claim().await?;

    Ok(ActivationReport {
        deleted,
        claimed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestKey, Response};
    use crate::notification::fakes::RecordingHost;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_only_stale_namespaced_partitions_are_deleted() {
        let config = EngineConfig::default();
        let storage = MemoryStorage::new();
        for name in [
            "az-static-v0.9.0",
            "az-static-v1.0.0",
            "az-dynamic-v1.0.0",
            "other-cache",
        ] {
            storage.open(name).unwrap();
        }
        let host = RecordingHost::default();

        let report = activate(&config, &storage, &host).await.unwrap();
        assert_eq!(report.deleted, vec!["az-static-v0.9.0"]);
        assert!(report.claimed);
        assert_eq!(
            storage.partition_names().unwrap(),
            vec!["az-static-v1.0.0", "az-dynamic-v1.0.0", "other-cache"]
        );
        assert_eq!(host.log(), vec!["claim"]);
    }

    #[tokio::test]
    async fn test_current_versions_of_every_kind_survive() {
        let config = EngineConfig::default();
        let storage = MemoryStorage::new();
        for name in [
            "az-static-v1.0.0",
            "az-dynamic-v1.0.0",
            "az-image-v1.0.0",
            "az-static-v0.9.0",
        ] {
            storage.open(name).unwrap();
        }

        let report = activate(&config, &storage, &RecordingHost::default())
            .await
            .unwrap();
        assert_eq!(report.deleted, vec!["az-static-v0.9.0"]);
        assert_eq!(
            storage.partition_names().unwrap(),
            vec!["az-static-v1.0.0", "az-dynamic-v1.0.0", "az-image-v1.0.0"]
        );
    }

    #[tokio::test]
    async fn test_current_entries_survive() {
        let config = EngineConfig::default();
        let storage = MemoryStorage::new();
        let key = RequestKey::for_path(&config.scope, "/").unwrap();
        storage.put("az-static-v1.0.0", &key, &Response::ok("shell")).unwrap();
        storage.put("az-image-v0.1.0", &key, &Response::ok("old")).unwrap();

        activate(&config, &storage, &RecordingHost::default())
            .await
            .unwrap();

        assert_eq!(
            storage.get("az-static-v1.0.0", &key).unwrap(),
            Some(Response::ok("shell"))
        );
        assert_eq!(storage.partition_names().unwrap(), vec!["az-static-v1.0.0"]);
    }
}
