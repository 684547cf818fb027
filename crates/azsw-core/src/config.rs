//! Engine configuration.
//!
//! Everything the engine would otherwise read from module-level constants
//! (partition names, version tag, seed paths, caps, classification rules,
//! notification defaults) lives in one immutable [`EngineConfig`] handed to
//! the engine at construction.

use crate::error::{Result, SwError};
use crate::notification::NotificationDefaults;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Cache naming and sizing defaults.
pub struct CacheDefaults;

impl CacheDefaults {
    pub const SCOPE: &'static str = "https://www.azfanpage.nl/";
    pub const NAMESPACE: &'static str = "az";
    pub const VERSION: &'static str = "v1.0.0";
    pub const STATIC_SUFFIX: &'static str = "static";
    pub const DYNAMIC_SUFFIX: &'static str = "dynamic";
    pub const IMAGE_SUFFIX: &'static str = "image";
    pub const MAX_IMAGE_ENTRIES: usize = 100;
    pub const MAX_DYNAMIC_ENTRIES: usize = 50;
    pub const SEED_PATHS: [&'static str; 4] = ["/", "/index.html", "/manifest.json", "/favicon.ico"];
    pub const OFFLINE_SHELL: &'static str = "/";
    pub const IMAGE_PLACEHOLDER: &'static str = "/placeholder.svg";
    pub const SYNC_TAG: &'static str = "background-sync";
}

/// The three cache partitions owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    /// Navigations, fonts, JS and CSS.
    Static,
    /// API responses.
    Dynamic,
    /// Images.
    Image,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [
        PartitionKind::Static,
        PartitionKind::Dynamic,
        PartitionKind::Image,
    ];
}

/// Per-partition naming and eviction caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub static_suffix: String,
    pub dynamic_suffix: String,
    pub image_suffix: String,
    /// Maximum entries in the image partition.
    pub max_image_entries: usize,
    /// Maximum entries in the dynamic partition.
    pub max_dynamic_entries: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            static_suffix: CacheDefaults::STATIC_SUFFIX.to_string(),
            dynamic_suffix: CacheDefaults::DYNAMIC_SUFFIX.to_string(),
            image_suffix: CacheDefaults::IMAGE_SUFFIX.to_string(),
            max_image_entries: CacheDefaults::MAX_IMAGE_ENTRIES,
            max_dynamic_entries: CacheDefaults::MAX_DYNAMIC_ENTRIES,
        }
    }
}

/// Host, path and extension rules used by the request classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Hosts that serve web fonts (exact match).
    pub font_hosts: Vec<String>,
    pub font_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub static_extensions: Vec<String>,
    /// Substrings of the host that mark a backend-as-a-service API.
    pub api_host_markers: Vec<String>,
    /// Substrings of the path that mark an API call.
    pub api_path_markers: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            font_hosts: owned(&["fonts.gstatic.com", "fonts.googleapis.com"]),
            font_extensions: owned(&["woff", "woff2", "ttf", "otf", "eot"]),
            image_extensions: owned(&["jpg", "jpeg", "png", "gif", "webp", "svg", "ico"]),
            static_extensions: owned(&["js", "css"]),
            api_host_markers: owned(&["supabase"]),
            api_path_markers: owned(&["wp-json", "/api/"]),
        }
    }
}

/// Immutable engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Origin the engine controls; relative paths resolve against it.
    pub scope: Url,
    /// Prefix shared by every partition this engine owns.
    pub namespace: String,
    /// Cache-format version suffixed to every partition name.
    pub version: String,
    pub partitions: PartitionConfig,
    /// Paths pre-cached at install time (the offline shell).
    pub seed_paths: Vec<String>,
    /// Served for navigations when offline and nothing better is cached.
    pub offline_shell: String,
    /// Served for images when the network fails.
    pub image_placeholder: String,
    pub classifier: ClassifierRules,
    pub notifications: NotificationDefaults,
    /// Sync tag acknowledged by the background sync hook.
    pub sync_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scope: Url::parse(CacheDefaults::SCOPE).expect("default scope is a valid URL"),
            namespace: CacheDefaults::NAMESPACE.to_string(),
            version: CacheDefaults::VERSION.to_string(),
            partitions: PartitionConfig::default(),
            seed_paths: CacheDefaults::SEED_PATHS.iter().map(|s| s.to_string()).collect(),
            offline_shell: CacheDefaults::OFFLINE_SHELL.to_string(),
            image_placeholder: CacheDefaults::IMAGE_PLACEHOLDER.to_string(),
            classifier: ClassifierRules::default(),
            notifications: NotificationDefaults::default(),
            sync_tag: CacheDefaults::SYNC_TAG.to_string(),
        }
    }
}

impl EngineConfig {
    /// Default configuration for a different origin.
    pub fn for_scope(scope: Url) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Load a configuration file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SwError::Config {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(SwError::Config {
                message: "namespace must not be empty".to_string(),
            });
        }
        if self.version.is_empty() {
            return Err(SwError::Config {
                message: "version must not be empty".to_string(),
            });
        }
        if !matches!(self.scope.scheme(), "http" | "https") {
            return Err(SwError::Config {
                message: format!("scope must be http(s), got {}", self.scope),
            });
        }
        if self.partitions.max_image_entries == 0 || self.partitions.max_dynamic_entries == 0 {
            return Err(SwError::Config {
                message: "partition caps must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// `{namespace}-`, the prefix every owned partition starts with.
    pub fn namespace_prefix(&self) -> String {
        format!("{}-", self.namespace)
    }

    /// Versioned name of a partition, e.g. `az-static-v1.0.0`.
    pub fn partition_name(&self, kind: PartitionKind) -> String {
        let suffix = match kind {
            PartitionKind::Static => &self.partitions.static_suffix,
            PartitionKind::Dynamic => &self.partitions.dynamic_suffix,
            PartitionKind::Image => &self.partitions.image_suffix,
        };
        format!("{}-{}-{}", self.namespace, suffix, self.version)
    }

    pub fn current_partition_names(&self) -> Vec<String> {
        PartitionKind::ALL
            .iter()
            .map(|kind| self.partition_name(*kind))
            .collect()
    }

    /// Eviction cap of a partition; `None` means unbounded.
    pub fn max_entries(&self, kind: PartitionKind) -> Option<usize> {
        match kind {
            PartitionKind::Static => None,
            PartitionKind::Dynamic => Some(self.partitions.max_dynamic_entries),
            PartitionKind::Image => Some(self.partitions.max_image_entries),
        }
    }

    /// Owned by this namespace but not one of the current versioned names.
    pub fn is_stale_partition(&self, name: &str) -> bool {
        name.starts_with(&self.namespace_prefix())
            && !self.current_partition_names().iter().any(|n| n == name)
    }
}
