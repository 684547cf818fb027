//! Environment interfaces for windows and notifications.

use super::payload::NotificationSpec;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// An open page (window client) as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    /// Whether the engine currently controls this page.
    pub controlled: bool,
}

/// Window management offered by the host environment.
#[async_trait]
pub trait ClientHost: Send + Sync {
    /// Take control of every open page.
    async fn claim(&self) -> Result<()>;

    /// Open window clients; `include_uncontrolled` also lists pages the
    /// engine does not control yet.
    async fn match_all(&self, include_uncontrolled: bool) -> Result<Vec<WindowClient>>;

    /// Bring a client to the foreground.
    async fn focus(&self, client_id: &str) -> Result<()>;

    /// Open a new window at `url`.
    async fn open_window(&self, url: &str) -> Result<()>;
}

/// System notification display.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, spec: &NotificationSpec) -> Result<()>;

    /// Close the notification with the given tag.
    async fn close(&self, tag: &str) -> Result<()>;
}

pub type DynClientHost = Arc<dyn ClientHost>;
pub type DynNotifier = Arc<dyn Notifier>;

/// Host without windows or a notification surface.
///
/// Every call succeeds and is logged; `match_all` always reports no windows,
/// so clicks end in `open_window`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

#[async_trait]
impl ClientHost for HeadlessHost {
    async fn claim(&self) -> Result<()> {
        debug!("Claiming clients");
        Ok(())
    }

    async fn match_all(&self, _include_uncontrolled: bool) -> Result<Vec<WindowClient>> {
        Ok(Vec::new())
    }

    async fn focus(&self, client_id: &str) -> Result<()> {
        info!("Focus client {}", client_id);
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<()> {
        info!("Open window {}", url);
        Ok(())
    }
}

#[async_trait]
impl Notifier for HeadlessHost {
    async fn show(&self, spec: &NotificationSpec) -> Result<()> {
        info!("Notification [{}] {}: {}", spec.options.tag, spec.title, spec.options.body);
        Ok(())
    }

    async fn close(&self, tag: &str) -> Result<()> {
        debug!("Closing notification {}", tag);
        Ok(())
    }
}
