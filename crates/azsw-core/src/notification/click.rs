//! Notification click routing.

use super::host::{ClientHost, Notifier};
use super::payload::target_url;
use super::ACTION_DISMISS;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A click on a displayed notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationClick {
    /// Action button identifier; empty for a click on the body.
    #[serde(default)]
    pub action: String,
    /// Tag of the clicked notification.
    #[serde(default)]
    pub tag: String,
    /// Data bag the notification was shown with.
    #[serde(default)]
    pub data: Value,
}

impl NotificationClick {
    pub fn new(action: impl Into<String>, tag: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            tag: tag.into(),
            data,
        }
    }
}

/// What the click handler did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// The dismiss action; nothing else happened.
    Dismissed,
    /// An open window already showed the target and was focused.
    Focused { client_id: String, url: String },
    /// A new window was opened at the target.
    Opened { url: String },
}

/// Close the notification, then focus a window showing the target URL or
/// open one.
///
/// Window URLs are compared to the target exactly.
pub async fn route_click(
    click: &NotificationClick,
    clients: &dyn ClientHost,
    notifier: &dyn Notifier,
) -> Result<ClickOutcome> {
    notifier.close(&click.tag).await?;

    if click.action == ACTION_DISMISS {
        return Ok(ClickOutcome::Dismissed);
    }

    let url = target_url(&click.data).to_string();
    let windows = clients.match_all(true).await?;
    if let Some(client) = windows.iter().find(|c| c.url == url) {
        debug!("Focusing client {} at {}", client.id, url);
        clients.focus(&client.id).await?;
        return Ok(ClickOutcome::Focused {
            client_id: client.id.clone(),
            url,
        });
    }

    debug!("Opening new window at {}", url);
    clients.open_window(&url).await?;
    Ok(ClickOutcome::Opened { url })
}
