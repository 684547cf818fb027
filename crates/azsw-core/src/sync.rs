//! Background sync hook.
//!
//! The hook acknowledges the configured tag and performs no work. Queued
//! offline submissions are not replayed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of a sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The registered tag; completed without doing anything.
    Completed,
    /// Some other tag.
    Ignored,
}

pub fn handle_sync(tag: &str, registered_tag: &str) -> SyncOutcome {
    if tag == registered_tag {
        info!("Background sync triggered");
        SyncOutcome::Completed
    } else {
        debug!("Ignoring sync tag {}", tag);
        SyncOutcome::Ignored
    }
}
