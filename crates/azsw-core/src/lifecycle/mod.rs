//! Install / activate lifecycle.
//!
//! The engine moves through `Parsed → Installing → Installed → Activating →
//! Activated`. A failed install leaves it `Redundant` and touches no
//! existing partition.

mod activate;
mod install;

pub use activate::{activate, ActivationReport};
pub use install::{install, InstallReport};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`CacheEngine`](crate::engine::CacheEngine).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Constructed, install not started.
    #[default]
    Parsed,
    Installing,
    /// Seed set cached; waiting for activation.
    Installed,
    Activating,
    /// Intercepting fetches.
    Activated,
    /// Install failed; this engine will never intercept.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }

    /// Whether fetches are intercepted in this state.
    pub fn intercepts(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
