//! Push notifications: payload decoding, display and click routing.

mod click;
mod host;
mod payload;

pub use click::{route_click, ClickOutcome, NotificationClick};
pub use host::{ClientHost, DynClientHost, DynNotifier, HeadlessHost, Notifier, WindowClient};
pub use payload::{
    build_notification, NotificationAction, NotificationDefaults, NotificationOptions,
    NotificationSpec,
};

/// Action id of the "open" button.
pub const ACTION_OPEN: &str = "open";
/// Action id of the "dismiss" button.
pub const ACTION_DISMISS: &str = "dismiss";
