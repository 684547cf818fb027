//! Push payload decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, warn};

/// An action button on a displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Hard-coded notification fields that a push payload may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    /// Arbitrary data bag; `url` is the click target.
    pub data: Value,
    /// Buttons attached to every notification.
    pub actions: Vec<NotificationAction>,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "AZ Alkmaar".to_string(),
            body: "Je hebt een nieuwe notificatie".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/icon-96x96.png".to_string(),
            tag: "az-notification".to_string(),
            require_interaction: false,
            data: serde_json::json!({ "url": "/" }),
            actions: vec![
                NotificationAction {
                    action: super::ACTION_OPEN.to_string(),
                    title: "Bekijken".to_string(),
                },
                NotificationAction {
                    action: super::ACTION_DISMISS.to_string(),
                    title: "Sluiten".to_string(),
                },
            ],
        }
    }
}

/// Fields a payload is allowed to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MergedFields {
    title: String,
    body: String,
    icon: String,
    badge: String,
    tag: String,
    require_interaction: bool,
    data: Value,
}

/// Options passed along with the title when displaying a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub data: Value,
    pub actions: Vec<NotificationAction>,
}

/// A notification ready to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSpec {
    pub title: String,
    pub options: NotificationOptions,
}

impl NotificationSpec {
    fn from_fields(fields: MergedFields, actions: Vec<NotificationAction>) -> Self {
        Self {
            title: fields.title,
            options: NotificationOptions {
                body: fields.body,
                icon: fields.icon,
                badge: fields.badge,
                tag: fields.tag,
                require_interaction: fields.require_interaction,
                data: fields.data,
                actions,
            },
        }
    }

    /// Click target from `data.url`, `/` when absent, empty or not a string.
    pub fn target_url(&self) -> &str {
        target_url(&self.options.data)
    }
}

pub(crate) fn target_url(data: &Value) -> &str {
    data.get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .unwrap_or("/")
}

fn default_fields(defaults: &NotificationDefaults) -> MergedFields {
    MergedFields {
        title: defaults.title.clone(),
        body: defaults.body.clone(),
        icon: defaults.icon.clone(),
        badge: defaults.badge.clone(),
        tag: defaults.tag.clone(),
        require_interaction: defaults.require_interaction,
        data: defaults.data.clone(),
    }
}

/// Shallow-merge a JSON object over the defaults: every key present in the
/// payload replaces the default value wholesale.
///
/// A key whose value has the wrong type for its field is skipped and the
/// rest of the payload still applies.
fn merge_json(
    defaults: &MergedFields,
    payload: Map<String, Value>,
) -> serde_json::Result<MergedFields> {
    let mut merged = defaults.clone();
    for (key, value) in payload {
        let mut candidate = match serde_json::to_value(&merged)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        candidate.insert(key.clone(), value);
        match serde_json::from_value(Value::Object(candidate)) {
            Ok(fields) => merged = fields,
            Err(e) => warn!("Ignoring push field {}: {}", key, e),
        }
    }
    Ok(merged)
}

/// Build the notification for a push event.
///
/// A JSON object payload is merged over the defaults, skipping fields of the
/// wrong type. Anything that fails to parse is treated as plain text and used
/// as the body; an empty text keeps the default body. JSON that is valid but
/// not an object changes nothing.
pub fn build_notification(
    payload: Option<&[u8]>,
    defaults: &NotificationDefaults,
) -> NotificationSpec {
    let base = default_fields(defaults);
    let actions = defaults.actions.clone();

    let Some(bytes) = payload else {
        return NotificationSpec::from_fields(base, actions);
    };

    let parsed = serde_json::from_slice::<Value>(bytes).and_then(|value| match value {
        Value::Object(map) => merge_json(&base, map),
        _ => Ok(base.clone()),
    });

    match parsed {
        Ok(fields) => NotificationSpec::from_fields(fields, actions),
        Err(e) => {
            error!("Error parsing push data: {}", e);
            let text = String::from_utf8_lossy(bytes);
            let mut fields = base;
            if !text.is_empty() {
                fields.body = text.into_owned();
            }
            NotificationSpec::from_fields(fields, actions)
        }
    }
}
