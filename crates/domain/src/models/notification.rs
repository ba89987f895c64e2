//! Notification payloads, display options and foreground messages.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_TITLE: &str = "Fleet Manager";
pub const DEFAULT_BODY: &str = "You have a new notification";
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/icons/badge-72x72.png";
pub const DEFAULT_TAG: &str = "fuel-request";
pub const DEFAULT_VIBRATE: [u32; 3] = [200, 100, 200];

/// Action identifier reported for a click on the notification body.
pub const DEFAULT_ACTION: &str = "default";

/// A button shown on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Application data carried by a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// The fuel request the notification is about, if any.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Fully resolved display options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
    pub require_interaction: bool,
    pub tag: String,
    pub vibrate: Vec<u32>,
    pub silent: bool,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            body: DEFAULT_BODY.to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_BADGE.to_string(),
            image: None,
            actions: Vec::new(),
            data: NotificationData::default(),
            require_interaction: false,
            tag: DEFAULT_TAG.to_string(),
            vibrate: DEFAULT_VIBRATE.to_vec(),
            silent: false,
        }
    }
}

impl NotificationOptions {
    /// Applies caller-supplied fields over these options.
    pub fn merge(mut self, overrides: NotificationOverrides) -> Self {
        if let Some(body) = overrides.body {
            self.body = body;
        }
        if let Some(icon) = overrides.icon {
            self.icon = icon;
        }
        if let Some(badge) = overrides.badge {
            self.badge = badge;
        }
        if overrides.image.is_some() {
            self.image = overrides.image;
        }
        if let Some(actions) = overrides.actions {
            self.actions = actions;
        }
        if let Some(data) = overrides.data {
            self.data = data;
        }
        if let Some(require_interaction) = overrides.require_interaction {
            self.require_interaction = require_interaction;
        }
        if let Some(tag) = overrides.tag.filter(|tag| !tag.trim().is_empty()) {
            self.tag = tag;
        }
        if let Some(vibrate) = overrides.vibrate {
            self.vibrate = vibrate;
        }
        if let Some(silent) = overrides.silent {
            self.silent = silent;
        }
        self
    }
}

/// Display options as sent by a caller; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOverrides {
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub image: Option<String>,
    pub actions: Option<Vec<NotificationAction>>,
    pub data: Option<NotificationData>,
    pub require_interaction: Option<bool>,
    #[validate(custom(function = "shared::validation::validate_tag"))]
    pub tag: Option<String>,
    pub vibrate: Option<Vec<u32>>,
    pub silent: Option<bool>,
}

/// Structured push payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: Option<String>,
    #[serde(flatten)]
    pub options: NotificationOverrides,
}

impl PushPayload {
    /// Reads a push payload field by field.
    ///
    /// A field of the wrong type is treated as absent so the rest of the
    /// payload still applies. Returns `None` unless `value` is a JSON object.
    pub fn lenient(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            title: field(map, "title"),
            options: NotificationOverrides {
                body: field(map, "body"),
                icon: field(map, "icon"),
                badge: field(map, "badge"),
                image: field(map, "image"),
                actions: field(map, "actions"),
                data: field(map, "data"),
                require_interaction: field(map, "requireInteraction"),
                tag: field(map, "tag"),
                vibrate: field(map, "vibrate"),
                silent: field(map, "silent"),
            },
        })
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    map.get(key).and_then(|value| T::deserialize(value).ok())
}

/// Message sent by the foreground application to the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    ShowNotification {
        title: Option<String>,
        #[serde(default)]
        options: NotificationOverrides,
    },
}

/// Message sent by the receiver to a foreground client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    NotificationAction {
        action: String,
        request_id: Option<String>,
    },
}

/// A notification currently shown on the platform surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayedNotification {
    pub id: Uuid,
    pub title: String,
    pub options: NotificationOptions,
    pub shown_at: DateTime<Utc>,
}

impl DisplayedNotification {
    pub fn tag(&self) -> &str {
        &self.options.tag
    }
}

/// Accepts a request reference sent either as a string or as a number.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
