//! Notification receiver.
//!
//! Turns push payloads and foreground commands into user-visible
//! notifications, keeping at most one visible notification per tag, and routes
//! clicks back to the application.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::models::notification::{DEFAULT_ACTION, DEFAULT_TITLE};
use crate::models::{
    ClientMessage, DisplayedNotification, InboundMessage, NotificationData, NotificationOptions,
    PushPayload,
};

pub type ClientId = Uuid;

/// Location a new client opens at when the notification names no request.
pub const DEFAULT_ROUTE: &str = "/";

/// Platform surface that shows and closes notifications.
///
/// Implementations are not expected to collapse notifications by tag.
#[async_trait::async_trait]
pub trait NotificationSurface: Send + Sync {
    async fn show(&self, title: String, options: NotificationOptions) -> DisplayedNotification;

    async fn close(&self, id: Uuid);

    async fn visible(&self) -> Vec<DisplayedNotification>;

    async fn visible_with_tag(&self, tag: &str) -> Vec<DisplayedNotification> {
        self.visible()
            .await
            .into_iter()
            .filter(|n| n.tag() == tag)
            .collect()
    }
}

/// The foreground application instances the receiver can reach.
#[async_trait::async_trait]
pub trait ClientWindows: Send + Sync {
    /// An existing client, preferring the focused one.
    async fn foreground(&self) -> Option<ClientId>;

    async fn focus(&self, client: ClientId) -> bool;

    async fn post_message(&self, client: ClientId, message: ClientMessage) -> bool;

    /// Launches a new client at `url`.
    async fn open_window(&self, url: &str) -> Option<ClientId>;
}

/// Result of displaying a notification.
#[derive(Debug, Clone)]
pub struct DisplayOutcome {
    pub notification: DisplayedNotification,
    /// Number of same-tag notifications closed before showing this one.
    pub replaced: usize,
    /// True when the push body was not structured data.
    pub fallback: bool,
}

/// A JSON object body read leniently, or `None` for anything else.
fn parse_push(text: &str) -> Option<PushPayload> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => {
            let payload = PushPayload::lenient(&value);
            if payload.is_none() {
                tracing::debug!("Push payload is not a JSON object, showing as plain text");
            }
            payload
        }
        Err(e) => {
            tracing::debug!(error = %e, "Push payload is not JSON, showing as plain text");
            None
        }
    }
}

/// Where a click was routed.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Focused {
        client: ClientId,
        message: ClientMessage,
    },
    Opened {
        client: Option<ClientId>,
        url: String,
    },
}

pub struct NotificationReceiver {
    surface: Arc<dyn NotificationSurface>,
    clients: Arc<dyn ClientWindows>,
    display_lock: AsyncMutex<()>,
}

impl NotificationReceiver {
    pub fn new(surface: Arc<dyn NotificationSurface>, clients: Arc<dyn ClientWindows>) -> Self {
        Self {
            surface,
            clients,
            display_lock: AsyncMutex::new(()),
        }
    }

    /// Handles an inbound push. `data` is the raw push body, if any.
    pub async fn on_push(&self, data: Option<&str>) -> DisplayOutcome {
        let data = data.map(str::trim).filter(|d| !d.is_empty());

        let (title, options, fallback) = match data {
            None => (DEFAULT_TITLE.to_string(), NotificationOptions::default(), false),
            Some(text) => match parse_push(text) {
                Some(payload) => (
                    payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                    NotificationOptions::default().merge(payload.options),
                    false,
                ),
                None => {
                    let options = NotificationOptions {
                        body: text.to_string(),
                        ..Default::default()
                    };
                    (DEFAULT_TITLE.to_string(), options, true)
                }
            },
        };

        let mut outcome = self.display(title, options).await;
        outcome.fallback = fallback;
        outcome
    }

    /// Handles a command sent by the foreground application.
    pub async fn on_message(&self, message: InboundMessage) -> DisplayOutcome {
        match message {
            InboundMessage::ShowNotification { title, options } => {
                let title = title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
                self.display(title, NotificationOptions::default().merge(options))
                    .await
            }
        }
    }

    /// Closes every visible notification sharing the tag, then shows the new one.
    ///
    /// The display lock makes close-then-show atomic with respect to other
    /// displays, so concurrent same-tag displays leave exactly one visible.
    pub async fn display(&self, title: String, options: NotificationOptions) -> DisplayOutcome {
        let _guard = self.display_lock.lock().await;

        let stale = self.surface.visible_with_tag(&options.tag).await;
        for notification in &stale {
            self.surface.close(notification.id).await;
        }

        let notification = self.surface.show(title, options).await;
        tracing::info!(
            notification_id = %notification.id,
            tag = %notification.tag(),
            replaced = stale.len(),
            "Notification shown"
        );

        DisplayOutcome {
            notification,
            replaced: stale.len(),
            fallback: false,
        }
    }

    /// Handles a click on `notification`. `action` is the clicked button, if any.
    pub async fn on_click(
        &self,
        notification: &DisplayedNotification,
        action: Option<&str>,
    ) -> ClickOutcome {
        self.surface.close(notification.id).await;

        let action = action
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_ACTION)
            .to_string();
        let request_id = notification.options.data.request_id.clone();

        if let Some(client) = self.clients.foreground().await {
            if !self.clients.focus(client).await {
                tracing::warn!(client_id = %client, "Could not focus client");
            }
            let message = ClientMessage::NotificationAction { action, request_id };
            if !self.clients.post_message(client, message.clone()).await {
                tracing::warn!(client_id = %client, "Could not deliver message to client");
            }
            return ClickOutcome::Focused { client, message };
        }

        let url = route_for(&notification.options.data);
        let client = self.clients.open_window(&url).await;
        tracing::info!(url = %url, opened = client.is_some(), "Opening client for notification");
        ClickOutcome::Opened { client, url }
    }

    /// Handles a user dismissal. Nothing is routed.
    pub async fn on_close(&self, notification: &DisplayedNotification) {
        self.surface.close(notification.id).await;
        tracing::debug!(
            notification_id = %notification.id,
            tag = %notification.tag(),
            "Notification dismissed"
        );
    }

    pub async fn visible(&self) -> Vec<DisplayedNotification> {
        self.surface.visible().await
    }

    /// The visible notification for `tag`, if any.
    pub async fn find_by_tag(&self, tag: &str) -> Option<DisplayedNotification> {
        self.surface.visible_with_tag(tag).await.into_iter().last()
    }
}

/// Client route for the record a notification refers to.
pub fn route_for(data: &NotificationData) -> String {
    match &data.request_id {
        Some(request_id) => format!("/fuel-requests/{}", request_id),
        None => DEFAULT_ROUTE.to_string(),
    }
}

/// In-process notification surface.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    shown: Mutex<Vec<DisplayedNotification>>,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl NotificationSurface for InMemorySurface {
    async fn show(&self, title: String, options: NotificationOptions) -> DisplayedNotification {
        let notification = DisplayedNotification {
            id: Uuid::new_v4(),
            title,
            options,
            shown_at: Utc::now(),
        };
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        notification
    }

    async fn close(&self, id: Uuid) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|n| n.id != id);
    }

    async fn visible(&self) -> Vec<DisplayedNotification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug, Clone)]
struct ClientRecord {
    id: ClientId,
    url: String,
    focused: bool,
    mailbox: Vec<ClientMessage>,
}

/// In-process registry of foreground clients with per-client mailboxes.
#[derive(Debug, Default)]
pub struct InMemoryClients {
    clients: Mutex<Vec<ClientRecord>>,
}

impl InMemoryClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client that is already open at `url`.
    pub fn register(&self, url: impl Into<String>) -> ClientId {
        let id = Uuid::new_v4();
        self.lock().push(ClientRecord {
            id,
            url: url.into(),
            focused: false,
            mailbox: Vec::new(),
        });
        id
    }

    pub fn unregister(&self, client: ClientId) -> bool {
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|c| c.id != client);
        clients.len() != before
    }

    /// Takes all pending messages for `client`. `None` if the client is unknown.
    pub fn drain(&self, client: ClientId) -> Option<Vec<ClientMessage>> {
        self.lock()
            .iter_mut()
            .find(|c| c.id == client)
            .map(|c| std::mem::take(&mut c.mailbox))
    }

    pub fn url_of(&self, client: ClientId) -> Option<String> {
        self.lock()
            .iter()
            .find(|c| c.id == client)
            .map(|c| c.url.clone())
    }

    pub fn is_focused(&self, client: ClientId) -> bool {
        self.lock().iter().any(|c| c.id == client && c.focused)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ClientRecord>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl ClientWindows for InMemoryClients {
    async fn foreground(&self) -> Option<ClientId> {
        let clients = self.lock();
        clients
            .iter()
            .find(|c| c.focused)
            .or_else(|| clients.first())
            .map(|c| c.id)
    }

    async fn focus(&self, client: ClientId) -> bool {
        let mut clients = self.lock();
        if !clients.iter().any(|c| c.id == client) {
            return false;
        }
        for record in clients.iter_mut() {
            record.focused = record.id == client;
        }
        true
    }

    async fn post_message(&self, client: ClientId, message: ClientMessage) -> bool {
        match self.lock().iter_mut().find(|c| c.id == client) {
            Some(record) => {
                record.mailbox.push(message);
                true
            }
            None => false,
        }
    }

    async fn open_window(&self, url: &str) -> Option<ClientId> {
        let id = self.register(url);
        self.focus(id).await;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::{DEFAULT_BODY, DEFAULT_TAG};
    use crate::models::NotificationOverrides;

    fn receiver() -> (NotificationReceiver, Arc<InMemorySurface>, Arc<InMemoryClients>) {
        let surface = Arc::new(InMemorySurface::new());
        let clients = Arc::new(InMemoryClients::new());
        let receiver = NotificationReceiver::new(surface.clone(), clients.clone());
        (receiver, surface, clients)
    }

    /// Surface that yields between every step so concurrent displays interleave.
    /// Records shown titles in completion order.
    #[derive(Default)]
    struct YieldingSurface {
        inner: InMemorySurface,
        shown: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl NotificationSurface for YieldingSurface {
        async fn show(&self, title: String, options: NotificationOptions) -> DisplayedNotification {
            tokio::task::yield_now().await;
            let shown = self.inner.show(title, options).await;
            self.shown.lock().unwrap().push(shown.title.clone());
            shown
        }

        async fn close(&self, id: Uuid) {
            tokio::task::yield_now().await;
            self.inner.close(id).await
        }

        async fn visible(&self) -> Vec<DisplayedNotification> {
            tokio::task::yield_now().await;
            self.inner.visible().await
        }
    }

    #[tokio::test]
    async fn test_push_structured_payload() {
        let (receiver, _, _) = receiver();
        let outcome = receiver
            .on_push(Some(
                r#"{"title": "Fuel approved", "body": "Request 12 approved", "data": {"requestId": "12"}}"#,
            ))
            .await;

        assert!(!outcome.fallback);
        assert_eq!(outcome.notification.title, "Fuel approved");
        assert_eq!(outcome.notification.options.body, "Request 12 approved");
        assert_eq!(outcome.notification.tag(), DEFAULT_TAG);
        assert_eq!(outcome.notification.options.vibrate, vec![200, 100, 200]);
    }

    #[tokio::test]
    async fn test_push_plain_text_falls_back() {
        let (receiver, surface, _) = receiver();
        let outcome = receiver.on_push(Some("Truck 7 is low on fuel")).await;

        assert!(outcome.fallback);
        assert_eq!(outcome.notification.title, DEFAULT_TITLE);
        assert_eq!(outcome.notification.options.body, "Truck 7 is low on fuel");
        assert_eq!(surface.visible().await.len(), 1);
    }

    #[tokio::test]
    async fn test_push_without_data_uses_defaults() {
        let (receiver, _, _) = receiver();
        let outcome = receiver.on_push(None).await;
        assert_eq!(outcome.notification.title, DEFAULT_TITLE);
        assert_eq!(outcome.notification.options.body, DEFAULT_BODY);
        assert!(!outcome.fallback);
    }

    #[tokio::test]
    async fn test_same_tag_push_replaces_previous() {
        let (receiver, surface, _) = receiver();
        receiver
            .on_push(Some(r#"{"title": "First", "tag": "fuel-request-1"}"#))
            .await;
        let second = receiver
            .on_push(Some(r#"{"title": "Second", "tag": "fuel-request-1"}"#))
            .await;

        assert_eq!(second.replaced, 1);
        let visible = surface.visible_with_tag("fuel-request-1").await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Second");
    }

    #[tokio::test]
    async fn test_different_tags_coexist() {
        let (receiver, surface, _) = receiver();
        receiver.on_push(Some(r#"{"title": "A", "tag": "a"}"#)).await;
        receiver.on_push(Some(r#"{"title": "B", "tag": "b"}"#)).await;
        assert_eq!(surface.visible().await.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_tag_pushes_leave_one_visible() {
        let surface = Arc::new(YieldingSurface::default());
        let clients = Arc::new(InMemoryClients::new());
        let receiver = Arc::new(NotificationReceiver::new(surface.clone(), clients));

        let mut handles = Vec::new();
        for i in 0..8 {
            let receiver = receiver.clone();
            handles.push(tokio::spawn(async move {
                let body = format!(r#"{{"title": "Update {}", "tag": "fuel-request"}}"#, i);
                receiver.on_push(Some(&body)).await
            }));
        }
        let mut titles = Vec::new();
        for handle in handles {
            titles.push(handle.await.unwrap().notification.title);
        }

        let visible = surface.visible().await;
        assert_eq!(visible.len(), 1);
        let shown = surface.shown.lock().unwrap().clone();
        assert_eq!(shown.len(), 8);
        assert_eq!(visible[0].title, shown[7]);
        assert!(titles.contains(&visible[0].title));
    }

    #[tokio::test]
    async fn test_push_with_mistyped_field_keeps_structured_content() {
        let (receiver, _, _) = receiver();
        let outcome = receiver
            .on_push(Some(r#"{"title": "Fuel approved", "body": "Req 9", "tag": 42}"#))
            .await;

        assert!(!outcome.fallback);
        assert_eq!(outcome.notification.title, "Fuel approved");
        assert_eq!(outcome.notification.options.body, "Req 9");
        assert_eq!(outcome.notification.tag(), DEFAULT_TAG);
    }

    #[tokio::test]
    async fn test_push_json_scalar_falls_back() {
        let (receiver, _, _) = receiver();
        let outcome = receiver.on_push(Some("42")).await;
        assert!(outcome.fallback);
        assert_eq!(outcome.notification.title, DEFAULT_TITLE);
        assert_eq!(outcome.notification.options.body, "42");
    }

    #[tokio::test]
    async fn test_show_notification_message_merges_defaults() {
        let (receiver, _, _) = receiver();
        let outcome = receiver
            .on_message(InboundMessage::ShowNotification {
                title: Some("Low fuel".to_string()),
                options: NotificationOverrides {
                    body: Some("Van 2 at 12%".to_string()),
                    require_interaction: Some(true),
                    ..Default::default()
                },
            })
            .await;

        let options = &outcome.notification.options;
        assert_eq!(outcome.notification.title, "Low fuel");
        assert_eq!(options.body, "Van 2 at 12%");
        assert!(options.require_interaction);
        assert_eq!(options.tag, DEFAULT_TAG);
    }

    #[tokio::test]
    async fn test_click_with_foreground_client_posts_message() {
        let (receiver, surface, clients) = receiver();
        let client = clients.register("/dashboard");
        let shown = receiver
            .on_push(Some(r#"{"title": "Approved", "data": {"requestId": 42}}"#))
            .await
            .notification;

        let outcome = receiver.on_click(&shown, Some("view")).await;

        let expected = ClientMessage::NotificationAction {
            action: "view".to_string(),
            request_id: Some("42".to_string()),
        };
        assert_eq!(
            outcome,
            ClickOutcome::Focused {
                client,
                message: expected.clone()
            }
        );
        assert!(clients.is_focused(client));
        assert_eq!(clients.drain(client).unwrap(), vec![expected]);
        assert!(surface.visible().await.is_empty());
    }

    #[tokio::test]
    async fn test_click_body_reports_default_action() {
        let (receiver, _, clients) = receiver();
        let client = clients.register("/");
        let shown = receiver.on_push(None).await.notification;

        receiver.on_click(&shown, None).await;

        let messages = clients.drain(client).unwrap();
        assert_eq!(
            messages,
            vec![ClientMessage::NotificationAction {
                action: DEFAULT_ACTION.to_string(),
                request_id: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_click_without_client_opens_request_route() {
        let (receiver, _, clients) = receiver();
        let shown = receiver
            .on_push(Some(r#"{"title": "New request", "data": {"requestId": "77"}}"#))
            .await
            .notification;

        let outcome = receiver.on_click(&shown, None).await;

        match outcome {
            ClickOutcome::Opened { client, url } => {
                assert_eq!(url, "/fuel-requests/77");
                let client = client.unwrap();
                assert_eq!(clients.url_of(client).as_deref(), Some("/fuel-requests/77"));
            }
            other => panic!("Expected Opened, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_click_without_client_or_request_opens_default_route() {
        let (receiver, _, _) = receiver();
        let shown = receiver.on_push(Some("plain")).await.notification;
        let outcome = receiver.on_click(&shown, None).await;
        assert!(matches!(outcome, ClickOutcome::Opened { ref url, .. } if url == DEFAULT_ROUTE));
    }

    #[tokio::test]
    async fn test_close_empties_tag_slot() {
        let (receiver, _, clients) = receiver();
        let client = clients.register("/");
        let shown = receiver.on_push(None).await.notification;

        receiver.on_close(&shown).await;

        assert!(receiver.find_by_tag(DEFAULT_TAG).await.is_none());
        assert!(clients.drain(client).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_clients_unknown_client() {
        let clients = InMemoryClients::new();
        let unknown = Uuid::new_v4();
        assert!(clients.drain(unknown).is_none());
        assert!(!clients.focus(unknown).await);
        assert!(clients.foreground().await.is_none());
    }
}
