//! Client facade.
//!
//! [`ChatClient`] is the single object presentation code talks to. It
//! composes the connection manager, the frame codec (via the connection),
//! and the event dispatcher, and exposes exactly two surfaces: the request
//! operations going out, and the subscription categories coming in.

use std::sync::{Arc, Mutex};

use nulframe_proto::{Request, ServerEvent};
use tracing::info;

use crate::{
    connection::{ClientConfig, Connection},
    dispatch::{Dispatcher, EventKind, SubscriptionId, lock},
    error::ClientError,
};

/// High-level chat client: one connection, one dispatcher, one username.
///
/// The username reflects the last successful authentication; the facade
/// tracks it through an internal subscription on [`EventKind::AuthResult`],
/// so subscribers observing the same event should treat the event
/// payload, not the facade field, as the notification.
pub struct ChatClient {
    connection: Connection,
    dispatcher: Arc<Dispatcher>,
    username: Arc<Mutex<Option<String>>>,
}

impl ChatClient {
    /// Create a client for the given endpoint, in disconnected state.
    pub fn new(config: ClientConfig) -> Self {
        let dispatcher = Arc::new(Dispatcher::new());
        let username = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&username);
        dispatcher.subscribe(EventKind::AuthResult, move |event| {
            if let ServerEvent::AuthResponse(response) = event {
                if response.status.is_success() {
                    if let Some(name) = &response.username {
                        info!(username = %name, "authenticated");
                        *lock(&slot) = Some(name.clone());
                    }
                }
            }
        });

        let connection = Connection::new(config, Arc::clone(&dispatcher));
        Self { connection, dispatcher, username }
    }

    /// Establish the connection. No-op when already connected.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.connection.connect().await
    }

    /// Tear down the connection. Idempotent.
    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
    }

    /// True while the connection is established.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Username of the last successful authentication, if any.
    pub fn username(&self) -> Option<String> {
        lock(&self.username).clone()
    }

    /// Register a callback for one event category.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(kind, callback)
    }

    /// Remove a subscription. Returns false if already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Log in. The outcome arrives on [`EventKind::AuthResult`].
    pub async fn authenticate(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), ClientError> {
        self.connection.send(&Request::auth(username, password_hash)).await
    }

    /// Create an account. The outcome arrives on
    /// [`EventKind::RegisterResult`].
    pub async fn register(&self, username: &str, password_hash: &str) -> Result<(), ClientError> {
        self.connection.send(&Request::register(username, password_hash)).await
    }

    /// Send a message to a user, or to a team when `is_team` is set.
    pub async fn send_chat_message(
        &self,
        to: &str,
        content: &str,
        is_team: bool,
    ) -> Result<(), ClientError> {
        self.connection.send(&Request::chat_message(to, content, is_team)).await
    }

    /// Request one chat's history; it arrives on [`EventKind::ChatHistory`].
    pub async fn get_chat_history(&self, chat_id: &str, is_team: bool) -> Result<(), ClientError> {
        self.connection.send(&Request::chat_history(chat_id, is_team)).await
    }

    /// Create a team; confirmation arrives on [`EventKind::TeamCreated`].
    pub async fn create_team(&self, team_name: &str) -> Result<(), ClientError> {
        self.connection.send(&Request::create_team(team_name)).await
    }

    /// Invite a user into a team; confirmation arrives on
    /// [`EventKind::UserAdded`].
    pub async fn invite_to_team(&self, team_name: &str, username: &str) -> Result<(), ClientError> {
        self.connection.send(&Request::invite_to_team(team_name, username)).await
    }

    /// Request the user/team directory; it arrives on
    /// [`EventKind::ChatList`].
    pub async fn get_chat_list(&self) -> Result<(), ClientError> {
        self.connection.send(&Request::chat_list()).await
    }
}
