//! Typed event dispatch.
//!
//! Decoded [`ServerEvent`]s are classified into named categories and
//! delivered to the subscribers registered for that category. Delivery is
//! synchronous, in registration order, on whatever context calls
//! [`Dispatcher::dispatch`], which in practice is the connection's
//! receive task.
//! Subscribers that need a particular thread (a UI loop, say) forward the
//! event into their own channel; the dispatcher assumes no thread affinity
//! and must not be stalled with long blocking work.
//!
//! Server `error` envelopes get their own category so collaborators can
//! react to them, in addition to being logged here.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use nulframe_proto::ServerEvent;
use tracing::{debug, warn};

/// Lock a mutex, recovering the guard if a panicking subscriber poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Subscription categories, one per class of server event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Direct and team messages (`message`, `team_message`).
    Message,
    /// Authentication outcomes (`auth_response`).
    AuthResult,
    /// Registration outcomes (`register_response`).
    RegisterResult,
    /// Stored chat history (`chat_messages`).
    ChatHistory,
    /// Team creation notices (`team_created`).
    TeamCreated,
    /// Team membership notices (`user_added`).
    UserAdded,
    /// User/team directory updates (`chat_list`).
    ChatList,
    /// Server-reported application errors (`error`).
    Error,
}

impl EventKind {
    /// Category for an event, or `None` for types this client ignores.
    fn of(event: &ServerEvent) -> Option<Self> {
        match event {
            ServerEvent::Message(_) | ServerEvent::TeamMessage(_) => Some(Self::Message),
            ServerEvent::AuthResponse(_) => Some(Self::AuthResult),
            ServerEvent::RegisterResponse(_) => Some(Self::RegisterResult),
            ServerEvent::ChatMessages(_) => Some(Self::ChatHistory),
            ServerEvent::TeamCreated(_) => Some(Self::TeamCreated),
            ServerEvent::UserAdded(_) => Some(Self::UserAdded),
            ServerEvent::ChatList(_) => Some(Self::ChatList),
            ServerEvent::Error(_) => Some(Self::Error),
            ServerEvent::Unknown => None,
        }
    }
}

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<EventKind, Vec<(SubscriptionId, Callback)>>,
}

/// Thread-safe subscriber registry and routing table.
///
/// The dispatcher owns the registered callbacks but nothing about the
/// subscriber behind them; a subscriber that wants to tie delivery to its
/// own lifetime captures a [`std::sync::Weak`] and unsubscribes (or
/// ignores events) once the target is gone.
#[derive(Default)]
pub struct Dispatcher {
    registry: Mutex<Registry>,
}

impl Dispatcher {
    /// Create a dispatcher with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one category.
    ///
    /// Callbacks in a category run in registration order. The returned id
    /// removes exactly this registration.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.entry(kind).or_default().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Returns false if the id was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = lock(&self.registry);
        let mut removed = false;
        for subscribers in registry.subscribers.values_mut() {
            let before = subscribers.len();
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            removed |= subscribers.len() != before;
        }
        removed
    }

    /// Route one event to the subscribers of its category.
    ///
    /// Unknown types are ignored with a debug log. `error` envelopes are
    /// logged as warnings and then delivered on [`EventKind::Error`] like
    /// any other category. The registry lock is released before callbacks
    /// run, so a callback may subscribe or unsubscribe without deadlocking;
    /// such changes take effect from the next dispatch.
    pub fn dispatch(&self, event: &ServerEvent) {
        let Some(kind) = EventKind::of(event) else {
            debug!("ignoring unknown server event type");
            return;
        };

        if let ServerEvent::Error(error) = event {
            warn!(message = error.message.as_deref(), "server reported error");
        }

        let callbacks: Vec<Callback> = {
            let registry = lock(&self.registry);
            registry.subscribers.get(&kind).map_or_else(Vec::new, |subscribers| {
                subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
            })
        };

        for callback in callbacks {
            callback(event);
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = lock(&self.registry);
        let counts: HashMap<EventKind, usize> =
            registry.subscribers.iter().map(|(kind, subs)| (*kind, subs.len())).collect();
        f.debug_struct("Dispatcher").field("subscribers", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use nulframe_proto::{AuthResponse, ChatList, ChatListData, IncomingMessage, ServerError, Status};

    use super::*;

    fn message_event() -> ServerEvent {
        ServerEvent::Message(IncomingMessage {
            from: "bob".to_string(),
            to: "alice".to_string(),
            content: "hi".to_string(),
            timestamp: None,
        })
    }

    fn chat_list_event() -> ServerEvent {
        ServerEvent::ChatList(ChatList { data: ChatListData { users: vec![], teams: vec![] } })
    }

    fn recorder(
        log: &Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
    ) -> impl Fn(&ServerEvent) + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_| lock(&log).push(tag)
    }

    #[test]
    fn routes_message_and_team_message_to_same_category() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::Message, recorder(&log, "message"));

        dispatcher.dispatch(&message_event());
        dispatcher.dispatch(&ServerEvent::TeamMessage(IncomingMessage {
            from: "bob".to_string(),
            to: "backend".to_string(),
            content: "standup".to_string(),
            timestamp: None,
        }));

        assert_eq!(*lock(&log), vec!["message", "message"]);
    }

    #[test]
    fn events_dispatch_in_arrival_order_across_categories() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::ChatList, recorder(&log, "chat_list"));
        dispatcher.subscribe(EventKind::Message, recorder(&log, "message"));

        dispatcher.dispatch(&message_event());
        dispatcher.dispatch(&chat_list_event());

        // The message subscriber fires strictly before the chat_list one.
        assert_eq!(*lock(&log), vec!["message", "chat_list"]);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::Message, recorder(&log, "first"));
        dispatcher.subscribe(EventKind::Message, recorder(&log, "second"));

        dispatcher.dispatch(&message_event());

        assert_eq!(*lock(&log), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = dispatcher.subscribe(EventKind::Message, recorder(&log, "gone"));
        dispatcher.subscribe(EventKind::Message, recorder(&log, "kept"));

        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));

        dispatcher.dispatch(&message_event());
        assert_eq!(*lock(&log), vec!["kept"]);
    }

    #[test]
    fn error_envelopes_reach_error_subscribers() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::Error, recorder(&log, "error"));

        dispatcher.dispatch(&ServerEvent::Error(ServerError {
            message: Some("no such user".to_string()),
        }));

        assert_eq!(*lock(&log), vec!["error"]);
    }

    #[test]
    fn unknown_events_are_ignored() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::Message,
            EventKind::AuthResult,
            EventKind::RegisterResult,
            EventKind::ChatHistory,
            EventKind::TeamCreated,
            EventKind::UserAdded,
            EventKind::ChatList,
            EventKind::Error,
        ] {
            dispatcher.subscribe(kind, recorder(&log, "any"));
        }

        dispatcher.dispatch(&ServerEvent::Unknown);
        assert!(lock(&log).is_empty());
    }

    #[test]
    fn wrong_category_does_not_fire() {
        let dispatcher = Dispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::AuthResult, recorder(&log, "auth"));

        dispatcher.dispatch(&message_event());
        assert!(lock(&log).is_empty());

        dispatcher.dispatch(&ServerEvent::AuthResponse(AuthResponse {
            status: Status::Success,
            message: None,
            username: Some("alice".to_string()),
        }));
        assert_eq!(*lock(&log), vec!["auth"]);
    }

    #[test]
    fn callback_may_subscribe_during_dispatch() {
        let dispatcher = Arc::new(Dispatcher::new());
        let inner = Arc::clone(&dispatcher);
        let log = Arc::new(Mutex::new(Vec::new()));
        let late = recorder(&log, "late");

        let late_slot = Arc::new(Mutex::new(Some(late)));
        dispatcher.subscribe(EventKind::Message, move |_| {
            if let Some(callback) = lock(&late_slot).take() {
                inner.subscribe(EventKind::Message, callback);
            }
        });

        // First dispatch registers the late subscriber without deadlocking;
        // it only sees events from the second dispatch on.
        dispatcher.dispatch(&message_event());
        assert!(lock(&log).is_empty());

        dispatcher.dispatch(&message_event());
        assert_eq!(*lock(&log), vec!["late"]);
    }
}
