//! Network core for a nulframe chat client.
//!
//! Everything between the socket and the presentation layer: a connection
//! manager with a background receive task, the NUL-delimited frame codec
//! (from [`nulframe_proto`]), and a typed event dispatcher. Presentation
//! code holds one [`ChatClient`] and touches nothing else.
//!
//! # Architecture
//!
//! Data flows one way in each direction:
//!
//! ```text
//! caller ──> request builder ──> Connection::send ──> write task ──> socket
//! socket ──> receive task ──> FrameCodec ──> Dispatcher ──> subscribers
//! ```
//!
//! Subscriber callbacks run synchronously on the receive task, in
//! registration order; marshaling onto a UI thread is the subscriber's
//! job. See [`Dispatcher`] for the routing table and [`Connection`] for
//! the lifecycle state machine.

mod client;
mod connection;
mod dispatch;
mod error;

pub use client::ChatClient;
pub use connection::{ClientConfig, Connection, ConnectionState};
pub use dispatch::{Dispatcher, EventKind, SubscriptionId};
pub use error::ClientError;
pub use nulframe_proto::{
    AuthResponse, ChatHistory, ChatList, ChatListData, FrameCodec, HistoryEntry, IncomingMessage,
    RegisterResponse, Request, ServerError, ServerEvent, Status, TeamRef,
};
