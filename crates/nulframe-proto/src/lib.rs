//! Wire layer for the nulframe chat protocol.
//!
//! The protocol is a TCP stream of UTF-8 JSON objects, each terminated by a
//! single NUL (`0x00`) byte. This crate is pure data handling with no I/O:
//!
//! - [`Request`] / [`ServerEvent`]: the typed envelopes for each direction,
//!   tagged by their JSON `type` field
//! - [`FrameCodec`]: delimiter framing, including streaming decode across
//!   partial reads
//!
//! The transport that moves these frames lives in `nulframe-client`.

pub mod codec;
pub mod envelope;
pub mod errors;

pub use codec::{DELIMITER, FrameCodec};
pub use envelope::{
    AuthResponse, ChatHistory, ChatList, ChatListData, Credentials, HistoryEntry, HistoryQuery,
    IncomingMessage, Invite, OutgoingMessage, RegisterResponse, Request, ServerError, ServerEvent,
    Status, TeamRef,
};
pub use errors::ProtocolError;
