//! Fuzz target for envelope encode/decode round trips
//!
//! Build envelopes from arbitrary strings (including control characters
//! and embedded NUL) and push them through encode + streaming decode.
//!
//! # Invariants
//!
//! - encode NEVER emits a raw NUL except the trailing delimiter
//! - decode(encode(E) + junk) yields E first
//! - A run of encoded envelopes decodes to exactly that run

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nulframe_proto::{
    AuthResponse, ChatList, ChatListData, FrameCodec, IncomingMessage, ServerError, ServerEvent,
    Status, TeamRef,
};

#[derive(Debug, Arbitrary)]
enum FuzzEvent {
    Message { from: String, to: String, content: String, timestamp: Option<i64> },
    Auth { success: bool, message: Option<String>, username: Option<String> },
    TeamCreated { team_name: String },
    ChatList { users: Vec<String>, teams: Vec<String> },
    Error { message: Option<String> },
}

impl From<FuzzEvent> for ServerEvent {
    fn from(event: FuzzEvent) -> Self {
        match event {
            FuzzEvent::Message { from, to, content, timestamp } => {
                Self::Message(IncomingMessage { from, to, content, timestamp })
            }
            FuzzEvent::Auth { success, message, username } => {
                let status = if success { Status::Success } else { Status::Failure };
                Self::AuthResponse(AuthResponse { status, message, username })
            }
            FuzzEvent::TeamCreated { team_name } => Self::TeamCreated(TeamRef { team_name }),
            FuzzEvent::ChatList { users, teams } => Self::ChatList(ChatList {
                data: ChatListData {
                    users,
                    teams: teams.into_iter().map(|team_name| TeamRef { team_name }).collect(),
                },
            }),
            FuzzEvent::Error { message } => Self::Error(ServerError { message }),
        }
    }
}

fuzz_target!(|input: (Vec<FuzzEvent>, Vec<u8>)| {
    let (events, junk) = input;
    let events: Vec<ServerEvent> = events.into_iter().map(ServerEvent::from).collect();

    let mut wire = Vec::new();
    for event in &events {
        let frame = FrameCodec::encode(event).expect("envelope types always encode");
        // The only raw NUL in a frame is its trailing delimiter.
        assert_eq!(frame.iter().filter(|&&b| b == 0).count(), 1);
        assert_eq!(frame.last(), Some(&0));
        wire.extend_from_slice(&frame);
    }

    let mut codec = FrameCodec::new();
    codec.extend(&wire);
    let decoded = codec.drain();
    assert_eq!(decoded, events);
    assert_eq!(codec.pending(), 0);

    // Trailing junk never corrupts the frames before it.
    codec.clear();
    codec.extend(&wire);
    codec.extend(&junk);
    let decoded = codec.drain();
    assert_eq!(&decoded[..events.len()], &events[..]);
});
