//! Property-based tests for the NUL-delimited frame codec.
//!
//! These verify the codec's framing invariants for ALL inputs, not just
//! hand-picked examples: lossless round trips for any JSON-representable
//! envelope, and decode results independent of how the byte stream is
//! split into reads.

use nulframe_proto::{
    AuthResponse, ChatHistory, ChatList, ChatListData, FrameCodec, HistoryEntry, IncomingMessage,
    RegisterResponse, ServerError, ServerEvent, Status, TeamRef,
};
use proptest::prelude::*;

fn arbitrary_status() -> impl Strategy<Value = Status> {
    prop_oneof![Just(Status::Success), Just(Status::Failure)]
}

fn arbitrary_message() -> impl Strategy<Value = IncomingMessage> {
    (any::<String>(), any::<String>(), any::<String>(), any::<Option<i64>>())
        .prop_map(|(from, to, content, timestamp)| IncomingMessage { from, to, content, timestamp })
}

fn arbitrary_history() -> impl Strategy<Value = ChatHistory> {
    (
        any::<String>(),
        any::<bool>(),
        prop::collection::vec(
            (any::<String>(), any::<String>())
                .prop_map(|(from, content)| HistoryEntry { from, content }),
            0..4,
        ),
    )
        .prop_map(|(chat_id, is_team, messages)| ChatHistory { chat_id, is_team, messages })
}

/// Strategy covering every server envelope type, with fully arbitrary
/// strings so escaping (quotes, control characters, embedded NUL) is
/// exercised.
fn arbitrary_event() -> impl Strategy<Value = ServerEvent> {
    prop_oneof![
        arbitrary_message().prop_map(ServerEvent::Message),
        arbitrary_message().prop_map(ServerEvent::TeamMessage),
        (arbitrary_status(), any::<Option<String>>(), any::<Option<String>>()).prop_map(
            |(status, message, username)| ServerEvent::AuthResponse(AuthResponse {
                status,
                message,
                username,
            })
        ),
        (proptest::option::of(arbitrary_status()), any::<Option<String>>()).prop_map(
            |(status, message)| ServerEvent::RegisterResponse(RegisterResponse { status, message })
        ),
        arbitrary_history().prop_map(ServerEvent::ChatMessages),
        any::<String>().prop_map(|team_name| ServerEvent::TeamCreated(TeamRef { team_name })),
        any::<String>().prop_map(|team_name| ServerEvent::UserAdded(TeamRef { team_name })),
        (
            prop::collection::vec(any::<String>(), 0..4),
            prop::collection::vec(any::<String>().prop_map(|team_name| TeamRef { team_name }), 0..4)
        )
            .prop_map(|(users, teams)| ServerEvent::ChatList(ChatList {
                data: ChatListData { users, teams },
            })),
        any::<Option<String>>()
            .prop_map(|message| ServerEvent::Error(ServerError { message })),
    ]
}

fn encode_all(events: &[ServerEvent]) -> Vec<u8> {
    let mut wire = Vec::new();
    for event in events {
        wire.extend_from_slice(&FrameCodec::encode(event).expect("encode should succeed"));
    }
    wire
}

fn decode_one_shot(wire: &[u8]) -> Vec<ServerEvent> {
    let mut codec = FrameCodec::new();
    codec.extend(wire);
    codec.drain()
}

proptest! {
    #[test]
    fn event_round_trip(event in arbitrary_event()) {
        let frame = FrameCodec::encode(&event).expect("encode should succeed");
        let decoded = decode_one_shot(&frame);
        prop_assert_eq!(decoded, vec![event]);
    }

    /// Decoding is independent of read chunk boundaries: any partition of
    /// the byte stream yields the same envelopes in the same order as a
    /// single read.
    #[test]
    fn chunk_boundary_independence(
        events in prop::collection::vec(arbitrary_event(), 1..6),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let wire = encode_all(&events);
        let expected = decode_one_shot(&wire);
        prop_assert_eq!(&expected, &events);

        let mut positions: Vec<usize> = cuts.iter().map(|cut| cut.index(wire.len() + 1)).collect();
        positions.push(0);
        positions.push(wire.len());
        positions.sort_unstable();
        positions.dedup();

        let mut codec = FrameCodec::new();
        let mut decoded = Vec::new();
        for window in positions.windows(2) {
            codec.extend(&wire[window[0]..window[1]]);
            decoded.extend(codec.drain());
        }

        prop_assert_eq!(decoded, expected);
        prop_assert_eq!(codec.pending(), 0);
    }

    /// The first decoded envelope of `encode(E) + arbitrary trailing bytes`
    /// is always `E`, whatever the trailing bytes contain.
    #[test]
    fn first_frame_unaffected_by_trailing_bytes(
        event in arbitrary_event(),
        trailing in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut wire = FrameCodec::encode(&event).expect("encode should succeed").to_vec();
        wire.extend_from_slice(&trailing);

        let decoded = decode_one_shot(&wire);
        prop_assert!(!decoded.is_empty());
        prop_assert_eq!(&decoded[0], &event);
    }

    /// Arbitrary garbage never panics the decoder and never leaves a
    /// delimiter-terminated segment buffered.
    #[test]
    fn garbage_input_is_safe(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut codec = FrameCodec::new();
        codec.extend(&bytes);
        let _ = codec.drain();

        let tail_start = bytes.iter().rposition(|&b| b == 0).map_or(0, |pos| pos + 1);
        prop_assert_eq!(codec.pending(), bytes.len() - tail_start);
    }
}
