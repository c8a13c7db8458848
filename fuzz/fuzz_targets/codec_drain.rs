//! Fuzz target for streaming frame decode
//!
//! Feed arbitrary bytes, split at arbitrary points, into the codec.
//!
//! # Invariants
//!
//! - Decode NEVER panics, whatever the bytes contain
//! - Chunking is irrelevant: the same bytes split differently yield the
//!   same decoded envelopes in the same order
//! - Everything before the last delimiter is consumed; only the trailing
//!   partial segment stays buffered

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nulframe_proto::FrameCodec;

#[derive(Debug, Arbitrary)]
struct ChunkedInput {
    bytes: Vec<u8>,
    cuts: Vec<u16>,
}

fuzz_target!(|input: ChunkedInput| {
    let mut one_shot = FrameCodec::new();
    one_shot.extend(&input.bytes);
    let expected = one_shot.drain();

    let mut cuts: Vec<usize> =
        input.cuts.iter().map(|&cut| cut as usize % (input.bytes.len() + 1)).collect();
    cuts.push(0);
    cuts.push(input.bytes.len());
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunked = FrameCodec::new();
    let mut decoded = Vec::new();
    for window in cuts.windows(2) {
        chunked.extend(&input.bytes[window[0]..window[1]]);
        decoded.extend(chunked.drain());
    }

    assert_eq!(decoded, expected);
    assert_eq!(chunked.pending(), one_shot.pending());

    let tail = input.bytes.iter().rposition(|&b| b == 0).map_or(0, |pos| pos + 1);
    assert_eq!(one_shot.pending(), input.bytes.len() - tail);
});
