//! NUL-delimited JSON frame codec.
//!
//! A frame is one serialized JSON envelope followed by a single NUL
//! (`0x00`) byte. The protocol has no length prefix; the delimiter is the
//! only framing. NUL is reserved because it can never appear unescaped in
//! JSON text (`serde_json` emits control characters inside strings as
//! `\uXXXX` escapes), so a raw `0x00` in the stream is always a frame
//! boundary.
//!
//! Decoding is streaming: [`FrameCodec`] owns the receive buffer, accepts
//! reads of arbitrary size, and yields an envelope only once its trailing
//! delimiter has arrived. A malformed segment is dropped with a warning and
//! never stalls the frames behind it.
//!
//! # Invariants
//!
//! - Chunk independence: splitting the same byte stream into different read
//!   sizes yields the same decoded envelopes in the same order.
//! - No loss, no duplication: every delimiter-terminated segment is parsed
//!   exactly once; a trailing segment without its delimiter stays buffered.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{envelope::ServerEvent, errors::ProtocolError};

/// Frame delimiter byte. Reserved: never appears unescaped in JSON text.
pub const DELIMITER: u8 = 0x00;

/// Streaming decoder for one connection's receive direction.
///
/// Owned by the receive loop; all mutation happens from that single
/// context. Dropping the codec discards any buffered partial frame, which
/// is exactly the cleanup a disconnect requires.
#[derive(Debug, Default)]
pub struct FrameCodec {
    buf: BytesMut,
}

impl FrameCodec {
    /// Create a codec with an empty receive buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode an envelope into a delimiter-terminated frame.
    ///
    /// Works for any serializable envelope; the client encodes [`Request`]
    /// values and test harnesses encode [`ServerEvent`] values.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Encode`] if JSON serialization fails. For the
    /// envelope types in this crate that indicates an implementation bug,
    /// not a runtime condition.
    ///
    /// [`Request`]: crate::Request
    pub fn encode<T: Serialize>(envelope: &T) -> Result<Bytes, ProtocolError> {
        let mut frame = serde_json::to_vec(envelope)
            .map_err(|error| ProtocolError::Encode(error.to_string()))?;
        frame.put_u8(DELIMITER);
        Ok(Bytes::from(frame))
    }

    /// Append freshly received bytes to the buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Decode every complete frame currently buffered.
    ///
    /// Scans for delimiters and JSON-parses each terminated segment. A
    /// segment that fails to parse (broken JSON, invalid UTF-8, wrong field
    /// types) is logged and skipped; decoding continues with the next
    /// segment. Bytes after the last delimiter remain buffered for the next
    /// call.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        self.drain_as()
    }

    /// [`drain`](Self::drain) generalized over the envelope type.
    ///
    /// The client decodes [`ServerEvent`]s; a test double standing in for
    /// the server decodes [`Request`]s from the same byte stream format.
    ///
    /// [`Request`]: crate::Request
    pub fn drain_as<T: DeserializeOwned>(&mut self) -> Vec<T> {
        let mut envelopes = Vec::new();

        while let Some(end) = self.buf.iter().position(|&byte| byte == DELIMITER) {
            // Take the segment plus its delimiter; parse without the delimiter.
            let segment = self.buf.split_to(end + 1);
            match serde_json::from_slice::<T>(&segment[..end]) {
                Ok(envelope) => envelopes.push(envelope),
                Err(error) => {
                    warn!(%error, segment_len = end, "dropping malformed frame");
                },
            }
        }

        envelopes
    }

    /// Bytes buffered without a terminating delimiter yet.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
