//! TCP connection manager.
//!
//! Owns the socket for one connection and the two background tasks that
//! drive it: a write loop feeding the socket from a bounded queue and a
//! receive loop draining it. All operations are safe to call concurrently
//! with both tasks; state transitions happen under one lock, and the lock
//! is never held across socket I/O, so a peer that stops reading cannot
//! wedge `disconnect()` behind a backpressured write.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  connect()   ┌────────────┐  TCP established  ┌───────────┐
//! │ Disconnected │─────────────>│ Connecting │──────────────────>│ Connected │
//! └──────────────┘              └────────────┘                   └───────────┘
//!        ↑                            │ connect error                  │
//!        │                            ↓                                │
//!        └────────────────────────────┴────────────────────────────────┘
//!          disconnect() / write error / read error / peer close
//! ```
//!
//! There is no automatic retry: any failure lands back in `Disconnected`
//! and reconnection is a fresh, explicit `connect()` by the caller.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use nulframe_proto::{FrameCodec, Request};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, mpsc, oneshot},
    task::AbortHandle,
};
use tracing::{debug, info, warn};

use crate::{dispatch::Dispatcher, error::ClientError};

/// Read size for the receive loop. Matches typical socket buffer chunks;
/// frames larger than this simply span multiple reads.
const RECV_CHUNK: usize = 4096;

/// Capacity of the outgoing frame queue feeding the write loop.
const SEND_QUEUE: usize = 32;

/// One queued outgoing frame plus the channel its write result is
/// acknowledged on.
type WireCommand = (Bytes, oneshot::Sender<Result<(), String>>);

/// Where to find the chat server, plus connection tuning.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server hostname or IP address.
    pub host: String,
    /// Server TCP port.
    pub port: u16,
    /// Upper bound on TCP connection establishment. `None` defers to the
    /// operating system's connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Config for a server endpoint with no explicit connect timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, connect_timeout: None }
    }

    /// Bound connection establishment to `timeout`.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket; sends fail immediately.
    Disconnected,
    /// TCP handshake in flight.
    Connecting,
    /// Socket established, receive task running.
    Connected,
}

/// Internal state slot. `Connected` carries what teardown needs: the
/// outgoing queue handle and both task abort handles. The socket halves
/// and the receive buffer live inside the tasks themselves, so aborting
/// the tasks drops all three and closes the socket.
enum ConnState {
    Disconnected,
    Connecting,
    Connected {
        to_wire: mpsc::Sender<WireCommand>,
        write_task: AbortHandle,
        receive_task: AbortHandle,
    },
}

/// One client connection to the chat server.
///
/// Cheap to clone; clones share the same underlying connection. Exactly
/// one write task and one receive task exist per established connection,
/// and every decoded envelope is handed to the shared [`Dispatcher`] in
/// arrival order.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    config: ClientConfig,
    dispatcher: Arc<Dispatcher>,
    state: Mutex<ConnState>,
}

impl Connection {
    /// Create a connection manager in `Disconnected` state.
    pub fn new(config: ClientConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                config,
                dispatcher,
                state: Mutex::new(ConnState::Disconnected),
            }),
        }
    }

    /// Current state.
    pub async fn state(&self) -> ConnectionState {
        match *self.inner.state.lock().await {
            ConnState::Disconnected => ConnectionState::Disconnected,
            ConnState::Connecting => ConnectionState::Connecting,
            ConnState::Connected { .. } => ConnectionState::Connected,
        }
    }

    /// True while a socket is established and the receive task runs.
    pub async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }

    /// Establish the TCP connection and start the background tasks.
    ///
    /// A no-op returning `Ok` when already connected. The state lock is
    /// not held while the TCP handshake is in flight, so a concurrent
    /// `disconnect()` can cancel a pending connect; the attempt then fails
    /// rather than resurrecting the connection.
    ///
    /// # Errors
    ///
    /// [`ClientError::Connect`] if the socket cannot be established (or the
    /// configured timeout elapses first); the state stays `Disconnected`.
    pub async fn connect(&self) -> Result<(), ClientError> {
        {
            let mut state = self.inner.state.lock().await;
            match *state {
                ConnState::Connected { .. } => return Ok(()),
                ConnState::Connecting => {
                    return Err(ClientError::Connect("connect already in progress".to_string()));
                },
                ConnState::Disconnected => *state = ConnState::Connecting,
            }
        }

        let endpoint = (self.inner.config.host.as_str(), self.inner.config.port);
        let attempt = TcpStream::connect(endpoint);
        let result = match self.inner.config.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect timed out after {limit:?}"),
                )),
            },
            None => attempt.await,
        };

        let mut state = self.inner.state.lock().await;
        if !matches!(*state, ConnState::Connecting) {
            // disconnect() ran while the handshake was in flight.
            return Err(ClientError::Connect("connect cancelled".to_string()));
        }

        match result {
            Ok(stream) => {
                let (reader, writer) = stream.into_split();
                let (to_wire, commands) = mpsc::channel(SEND_QUEUE);
                let write_task = tokio::spawn(write_loop(Arc::clone(&self.inner), writer, commands));
                let receive_task = tokio::spawn(receive_loop(Arc::clone(&self.inner), reader));
                *state = ConnState::Connected {
                    to_wire,
                    write_task: write_task.abort_handle(),
                    receive_task: receive_task.abort_handle(),
                };
                info!(host = %self.inner.config.host, port = self.inner.config.port, "connected");
                Ok(())
            },
            Err(error) => {
                *state = ConnState::Disconnected;
                warn!(%error, host = %self.inner.config.host, "connection failed");
                Err(ClientError::Connect(error.to_string()))
            },
        }
    }

    /// Encode one request and queue it for the write task, awaiting the
    /// write's outcome.
    ///
    /// Fire-and-forget: success means the bytes were handed to the socket;
    /// any reply arrives asynchronously through the receive task. The state
    /// lock is held only long enough to grab the queue handle, so a send
    /// stalled on socket backpressure never blocks `disconnect()` or the
    /// state accessors.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] when no socket is established; the
    ///   network is not touched.
    /// - [`ClientError::Transport`] when the write fails or the connection
    ///   is torn down mid-write; the state has left `Connected` by the time
    ///   this returns.
    pub async fn send(&self, request: &Request) -> Result<(), ClientError> {
        let frame = FrameCodec::encode(request)?;

        let to_wire = {
            let state = self.inner.state.lock().await;
            let ConnState::Connected { to_wire, .. } = &*state else {
                return Err(ClientError::NotConnected);
            };
            to_wire.clone()
        };

        let (ack, outcome) = oneshot::channel();
        if to_wire.send((frame, ack)).await.is_err() {
            // Torn down between the state check and the queue handoff.
            return Err(ClientError::NotConnected);
        }

        match outcome.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(ClientError::Transport(error)),
            Err(_) => Err(ClientError::Transport("connection closed while sending".to_string())),
        }
    }

    /// Tear down the connection. Idempotent; close errors are swallowed.
    ///
    /// Safe to call from any context; the background tasks themselves call
    /// it on read error, write error, or peer close before exiting.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }
}

impl ConnectionInner {
    async fn is_connected(&self) -> bool {
        matches!(*self.state.lock().await, ConnState::Connected { .. })
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if teardown(&mut state) {
            info!("disconnected");
        }
    }
}

/// Replace the state with `Disconnected`, aborting both tasks. Returns
/// whether a connection was actually torn down. Must run under the state
/// lock so a concurrent connect cannot observe a half-torn-down slot.
///
/// Aborting interrupts a read or write blocked on the socket, which is
/// the only cancellation path the loops have; the socket halves drop with
/// their tasks, closing the socket without waiting on in-flight I/O.
fn teardown(state: &mut ConnState) -> bool {
    match std::mem::replace(state, ConnState::Disconnected) {
        ConnState::Connected { write_task, receive_task, .. } => {
            receive_task.abort();
            write_task.abort();
            true
        },
        _ => false,
    }
}

/// Background write loop, one per established connection.
///
/// Owns the write half, so callers queue frames instead of touching the
/// socket and never hold the state lock across a write. A write error
/// tears the connection down before the failure is acknowledged; the
/// sender observes [`ClientError::Transport`] only after the state has
/// left `Connected`.
async fn write_loop(
    inner: Arc<ConnectionInner>,
    mut writer: OwnedWriteHalf,
    mut commands: mpsc::Receiver<WireCommand>,
) {
    while let Some((frame, ack)) = commands.recv().await {
        match writer.write_all(&frame).await {
            Ok(()) => {
                let _ = ack.send(Ok(()));
            },
            Err(error) => {
                warn!(%error, "send failed, tearing down connection");
                inner.disconnect().await;
                let _ = ack.send(Err(error.to_string()));
                break;
            },
        }
    }
    let _ = writer.shutdown().await;
}

/// Background receive loop, one per established connection.
///
/// Reads, buffers, decodes, and dispatches until the peer closes, a read
/// fails, or the state leaves `Connected`. Exiting this loop (after the
/// matching teardown) is the only way the background activity ends. The
/// receive buffer is owned here and dropped with the task, which clears it
/// on disconnect.
async fn receive_loop(inner: Arc<ConnectionInner>, mut reader: OwnedReadHalf) {
    let mut codec = FrameCodec::new();
    let mut chunk = [0u8; RECV_CHUNK];

    loop {
        if !inner.is_connected().await {
            break;
        }

        match reader.read(&mut chunk).await {
            Ok(0) => {
                debug!("peer closed connection");
                inner.disconnect().await;
                break;
            },
            Ok(read) => {
                codec.extend(&chunk[..read]);
                for event in codec.drain() {
                    inner.dispatcher.dispatch(&event);
                }
            },
            Err(error) => {
                warn!(%error, "receive failed");
                inner.disconnect().await;
                break;
            },
        }
    }
}
