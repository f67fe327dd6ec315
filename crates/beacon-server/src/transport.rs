//! Transport adapter: one bidirectional peer link.

use std::fmt;
use std::pin::Pin;

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, Stream, StreamExt};

/// Write half of a peer link.
pub type PeerSink = Pin<Box<dyn Sink<Message, Error = axum::Error> + Send>>;

/// Read half of a peer link.
pub type PeerStream = Pin<Box<dyn Stream<Item = Result<Message, axum::Error>> + Send>>;

/// An upgraded peer connection, handed to [`Broadcaster::accept`].
///
/// Wraps any sink/stream pair of WebSocket messages so the session actor does
/// not care whether the bytes come from a socket or an in-memory channel.
///
/// [`Broadcaster::accept`]: crate::broadcaster::Broadcaster::accept
pub struct PeerConnection {
    sink: PeerSink,
    stream: PeerStream,
}

impl PeerConnection {
    /// Build a connection from its two halves.
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<Message, Error = axum::Error> + Send + 'static,
        R: Stream<Item = Result<Message, axum::Error>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }

    /// Split into write and read halves.
    pub fn into_parts(self) -> (PeerSink, PeerStream) {
        (self.sink, self.stream)
    }
}

impl From<WebSocket> for PeerConnection {
    fn from(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self::new(sink, stream)
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection").finish_non_exhaustive()
    }
}
