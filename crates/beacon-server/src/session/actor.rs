//! Session actor: drives one peer link until either side gives up.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::Message;
use beacon_core::SessionId;
use beacon_core::wire::CoordinateReport;
use futures::{SinkExt, StreamExt};
use metrics::{counter, histogram};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, info, instrument, warn};

use super::error::SessionError;
use super::link::{OutboundFrame, OutboundQueue};
use super::phase::{SessionPhase, SessionStatus};
use crate::broadcaster::Broadcaster;
use crate::metrics::{MALFORMED_REPORTS_TOTAL, SESSION_DURATION_SECONDS, WRITE_FAILURES_TOTAL};
use crate::transport::{PeerConnection, PeerSink, PeerStream};

/// Everything one session needs to run.
pub struct SessionActor {
    id: SessionId,
    connection: PeerConnection,
    outbound: OutboundQueue,
    status: Arc<SessionStatus>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl SessionActor {
    /// Bundle a connection with its queue receiver and status.
    pub fn new(
        id: SessionId,
        connection: PeerConnection,
        outbound: OutboundQueue,
        status: Arc<SessionStatus>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            id,
            connection,
            outbound,
            status,
            broadcaster,
        }
    }

    /// Run on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run both pumps to completion, then mark the session terminated.
    ///
    /// If the outbound pump stops first the inbound pump is cancelled. If the
    /// inbound pump stops first it has already asked the coordinator to
    /// disconnect, so the outbound pump is left to drain up to the close
    /// signal.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn run(self) {
        let Self {
            id,
            connection,
            outbound,
            status,
            broadcaster,
        } = self;
        let started = Instant::now();
        let (sink, stream) = connection.into_parts();

        let span = Span::current();
        let mut writer = tokio::spawn(
            outbound_pump(id, sink, outbound, Arc::clone(&broadcaster)).instrument(span.clone()),
        );
        let mut reader = tokio::spawn(inbound_pump(id, stream, broadcaster).instrument(span));

        tokio::select! {
            result = &mut writer => {
                reader.abort();
                let _ = (&mut reader).await;
                log_exit("outbound", result);
            }
            result = &mut reader => {
                log_exit("inbound", result);
                log_exit("outbound", writer.await);
            }
        }

        let _ = status.advance(SessionPhase::Terminated);
        let elapsed = started.elapsed();
        histogram!(SESSION_DURATION_SECONDS).record(elapsed.as_secs_f64());
        info!(duration_ms = elapsed.as_millis(), "session terminated");
    }
}

fn log_exit(pump: &'static str, result: Result<Result<(), SessionError>, JoinError>) {
    match result {
        Ok(Ok(())) => debug!(pump, "pump stopped"),
        Ok(Err(error)) => info!(pump, kind = error.kind(), %error, "pump failed"),
        Err(error) if error.is_cancelled() => debug!(pump, "pump cancelled"),
        Err(error) => warn!(pump, %error, "pump panicked"),
    }
}

/// Read reports until the link fails, then ask the coordinator to disconnect
/// this session.
async fn inbound_pump(
    id: SessionId,
    mut stream: PeerStream,
    broadcaster: Arc<dyn Broadcaster>,
) -> Result<(), SessionError> {
    let result = read_reports(id, &mut stream, broadcaster.as_ref()).await;
    broadcaster.disconnect(id);
    result
}

async fn read_reports(
    id: SessionId,
    stream: &mut PeerStream,
    broadcaster: &dyn Broadcaster,
) -> Result<(), SessionError> {
    while let Some(frame) = stream.next().await {
        let parsed = match frame.map_err(SessionError::Read)? {
            Message::Text(text) => CoordinateReport::parse(text.as_str()),
            Message::Binary(bytes) => CoordinateReport::parse_bytes(&bytes),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(frame) => {
                debug!(?frame, "peer sent close frame");
                return Ok(());
            }
        };
        let report = parsed.inspect_err(|_| counter!(MALFORMED_REPORTS_TOTAL).increment(1))?;
        broadcaster.submit_update(id, report.position());
    }
    debug!("peer stream ended");
    Ok(())
}

/// Write queued frames in order until the close signal, a hangup or a write
/// failure.
async fn outbound_pump(
    id: SessionId,
    mut sink: PeerSink,
    mut outbound: OutboundQueue,
    broadcaster: Arc<dyn Broadcaster>,
) -> Result<(), SessionError> {
    let hangup = outbound.hangup();
    while let Some(frame) = outbound.recv().await {
        let OutboundFrame::Text(text) = frame else {
            close_sink(&mut sink, &hangup).await;
            return Ok(());
        };
        let sent = tokio::select! {
            biased;
            () = hangup.cancelled() => break,
            sent = sink.send(Message::Text(text)) => sent,
        };
        if let Err(error) = sent {
            counter!(WRITE_FAILURES_TOTAL).increment(1);
            broadcaster.disconnect(id);
            return Err(SessionError::Write(error));
        }
    }
    if hangup.is_cancelled() {
        debug!("outbound queue hung up");
    } else {
        debug!("outbound queue dropped");
    }
    close_sink(&mut sink, &hangup).await;
    Ok(())
}

/// Close the write side unless the link has been hung up, in which case the
/// sink is simply dropped. The link may already be broken; nothing is left to
/// report either way.
async fn close_sink(sink: &mut PeerSink, hangup: &CancellationToken) {
    tokio::select! {
        biased;
        () = hangup.cancelled() => {}
        _ = sink.close() => {}
    }
}
