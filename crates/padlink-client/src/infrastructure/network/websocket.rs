//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each connection attempt runs in its own task. The task performs the
//! handshake, then pumps outbound text frames from an unbounded channel into
//! the socket while watching the read half for a close or an error. Lifecycle
//! signals are reported to the driver as [`TransportEvent`]s tagged with the
//! attempt that produced them.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, handshake::client::Request, Message},
};
use tracing::{debug, trace};

use super::connection_manager::{AttemptId, Connector, Link, TransportError, TransportSignal};

/// A lifecycle signal together with the attempt it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub attempt: AttemptId,
    pub signal: TransportSignal,
}

/// [`Connector`] that opens real WebSocket connections.
pub struct WsConnector {
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl WsConnector {
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { events }
    }

    /// Creates a connector together with the receiver its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Connector for WsConnector {
    type Link = WsLink;

    /// Must be called from within a Tokio runtime.
    fn connect(&mut self, endpoint: &str, attempt: AttemptId) -> Result<WsLink, TransportError> {
        let request = endpoint
            .into_client_request()
            .map_err(|e| TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(
            request,
            attempt,
            frames_rx,
            self.events.clone(),
        ));

        Ok(WsLink {
            attempt,
            frames: frames_tx,
            task,
        })
    }
}

/// Handle to one connection attempt. Dropping it tears the connection down.
pub struct WsLink {
    attempt: AttemptId,
    frames: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Link for WsLink {
    fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        self.frames
            .send(frame)
            .map_err(|_| TransportError::Closed("connection task has stopped".to_string()))
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        debug!(attempt = %self.attempt, "discarding connection");
        self.task.abort();
    }
}

// ── Connection task ───────────────────────────────────────────────────────────

async fn run_connection(
    request: Request,
    attempt: AttemptId,
    mut frames: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    // The driver may already be gone during shutdown; nothing to report to then.
    let emit = |signal: TransportSignal| {
        let _ = events.send(TransportEvent { attempt, signal });
    };

    let stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            emit(TransportSignal::Failed(TransportError::Handshake(e.to_string())));
            return;
        }
    };
    emit(TransportSignal::Opened);

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(text) => {
                    trace!(%attempt, len = text.len(), "writing frame");
                    if let Err(e) = write.send(Message::Text(text)).await {
                        emit(TransportSignal::Failed(TransportError::Io(e.to_string())));
                        return;
                    }
                }
                None => {
                    let _ = write.close().await;
                    return;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("code {}: {}", u16::from(f.code), f.reason))
                        .unwrap_or_else(|| "closed without a close frame".to_string());
                    emit(TransportSignal::Closed { reason });
                    return;
                }
                // The server does not talk back on this socket.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportSignal::Failed(TransportError::Io(e.to_string())));
                    return;
                }
                None => {
                    emit(TransportSignal::Closed {
                        reason: "stream ended".to_string(),
                    });
                    return;
                }
            },
        }
    }
}
