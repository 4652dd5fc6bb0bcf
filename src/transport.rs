//! WebSocket client to the backend.
//!
//! One session at a time. The receive loop runs on the tokio runtime and
//! writes the active command into [`SharedState`]; every outbound frame, from
//! either thread, goes through a single channel drained by the writer task
//! that owns the socket sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use crate::protocol::{Outbound, ProtocolError, handle_inbound};
use crate::state::Shared;

/// How long the writer gets to flush queued frames and the close handshake.
const WRITER_DRAIN: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("not connected")]
    NotConnected,
    #[error("outbound channel closed")]
    ChannelClosed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// What the control loop needs from the link to the backend.
pub trait Uplink {
    /// Start a connection attempt without blocking.
    fn connect(&self);

    fn is_connected(&self) -> bool;

    /// Queue a frame. Fails with `NotConnected` while disconnected.
    fn send(&self, frame: &Outbound) -> Result<(), TransportError>;
}

#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    shared: Shared,
    runtime: Handle,
    outbox: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    /// Set while a session is connecting or connected.
    session_active: AtomicBool,
    attempts: AtomicU64,
}

impl Transport {
    pub fn new(url: impl Into<String>, shared: Shared, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                shared,
                runtime,
                outbox: Mutex::new(None),
                session_active: AtomicBool::new(false),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Number of connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }
}

impl Uplink for Transport {
    fn connect(&self) {
        if self.inner.session_active.swap(true, Ordering::AcqRel) {
            debug!("Backend session already active, skipping connect");
            return;
        }
        let attempt = self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            if let Err(e) = Arc::clone(&inner).run_session(attempt).await {
                warn!(error = %e, attempt, "Backend session failed");
            }
            inner.mark_disconnected();
            inner.session_active.store(false, Ordering::Release);
        });
    }

    fn is_connected(&self) -> bool {
        self.inner.shared.is_connected()
    }

    fn send(&self, frame: &Outbound) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let text = frame.to_json()?;
        self.inner.enqueue(Message::text(text))
    }
}

impl Inner {
    fn enqueue(&self, message: Message) -> Result<(), TransportError> {
        let sent = match self.outbox.lock().as_ref() {
            Some(tx) => tx.send(message).is_ok(),
            None => return Err(TransportError::NotConnected),
        };
        if sent {
            Ok(())
        } else {
            self.mark_disconnected();
            Err(TransportError::ChannelClosed)
        }
    }

    fn mark_disconnected(&self) {
        *self.outbox.lock() = None;
        if self.shared.set_connected(false) {
            info!(url = %self.url, "Disconnected from backend");
        }
    }

    async fn run_session(self: Arc<Self>, attempt: u64) -> Result<(), TransportError> {
        info!(url = %self.url, attempt, "Connecting to backend");
        let (ws, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|source| TransportError::Connect {
                url: self.url.clone(),
                source,
            })?;
        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        *self.outbox.lock() = Some(tx);
        self.shared.set_connected(true);
        info!(url = %self.url, "Connected to backend");

        let mut writer = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = sink.send(message).await {
                    warn!(error = %e, "Failed to write to backend");
                    return;
                }
            }
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Backend sink close failed");
            }
        });

        let mut writer_done = false;
        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_inbound(text.as_str(), &self.shared) {
                            match reply.to_json() {
                                Ok(json) => {
                                    if let Err(e) = self.enqueue(Message::text(json)) {
                                        warn!(error = %e, "Failed to queue acknowledgment");
                                    }
                                }
                                Err(e) => warn!(error = %e, "Failed to encode acknowledgment"),
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        warn!(error = %ProtocolError::Binary(data.len()), "Discarding inbound frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "Backend closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Backend connection error");
                        break;
                    }
                    None => break,
                },
                _ = &mut writer => {
                    warn!("Backend writer stopped");
                    writer_done = true;
                    break;
                }
            }
        }

        // Dropping the sender lets the writer flush and close the sink.
        self.mark_disconnected();
        if !writer_done && tokio::time::timeout(WRITER_DRAIN, &mut writer).await.is_err() {
            debug!("Backend writer did not drain in time");
            writer.abort();
        }
        Ok(())
    }
}
