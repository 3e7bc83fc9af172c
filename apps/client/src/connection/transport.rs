//! Push channel transports
//!
//! A [`Connector`] opens one link to the server and bridges it onto
//! channels, so the connection manager never touches a socket directly.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Outgoing buffer per link
const OUTGOING_CAPACITY: usize = 32;

/// Incoming buffer per link
const INCOMING_CAPACITY: usize = 64;

/// One open push link
///
/// The link is closed from the remote side when `incoming` yields `None`,
/// and from the local side by cancelling `shutdown`.
pub struct PushLink {
    pub outgoing: mpsc::Sender<String>,
    pub incoming: mpsc::Receiver<String>,
    pub shutdown: CancellationToken,
}

/// Opens push links
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> ClientResult<PushLink>;
}

/// WebSocket transport over `tokio-tungstenite`
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> ClientResult<PushLink> {
        let (ws, _) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                ClientError::ConnectionFailure(format!(
                    "connect timed out after {}ms",
                    self.connect_timeout.as_millis()
                ))
            })?
            .map_err(|e| ClientError::ConnectionFailure(e.to_string()))?;

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTGOING_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel::<String>(INCOMING_CAPACITY);
        let shutdown = CancellationToken::new();

        // Writer: forward outgoing payloads until shutdown
        let writer_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_shutdown.cancelled() => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    payload = out_rx.recv() => match payload {
                        Some(text) => {
                            if let Err(e) = sink.send(Message::Text(text)).await {
                                debug!(error = %e, "Push channel write failed");
                                break;
                            }
                        }
                        None => {
                            let _ = sink.close().await;
                            break;
                        }
                    }
                }
            }
        });

        // Reader: forward text frames; dropping `in_tx` signals the close
        let reader_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_shutdown.cancelled() => break,
                    frame = stream.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if in_tx.send(text).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "Push channel closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Push channel read failed");
                            break;
                        }
                        None => break,
                    }
                }
            }
            reader_shutdown.cancel();
        });

        Ok(PushLink {
            outgoing: out_tx,
            incoming: in_rx,
            shutdown,
        })
    }
}
