//! WebSocket transport to the space's event API.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use gather_common::TransportError;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::decode::decode_frame;
use super::{Connector, TransportSession};
use crate::signal::TransportSignal;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a fully built URL (credentials in the query string).
pub struct WebSocketConnector {
    url: String,
    connect_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
        }
    }

    /// The URL with its query string stripped, safe to log.
    fn display_url(&self) -> &str {
        self.url.split('?').next().unwrap_or("")
    }
}

impl std::fmt::Debug for WebSocketConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnector")
            .field("url", &self.display_url())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<Box<dyn TransportSession>, TransportError> {
        info!(url = %self.display_url(), "Connecting to upstream");

        match tokio::time::timeout(
            self.connect_timeout,
            tokio_tungstenite::connect_async(&self.url),
        )
        .await
        {
            Ok(Ok((stream, _))) => Ok(Box::new(WebSocketSession::new(stream))),
            Ok(Err(e)) => Err(TransportError::Connect(e.to_string())),
            Err(_elapsed) => Err(TransportError::ConnectTimeout(
                self.connect_timeout.as_secs(),
            )),
        }
    }
}

/// One frame's worth of progress on the read side.
enum Frame {
    Signal(TransportSignal),
    Skip,
}

struct WebSocketSession {
    stream: WsStream,
    /// Signals read while waiting for the snapshot, replayed first.
    buffered: VecDeque<TransportSignal>,
    snapshot_seen: bool,
}

impl WebSocketSession {
    fn new(stream: WsStream) -> Self {
        Self {
            stream,
            buffered: VecDeque::new(),
            snapshot_seen: false,
        }
    }

    /// `None` once the stream has ended.
    async fn read_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        let frame = match self.stream.next().await? {
            Ok(WsMessage::Text(text)) => match decode_frame(text.as_str()) {
                Some(signal) => Frame::Signal(signal),
                None => Frame::Skip,
            },
            Ok(WsMessage::Close(frame)) => {
                info!(?frame, "Upstream closed connection");
                return Some(Err(TransportError::Closed));
            }
            Ok(WsMessage::Binary(bytes)) => {
                debug!(len = bytes.len(), "Ignoring binary frame");
                Frame::Skip
            }
            Ok(_) => Frame::Skip,
            Err(e) => {
                warn!(error = %e, "WebSocket error");
                return Some(Err(TransportError::Protocol(e.to_string())));
            }
        };
        Some(Ok(frame))
    }
}

#[async_trait]
impl TransportSession for WebSocketSession {
    async fn await_snapshot(&mut self) -> Result<(), TransportError> {
        while !self.snapshot_seen {
            match self.read_frame().await {
                None => return Err(TransportError::Closed),
                Some(Err(e)) => return Err(e),
                Some(Ok(Frame::Skip)) => {}
                Some(Ok(Frame::Signal(signal))) => {
                    if matches!(signal, TransportSignal::Snapshot(_)) {
                        self.snapshot_seen = true;
                    }
                    self.buffered.push_back(signal);
                }
            }
        }
        Ok(())
    }

    async fn next_signal(&mut self) -> Option<Result<TransportSignal, TransportError>> {
        if let Some(signal) = self.buffered.pop_front() {
            return Some(Ok(signal));
        }
        loop {
            match self.read_frame().await? {
                Ok(Frame::Signal(signal)) => return Some(Ok(signal)),
                Ok(Frame::Skip) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }

    async fn keepalive(&mut self) -> Result<(), TransportError> {
        self.stream
            .send(WsMessage::Ping(Vec::new().into()))
            .await
            .map_err(|e| TransportError::Keepalive(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Close handshake failed");
        }
    }
}
