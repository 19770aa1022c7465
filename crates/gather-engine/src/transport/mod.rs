//! Upstream session transport.
//!
//! The supervisor only sees these two traits; [`WebSocketConnector`] is the
//! production implementation and tests substitute in-memory ones.

mod decode;
mod websocket;

use async_trait::async_trait;
use gather_common::TransportError;

use crate::signal::TransportSignal;

pub use decode::decode_frame;
pub use websocket::WebSocketConnector;

/// Opens one session per call. Called again after every disconnect.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn TransportSession>, TransportError>;
}

/// A single live connection to the upstream space.
#[async_trait]
pub trait TransportSession: Send {
    /// Resolve once the initial-state snapshot has arrived. Signals read
    /// while waiting must still be returned by `next_signal`, in order.
    async fn await_snapshot(&mut self) -> Result<(), TransportError>;

    /// Next decoded signal. `None` means the connection ended cleanly.
    /// Must be cancel-safe: it is raced against the keepalive timer.
    async fn next_signal(&mut self) -> Option<Result<TransportSignal, TransportError>>;

    async fn keepalive(&mut self) -> Result<(), TransportError>;

    async fn close(&mut self);
}
