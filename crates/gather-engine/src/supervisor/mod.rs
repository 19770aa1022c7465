//! Connection lifecycle: Disconnected → Connecting → Connected, with
//! reconnect on loss, a bounded wait for the initial snapshot, and a
//! keepalive while connected.

mod backoff;
mod connection;
mod types;


use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::transport::Connector;

pub use types::{BackoffPolicy, ConnectionState, SupervisorConfig, SupervisorEvent};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Handle to the background supervision task.
pub struct ConnectionSupervisor {
    state: watch::Receiver<ConnectionState>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ConnectionSupervisor {
    /// Spawn supervision and return at once. Events arrive on the returned
    /// receiver; dropping it stops the supervisor at its next send.
    ///
    /// Cancelling `shutdown` (or calling [`shutdown`](Self::shutdown))
    /// stops it too.
    pub fn start(
        connector: Arc<dyn Connector>,
        config: SupervisorConfig,
        shutdown: &CancellationToken,
    ) -> (Self, mpsc::Receiver<SupervisorEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let shutdown = shutdown.child_token();

        let task = tokio::spawn(connection::supervise(
            connector,
            config,
            state_tx,
            event_tx,
            shutdown.clone(),
        ));

        (
            Self {
                state: state_rx,
                shutdown,
                task,
            },
            event_rx,
        )
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Stop supervising and wait for the current session to close.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Supervisor task panicked");
        }
    }
}
