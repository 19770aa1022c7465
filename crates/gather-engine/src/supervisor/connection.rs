//! The supervision loop: connect, run a session, back off, repeat.

use std::sync::Arc;

use gather_common::TransportError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backoff::Backoff;
use super::types::{ConnectionState, SupervisorConfig, SupervisorEvent};
use crate::transport::{Connector, TransportSession};

/// Why a session stopped.
enum SessionEnd {
    Shutdown,
    /// Receiver of supervisor events dropped; nobody is listening.
    Abandoned,
    /// Failed before `Connected` was published.
    Failed(TransportError),
    /// Lost after `Connected`; `None` is a clean close.
    Lost(Option<TransportError>),
}

pub(crate) async fn supervise(
    connector: Arc<dyn Connector>,
    config: SupervisorConfig,
    state: watch::Sender<ConnectionState>,
    events: mpsc::Sender<SupervisorEvent>,
    shutdown: CancellationToken,
) {
    let mut backoff = Backoff::new(config.backoff);

    loop {
        state.send_replace(ConnectionState::Connecting);

        let attempt = tokio::select! {
            _ = shutdown.cancelled() => break,
            attempt = connector.connect() => attempt,
        };

        match attempt {
            Ok(mut session) => {
                backoff.reset();
                let end = run_session(session.as_mut(), &config, &state, &events, &shutdown).await;
                session.close().await;
                state.send_replace(ConnectionState::Disconnected);

                match end {
                    SessionEnd::Shutdown | SessionEnd::Abandoned => break,
                    SessionEnd::Failed(e) => {
                        warn!(error = %e, "Session failed before initial state");
                    }
                    SessionEnd::Lost(reason) => {
                        match reason {
                            Some(e) => warn!(error = %e, "Connection lost"),
                            None => info!("Connection closed by upstream"),
                        }
                        if events.send(SupervisorEvent::Disconnected).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                state.send_replace(ConnectionState::Disconnected);
                warn!(error = %e, "Connect attempt failed");
            }
        }

        let delay = backoff.next_delay();
        info!(delay_ms = delay.as_millis() as u64, "Reconnecting after delay");
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    state.send_replace(ConnectionState::Disconnected);
    info!("Supervisor stopped");
}

async fn run_session(
    session: &mut dyn TransportSession,
    config: &SupervisorConfig,
    state: &watch::Sender<ConnectionState>,
    events: &mpsc::Sender<SupervisorEvent>,
    shutdown: &CancellationToken,
) -> SessionEnd {
    let waited = tokio::select! {
        _ = shutdown.cancelled() => return SessionEnd::Shutdown,
        waited = tokio::time::timeout(config.snapshot_timeout, session.await_snapshot()) => waited,
    };
    match waited {
        Ok(Ok(())) => debug!("Initial state received"),
        Ok(Err(e)) => return SessionEnd::Failed(e),
        Err(_elapsed) => warn!(
            timeout_ms = config.snapshot_timeout.as_millis() as u64,
            "No initial state in time, proceeding without it"
        ),
    }

    state.send_replace(ConnectionState::Connected);
    if events.send(SupervisorEvent::Connected).await.is_err() {
        return SessionEnd::Abandoned;
    }
    info!("Connected to upstream");

    let period = config.keepalive_interval;
    let mut keepalive = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return SessionEnd::Shutdown,
            _ = keepalive.tick() => {
                // Failures surface through the read side if the link is dead.
                if let Err(e) = session.keepalive().await {
                    warn!(error = %e, "Keepalive failed");
                }
            }
            next = session.next_signal() => match next {
                Some(Ok(signal)) => {
                    if events.send(SupervisorEvent::Signal(signal)).await.is_err() {
                        return SessionEnd::Abandoned;
                    }
                }
                Some(Err(e)) => return SessionEnd::Lost(Some(e)),
                None => return SessionEnd::Lost(None),
            },
        }
    }
}
