use std::time::Duration;

use serde::Serialize;

use crate::signal::TransportSignal;

/// Supervision state, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// What the supervisor hands to the relay, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorEvent {
    /// A session is up and its initial snapshot was awaited.
    Connected,
    /// The session that last sent `Connected` is gone.
    Disconnected,
    Signal(TransportSignal),
}

/// Delay between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    Fixed(Duration),
    /// Doubles after each consecutive failure, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::Fixed(Duration::from_secs(5))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub backoff: BackoffPolicy,
    /// How long to wait for the initial-state snapshot before announcing
    /// the connection anyway.
    pub snapshot_timeout: Duration,
    pub keepalive_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            snapshot_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(20),
        }
    }
}
