//! Connection supervision and presence-resolution settings.

use serde::{Deserialize, Serialize};

/// How the reconnect delay evolves across consecutive failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay before the first reconnect attempt, in seconds.
    pub reconnect_delay_secs: u64,
    pub backoff: BackoffMode,
    /// Ceiling for exponential backoff, in seconds.
    pub max_reconnect_delay_secs: u64,
    /// How long to wait for the initial state snapshot after connecting.
    pub snapshot_timeout_secs: u64,
    pub keepalive_interval_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: 5,
            backoff: BackoffMode::Fixed,
            max_reconnect_delay_secs: 60,
            snapshot_timeout_secs: 5,
            keepalive_interval_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Bounded wait for a joining participant's identity, in milliseconds.
    pub resolve_timeout_ms: u64,
    /// Re-check interval while waiting, in milliseconds.
    pub resolve_poll_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: 4000,
            resolve_poll_ms: 100,
        }
    }
}
