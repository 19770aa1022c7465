//! Configuration schema for the relay.
//!
//! Every section uses `#[serde(default)]` so a partial config file only
//! needs to name the values it overrides.

mod delivery;
mod server;
mod supervisor;
mod upstream;

pub use delivery::{AppendLogConfig, WebhookConfig};
pub use server::{LoggingConfig, ServerConfig};
pub use supervisor::{BackoffMode, PresenceConfig, SupervisorConfig};
pub use upstream::UpstreamConfig;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub upstream: UpstreamConfig,
    pub supervisor: SupervisorConfig,
    pub presence: PresenceConfig,
    pub webhook: WebhookConfig,
    pub append_log: AppendLogConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Whether at least one sink is switched on.
    pub fn has_sink(&self) -> bool {
        self.webhook.enabled || self.append_log.enabled
    }
}
