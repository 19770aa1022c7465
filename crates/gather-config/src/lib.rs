//! gather-relay configuration system.
//!
//! TOML-based configuration with environment overrides for secrets and
//! full validation. All sections use sensible defaults so partial configs
//! work out of the box.

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    AppendLogConfig, BackoffMode, LoggingConfig, PresenceConfig, RelayConfig, ServerConfig,
    SupervisorConfig, UpstreamConfig, WebhookConfig, CONFIG_SCHEMA_VERSION,
};

use gather_common::ConfigError;
use std::path::Path;

/// Load config from `path` (or the platform default), apply environment
/// overrides, and require everything the relay needs to run.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(p) => toml_loader::load_from_path(p)?,
        None => toml_loader::load_default()?,
    };
    env::apply_env_overrides(&mut config);
    validation::validate_required(&config)?;
    Ok(config)
}

/// Serialize a config to pretty-printed JSON with secrets removed.
pub fn config_to_json(config: &RelayConfig) -> String {
    let mut redacted = config.clone();
    if !redacted.upstream.api_key.is_empty() {
        redacted.upstream.api_key = "[REDACTED]".into();
    }
    if !redacted.webhook.url.is_empty() {
        redacted.webhook.url = "[REDACTED]".into();
    }
    redacted.append_log.token = redacted.append_log.token.map(|_| "[REDACTED]".into());
    redacted.server.inspect_token = redacted.server.inspect_token.map(|_| "[REDACTED]".into());
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
