//! Full configuration validation.
//!
//! `validate` checks numeric ranges and URL shapes and is safe to run on
//! any parsed config. `validate_required` additionally insists on the
//! credentials and endpoints needed to actually run the relay.

mod helpers;


use crate::schema::{BackoffMode, RelayConfig};
use gather_common::ConfigError;

use helpers::{require_non_empty, require_scheme, validate_range};

/// Run all range validations on a config, collecting all errors.
pub fn validate(config: &RelayConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_upstream(&mut errors, config);
    validate_supervisor(&mut errors, config);
    validate_presence(&mut errors, config);
    validate_sinks(&mut errors, config);

    finish(errors)
}

/// Check that everything needed to run is present. Runs `validate` first.
pub fn validate_required(config: &RelayConfig) -> Result<(), ConfigError> {
    validate(config)?;

    let mut errors: Vec<String> = Vec::new();
    require_non_empty(&mut errors, "upstream.api_key", &config.upstream.api_key);
    require_non_empty(&mut errors, "upstream.space_id", &config.upstream.space_id);
    if config.webhook.enabled {
        require_non_empty(&mut errors, "webhook.url", &config.webhook.url);
    }
    if config.append_log.enabled {
        require_non_empty(&mut errors, "append_log.url", &config.append_log.url);
        require_non_empty(&mut errors, "append_log.table", &config.append_log.table);
    }
    if !config.has_sink() {
        errors.push("at least one of webhook or append_log must be enabled".into());
    }

    finish(errors)
}

fn finish(errors: Vec<String>) -> Result<(), ConfigError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_upstream(errors: &mut Vec<String>, config: &RelayConfig) {
    require_scheme(errors, "upstream.url", &config.upstream.url, &["ws://", "wss://"]);
    validate_range(
        errors,
        "upstream.connect_timeout_secs",
        config.upstream.connect_timeout_secs,
        1,
        120,
    );
}

fn validate_supervisor(errors: &mut Vec<String>, config: &RelayConfig) {
    let s = &config.supervisor;
    validate_range(errors, "supervisor.reconnect_delay_secs", s.reconnect_delay_secs, 1, 300);
    validate_range(errors, "supervisor.snapshot_timeout_secs", s.snapshot_timeout_secs, 1, 60);
    validate_range(
        errors,
        "supervisor.keepalive_interval_secs",
        s.keepalive_interval_secs,
        1,
        300,
    );
    if s.backoff == BackoffMode::Exponential && s.max_reconnect_delay_secs < s.reconnect_delay_secs {
        errors.push(format!(
            "supervisor.max_reconnect_delay_secs = {} is below reconnect_delay_secs = {}",
            s.max_reconnect_delay_secs, s.reconnect_delay_secs
        ));
    }
}

fn validate_presence(errors: &mut Vec<String>, config: &RelayConfig) {
    let p = &config.presence;
    validate_range(errors, "presence.resolve_timeout_ms", p.resolve_timeout_ms, 100, 30_000);
    validate_range(errors, "presence.resolve_poll_ms", p.resolve_poll_ms, 10, 5_000);
}

fn validate_sinks(errors: &mut Vec<String>, config: &RelayConfig) {
    let w = &config.webhook;
    require_scheme(errors, "webhook.url", &w.url, &["http://", "https://"]);
    validate_range(errors, "webhook.flush_interval_secs", w.flush_interval_secs, 1, 3600);
    validate_range(errors, "webhook.request_timeout_secs", w.request_timeout_secs, 1, 120);

    let a = &config.append_log;
    require_scheme(errors, "append_log.url", &a.url, &["http://", "https://"]);
    validate_range(errors, "append_log.flush_interval_secs", a.flush_interval_secs, 1, 3600);
    validate_range(errors, "append_log.request_timeout_secs", a.request_timeout_secs, 1, 120);
}
