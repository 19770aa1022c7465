//! Translate loaded configuration into engine components.

use std::sync::Arc;
use std::time::Duration;

use gather_common::SinkError;
use gather_config::{BackoffMode, RelayConfig};
use gather_engine::{
    AppendLogSink, BackoffPolicy, ResolveSettings, SinkLane, SupervisorConfig, WebhookSink,
};

pub fn supervisor_config(config: &RelayConfig) -> SupervisorConfig {
    let s = &config.supervisor;
    let base = Duration::from_secs(s.reconnect_delay_secs);
    let backoff = match s.backoff {
        BackoffMode::Fixed => BackoffPolicy::Fixed(base),
        BackoffMode::Exponential => BackoffPolicy::Exponential {
            base,
            max: Duration::from_secs(s.max_reconnect_delay_secs),
        },
    };
    SupervisorConfig {
        backoff,
        snapshot_timeout: Duration::from_secs(s.snapshot_timeout_secs),
        keepalive_interval: Duration::from_secs(s.keepalive_interval_secs),
    }
}

pub fn resolve_settings(config: &RelayConfig) -> ResolveSettings {
    ResolveSettings {
        timeout: Duration::from_millis(config.presence.resolve_timeout_ms),
        poll_interval: Duration::from_millis(config.presence.resolve_poll_ms),
    }
}

/// One lane per enabled sink, webhook first.
pub fn build_lanes(config: &RelayConfig) -> Result<Vec<SinkLane>, SinkError> {
    let mut lanes = Vec::new();

    let webhook = &config.webhook;
    if webhook.enabled {
        let sink = WebhookSink::new(
            webhook.url.clone(),
            Duration::from_secs(webhook.request_timeout_secs),
        )?;
        lanes.push(SinkLane::new(
            Arc::new(sink),
            Duration::from_secs(webhook.flush_interval_secs),
        ));
    }

    let log = &config.append_log;
    if log.enabled {
        let sink = AppendLogSink::new(
            log.url.clone(),
            log.table.clone(),
            log.token.clone(),
            log.include_name,
            Duration::from_secs(log.request_timeout_secs),
        )?;
        lanes.push(SinkLane::new(
            Arc::new(sink),
            Duration::from_secs(log.flush_interval_secs),
        ));
    }

    Ok(lanes)
}
