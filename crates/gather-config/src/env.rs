//! Environment-variable overrides for secrets and deployment-specific values.

use crate::schema::RelayConfig;
use tracing::debug;

pub const GATHER_API_KEY: &str = "GATHER_API_KEY";
pub const SPACE_ID: &str = "SPACE_ID";
pub const WEBHOOK_URL: &str = "PIPEDREAM_WEBHOOK_URL";
pub const APPEND_LOG_TOKEN: &str = "APPEND_LOG_TOKEN";
pub const INSPECT_TOKEN: &str = "RELAY_INSPECT_TOKEN";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    apply_overrides_with(config, |key| std::env::var(key).ok());
}

/// Apply overrides using an arbitrary lookup. Empty values are ignored.
pub fn apply_overrides_with<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(GATHER_API_KEY) {
        debug!(var = GATHER_API_KEY, "env override");
        config.upstream.api_key = v;
    }
    if let Some(v) = get(SPACE_ID) {
        debug!(var = SPACE_ID, "env override");
        config.upstream.space_id = v;
    }
    if let Some(v) = get(WEBHOOK_URL) {
        debug!(var = WEBHOOK_URL, "env override");
        config.webhook.url = v;
    }
    if let Some(v) = get(APPEND_LOG_TOKEN) {
        debug!(var = APPEND_LOG_TOKEN, "env override");
        config.append_log.token = Some(v);
    }
    if let Some(v) = get(INSPECT_TOKEN) {
        debug!(var = INSPECT_TOKEN, "env override");
        config.server.inspect_token = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_secrets() {
        let mut config = RelayConfig::default();
        apply_overrides_with(
            &mut config,
            lookup(&[
                (GATHER_API_KEY, "key-1"),
                (SPACE_ID, "space\\room"),
                (WEBHOOK_URL, "https://hook.example/x"),
                (INSPECT_TOKEN, "s3cret"),
            ]),
        );
        assert_eq!(config.upstream.api_key, "key-1");
        assert_eq!(config.upstream.space_id, "space\\room");
        assert_eq!(config.webhook.url, "https://hook.example/x");
        assert_eq!(config.server.inspect_token.as_deref(), Some("s3cret"));
        assert!(config.append_log.token.is_none());
    }

    #[test]
    fn empty_values_do_not_clobber_file_values() {
        let mut config = RelayConfig::default();
        config.upstream.api_key = "from-file".into();
        apply_overrides_with(&mut config, lookup(&[(GATHER_API_KEY, "  ")]));
        assert_eq!(config.upstream.api_key, "from-file");
    }
}
