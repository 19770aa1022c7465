//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# gather-relay configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Secrets are best left to the environment:
#   GATHER_API_KEY, SPACE_ID, PIPEDREAM_WEBHOOK_URL,
#   APPEND_LOG_TOKEN, RELAY_INSPECT_TOKEN

[upstream]
# url = "wss://gather.town/api"
# connect_timeout_secs = 15      # 1-120

[supervisor]
# reconnect_delay_secs = 5       # 1-300
# backoff = "fixed"              # "fixed" | "exponential"
# max_reconnect_delay_secs = 60  # >= reconnect_delay_secs
# snapshot_timeout_secs = 5      # 1-60
# keepalive_interval_secs = 20   # 1-300

[presence]
# resolve_timeout_ms = 4000      # 100-30000
# resolve_poll_ms = 100          # 10-5000

[webhook]
# enabled = true
# url = ""
# flush_interval_secs = 10       # 1-3600
# request_timeout_secs = 10      # 1-120

[append_log]
# enabled = false
# url = ""
# table = "Presence"
# include_name = true
# flush_interval_secs = 300      # 1-3600
# request_timeout_secs = 30      # 1-120

[server]
# enabled = true
# host = "0.0.0.0"
# port = 8080

[logging]
# level = "info"
"##
}
