//! Sink configuration types.

use serde::{Deserialize, Serialize};

/// Low-latency webhook sink: one POST per event.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    /// Target URL. Usually supplied via `PIPEDREAM_WEBHOOK_URL`.
    pub url: String,
    pub flush_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Webhook URLs embed their own secret path.
        f.debug_struct("WebhookConfig")
            .field("enabled", &self.enabled)
            .field("url", &if self.url.is_empty() { "" } else { "[REDACTED]" })
            .field("flush_interval_secs", &self.flush_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: String::new(),
            flush_interval_secs: 10,
            request_timeout_secs: 10,
        }
    }
}

/// Spreadsheet-style append log: one bulk append per batch.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppendLogConfig {
    pub enabled: bool,
    /// Append endpoint URL.
    pub url: String,
    /// Named table (sheet range) rows are appended to.
    pub table: String,
    /// Optional bearer token. Usually supplied via `APPEND_LOG_TOKEN`.
    pub token: Option<String>,
    /// Append the display name as a fourth column.
    pub include_name: bool,
    pub flush_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for AppendLogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppendLogConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("table", &self.table)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("include_name", &self.include_name)
            .field("flush_interval_secs", &self.flush_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for AppendLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            table: "Presence".into(),
            token: None,
            include_name: true,
            flush_interval_secs: 300,
            request_timeout_secs: 30,
        }
    }
}
