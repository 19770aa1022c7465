//! Delivery targets for batches of events.
//!
//! Every sink implements [`Sink`]; the delivery queue never needs to know
//! which variant it is talking to.

mod append_log;
mod webhook;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use gather_common::SinkError;

use crate::event::Event;

pub use append_log::AppendLogSink;
pub use webhook::WebhookSink;

/// Longest response body excerpt kept in a `SinkError::Rejected`.
const MAX_ERROR_BODY: usize = 200;

#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name used in logs and inspection output.
    fn name(&self) -> &str;

    /// Push `batch` (in order) to the external system.
    ///
    /// Delivery is at-least-once: anything reported as undelivered is
    /// retried on the next flush, so consumers that need exactly-once
    /// must deduplicate on `(identifier, kind, timestamp)`.
    async fn deliver(&self, batch: &[Event]) -> Result<(), SinkError>;
}

/// Turn a non-success HTTP response into a `SinkError`.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let text = response.text().await.unwrap_or_default();
    Err(SinkError::Rejected {
        status: status.as_u16(),
        body: text.chars().take(MAX_ERROR_BODY).collect(),
    })
}

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, SinkError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SinkError::Network(format!("failed to build HTTP client: {e}")))
}
