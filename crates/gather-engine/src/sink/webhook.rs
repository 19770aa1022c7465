//! Webhook sink: one POST per event.

use std::time::Duration;

use async_trait::async_trait;
use gather_common::SinkError;
use serde::Serialize;
use tracing::{debug, warn};

use super::{check_response, http_client, Sink};
use crate::event::{Event, EventKind};

/// JSON body sent for each event.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WebhookPayload<'a> {
    pub identifier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durable_id: Option<&'a str>,
    pub kind: EventKind,
    pub timestamp: String,
}

impl<'a> WebhookPayload<'a> {
    pub(crate) fn from_event(event: &'a Event) -> Self {
        Self {
            identifier: event.session_id.as_str(),
            identity_name: event.identity.known_name(),
            durable_id: event.identity.durable_id.as_deref(),
            kind: event.kind,
            timestamp: event.timestamp_iso(),
        }
    }
}

pub struct WebhookSink {
    http: reqwest::Client,
    url: String,
}

impl std::fmt::Debug for WebhookSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSink")
            .field("url", &"[REDACTED]")
            .finish()
    }
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        Ok(Self {
            http: http_client(timeout)?,
            url: url.into(),
        })
    }

    async fn send_one(&self, event: &Event) -> Result<(), SinkError> {
        let response = self
            .http
            .post(&self.url)
            .json(&WebhookPayload::from_event(event))
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        check_response(response).await
    }
}

#[async_trait]
impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    /// Every event is attempted even after a failure; only the events that
    /// failed are reported back for retry.
    async fn deliver(&self, batch: &[Event]) -> Result<(), SinkError> {
        let mut failed = Vec::new();
        let mut last_error = None;

        for (i, event) in batch.iter().enumerate() {
            match self.send_one(event).await {
                Ok(()) => {
                    debug!(session = %event.session_id, kind = event.kind.as_str(), "Webhook delivered");
                }
                Err(e) => {
                    warn!(session = %event.session_id, error = %e, "Webhook send failed");
                    failed.push(i);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            None => Ok(()),
            Some(e) => Err(SinkError::Partial {
                failed,
                total: batch.len(),
                reason: e.to_string(),
            }),
        }
    }
}
