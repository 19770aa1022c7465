//! Spreadsheet-style append log: one bulk append per batch.

use std::time::Duration;

use async_trait::async_trait;
use gather_common::SinkError;
use serde::Serialize;
use tracing::debug;

use super::{check_response, http_client, Sink};
use crate::event::Event;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppendRequest<'a> {
    pub range: &'a str,
    pub major_dimension: &'static str,
    pub values: Vec<Vec<String>>,
}

pub struct AppendLogSink {
    http: reqwest::Client,
    url: String,
    table: String,
    token: Option<String>,
    include_name: bool,
}

impl std::fmt::Debug for AppendLogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppendLogSink")
            .field("url", &self.url)
            .field("table", &self.table)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("include_name", &self.include_name)
            .finish()
    }
}

impl AppendLogSink {
    pub fn new(
        url: impl Into<String>,
        table: impl Into<String>,
        token: Option<String>,
        include_name: bool,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        Ok(Self {
            http: http_client(timeout)?,
            url: url.into(),
            table: table.into(),
            token,
            include_name,
        })
    }

    /// `[identifier, kind, timestamp]`, plus the display name if configured.
    pub(crate) fn row(&self, event: &Event) -> Vec<String> {
        let mut row = vec![
            event.session_id.to_string(),
            event.kind.as_str().to_string(),
            event.timestamp_iso(),
        ];
        if self.include_name {
            row.push(event.identity.display_name.clone());
        }
        row
    }
}

#[async_trait]
impl Sink for AppendLogSink {
    fn name(&self) -> &str {
        "append_log"
    }

    /// All-or-nothing: the remote append either takes every row or none.
    async fn deliver(&self, batch: &[Event]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let body = AppendRequest {
            range: &self.table,
            major_dimension: "ROWS",
            values: batch.iter().map(|e| self.row(e)).collect(),
        };

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        check_response(response).await?;

        debug!(table = %self.table, rows = batch.len(), "Appended rows");
        Ok(())
    }
}
