use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures on the upstream session connection. All of them are
/// recoverable through the supervisor's reconnect loop.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("connect timed out after {0}s")]
    ConnectTimeout(u64),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection closed")]
    Closed,

    #[error("keepalive failed: {0}")]
    Keepalive(String),
}

/// A sink could not deliver some or all of a batch.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Only the events at `failed` (indices into the batch) were not
    /// delivered; the rest reached the sink.
    #[error("{} of {total} events failed: {reason}", .failed.len())]
    Partial {
        failed: Vec<usize>,
        total: usize,
        reason: String,
    },
}

impl SinkError {
    /// Indices of the batch that must be retried, ascending and unique.
    pub fn undelivered(&self, batch_len: usize) -> Vec<usize> {
        match self {
            SinkError::Partial { failed, .. } => {
                let mut idx: Vec<usize> =
                    failed.iter().copied().filter(|i| *i < batch_len).collect();
                idx.sort_unstable();
                idx.dedup();
                idx
            }
            _ => (0..batch_len).collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("missing field 'space_id'".into());
        assert_eq!(
            err.to_string(),
            "config validation error: missing field 'space_id'"
        );
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::ConnectTimeout(15);
        assert_eq!(err.to_string(), "connect timed out after 15s");

        let err = TransportError::Protocol("bad frame".into());
        assert_eq!(err.to_string(), "protocol error: bad frame");
    }

    #[test]
    fn sink_error_display() {
        let err = SinkError::Rejected {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");

        let err = SinkError::Partial {
            failed: vec![0, 2],
            total: 3,
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "2 of 3 events failed: timeout");
    }

    #[test]
    fn partial_failure_only_retries_named_events() {
        let err = SinkError::Partial {
            failed: vec![2, 7, 1, 2],
            total: 3,
            reason: "x".into(),
        };
        assert_eq!(err.undelivered(3), vec![1, 2]);
    }

    #[test]
    fn whole_batch_failure_retries_everything() {
        let err = SinkError::Network("refused".into());
        assert_eq!(err.undelivered(3), vec![0, 1, 2]);
    }

    #[test]
    fn relay_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: RelayError = config_err.into();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn relay_error_from_sink() {
        let sink_err = SinkError::Network("failed to build HTTP client".into());
        let err: RelayError = sink_err.into();
        assert!(matches!(err, RelayError::Sink(_)));
        assert_eq!(err.to_string(), "network error: failed to build HTTP client");
    }

    #[test]
    fn relay_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: RelayError = io_err.into();
        assert!(matches!(err, RelayError::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }
}
