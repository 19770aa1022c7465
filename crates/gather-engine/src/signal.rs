//! Raw upstream signals and identifier/identity extraction.
//!
//! The transport classifies frames by kind but leaves payload
//! interpretation to the normalizer, so a malformed payload is dropped
//! there without affecting the connection.

use serde_json::Value;

use crate::identity::{Identity, SessionId};

/// Keys that may carry the session-scoped identifier, in lookup order.
const ID_KEYS: &[&str] = &["userId", "sessionId", "id"];
/// Keys that may carry the durable participant id.
const DURABLE_KEYS: &[&str] = &["playerId", "durableId", "uid"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    #[error("signal has no identifier")]
    MissingIdentifier,

    #[error("signal identifier is not usable: {0}")]
    InvalidIdentifier(String),
}

/// An undecoded upstream payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSignal(Value);

impl RawSignal {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }

    /// The session-scoped identifier this signal refers to.
    pub fn session_id(&self) -> Result<SessionId, SignalError> {
        let value = ID_KEYS
            .iter()
            .find_map(|k| self.0.get(*k))
            .ok_or(SignalError::MissingIdentifier)?;
        SessionId::from_json(value).ok_or_else(|| SignalError::InvalidIdentifier(value.to_string()))
    }

    /// Whatever identity attributes the payload carries. Missing fields
    /// fall back to the unknown sentinel.
    pub fn identity(&self) -> Identity {
        identity_from(&self.0)
    }

    /// Entries of an initial-state snapshot.
    ///
    /// Accepts either `{"players": {"<id>": {...}}}` or
    /// `{"players": [{"userId": ..., ...}]}`. Entries without a usable
    /// identifier are skipped.
    pub fn snapshot_entries(&self) -> Vec<(SessionId, Identity)> {
        match self.0.get("players") {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(key, info)| {
                    let id = SessionId::from_json(&Value::String(key.clone()))?;
                    Some((id, identity_from(info)))
                })
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|info| {
                    let raw = RawSignal(info.clone());
                    let id = raw.session_id().ok()?;
                    Some((id, raw.identity()))
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn identity_from(value: &Value) -> Identity {
    let mut identity = Identity::unknown();
    if let Some(name) = value
        .get("name")
        .and_then(|n| n.as_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        identity.display_name = name.to_string();
    }
    identity.durable_id = DURABLE_KEYS
        .iter()
        .find_map(|k| value.get(*k))
        .and_then(SessionId::from_json)
        .map(|id| id.as_str().to_string());
    identity
}

/// A classified upstream signal.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    Join(RawSignal),
    Leave(RawSignal),
    IdentityAnnounced(RawSignal),
    /// Initial (or refreshed) state of everyone currently in the space.
    Snapshot(RawSignal),
}
