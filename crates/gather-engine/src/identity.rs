use std::fmt;

use serde::{Deserialize, Serialize};

/// Display name used when a participant's identity never resolved.
pub const UNKNOWN_NAME: &str = "unknown";

/// Transport-assigned participant handle, valid for one connection only.
///
/// Upstream may send it as a JSON string or number; both normalize to the
/// same string form so `42` and `"42"` address the same participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extract an identifier from a JSON value. Empty strings, fractional
    /// numbers and non-scalar values are rejected.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|v| v.to_string())
                .or_else(|| n.as_i64().map(|v| v.to_string()))
                .map(Self),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<u64> for SessionId {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

/// Durable participant attributes, independent of connection epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub durable_id: Option<String>,
    pub display_name: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self::unknown()
    }
}

impl Identity {
    pub fn unknown() -> Self {
        Self {
            durable_id: None,
            display_name: UNKNOWN_NAME.to_string(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            durable_id: None,
            display_name: name.into(),
        }
    }

    pub fn with_durable_id(mut self, id: impl Into<String>) -> Self {
        self.durable_id = Some(id.into());
        self
    }

    /// A display name other than the sentinel is known.
    pub fn is_resolved(&self) -> bool {
        !self.display_name.is_empty() && self.display_name != UNKNOWN_NAME
    }

    /// The display name, or `None` while it is still the sentinel.
    pub fn known_name(&self) -> Option<&str> {
        self.is_resolved().then_some(self.display_name.as_str())
    }

    /// Combine two partial views, preferring resolved fields from `newer`.
    pub fn merge(&self, newer: &Identity) -> Identity {
        Identity {
            durable_id: newer.durable_id.clone().or_else(|| self.durable_id.clone()),
            display_name: if newer.is_resolved() {
                newer.display_name.clone()
            } else {
                self.display_name.clone()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_string_ids_normalize_alike() {
        assert_eq!(SessionId::from_json(&json!(42)), Some(SessionId::from("42")));
        assert_eq!(SessionId::from_json(&json!("42")), Some(SessionId::from(42u64)));
        assert_eq!(SessionId::from_json(&json!(" 7 ")), Some(SessionId::from("7")));
    }

    #[test]
    fn rejects_unusable_ids() {
        assert_eq!(SessionId::from_json(&json!("")), None);
        assert_eq!(SessionId::from_json(&json!(1.5)), None);
        assert_eq!(SessionId::from_json(&json!(null)), None);
        assert_eq!(SessionId::from_json(&json!({"id": 1})), None);
    }

    #[test]
    fn unknown_identity_is_unresolved() {
        let id = Identity::unknown();
        assert!(!id.is_resolved());
        assert_eq!(id.known_name(), None);
        assert_eq!(id.display_name, "unknown");
    }

    #[test]
    fn merge_keeps_resolved_fields() {
        let old = Identity::named("Ada").with_durable_id("u-1");
        let newer = Identity::unknown();
        let merged = old.merge(&newer);
        assert_eq!(merged.display_name, "Ada");
        assert_eq!(merged.durable_id.as_deref(), Some("u-1"));

        let renamed = old.merge(&Identity::named("Ada L."));
        assert_eq!(renamed.display_name, "Ada L.");
        assert_eq!(renamed.durable_id.as_deref(), Some("u-1"));
    }
}
