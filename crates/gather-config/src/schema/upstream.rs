use gather_common::ConfigError;
use serde::{Deserialize, Serialize};

/// Upstream session transport settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// WebSocket endpoint, without query string.
    pub url: String,
    /// API key appended as `apiKey`. Usually supplied via `GATHER_API_KEY`.
    pub api_key: String,
    /// Space to observe, appended as `spaceId`. Usually supplied via `SPACE_ID`.
    pub space_id: String,
    /// Upper bound on a single connect attempt, in seconds.
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("space_id", &self.space_id)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "wss://gather.town/api".into(),
            api_key: String::new(),
            space_id: String::new(),
            connect_timeout_secs: 15,
        }
    }
}

impl UpstreamConfig {
    /// Full connection URL including credentials. Both query values are
    /// percent-encoded; space IDs carry the space name after a backslash.
    pub fn ws_url(&self) -> Result<String, ConfigError> {
        let url = url::Url::parse_with_params(
            &self.url,
            [("apiKey", self.api_key.as_str()), ("spaceId", self.space_id.as_str())],
        )
        .map_err(|e| ConfigError::ValidationError(format!("upstream.url: {e}")))?;
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_encodes_space_names() {
        let config = UpstreamConfig {
            api_key: "k+1".into(),
            space_id: "abc\\My Office & Co".into(),
            ..Default::default()
        };
        let built = config.ws_url().unwrap();
        assert_eq!(
            built,
            "wss://gather.town/api?apiKey=k%2B1&spaceId=abc%5CMy+Office+%26+Co"
        );

        let parsed = url::Url::parse(&built).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apiKey".to_string(), "k+1".to_string()),
                ("spaceId".to_string(), "abc\\My Office & Co".to_string()),
            ]
        );
    }

    #[test]
    fn ws_url_rejects_unparseable_endpoint() {
        let config = UpstreamConfig {
            url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(config.ws_url(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = UpstreamConfig {
            api_key: "super-secret".into(),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
