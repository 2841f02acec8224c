//! Peer directory configuration.

use hyper::Uri;
use std::time::Duration;

use crate::error::ClientError;
use crate::node_api::ACTIVE_PEERS_PATH;

/// Node the shell talks to when none is given.
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:5000";

/// Upper bound on a single fetch cycle.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What a failed fetch does with the last successful list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Last fetch wins: a failure replaces the list entirely.
    #[default]
    Discard,
    /// Keep the last successful list in `FetchState::Failed::previous`.
    Retain,
}

/// Client configuration. The node address is always passed in explicitly.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address of the node, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,

    /// Bound on a single request; expiry is reported as `FetchError::Timeout`.
    pub timeout: Duration,

    pub stale_policy: StalePolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }

    /// Full URI of the active peers endpoint.
    pub fn peers_uri(&self) -> Result<Uri, ClientError> {
        let joined = format!("{}{}", self.base_url.trim_end_matches('/'), ACTIVE_PEERS_PATH);
        let uri: Uri = joined.parse().map_err(|e: hyper::http::uri::InvalidUri| {
            ClientError::InvalidUrl {
                url: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;

        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => return Err(ClientError::UnsupportedScheme(other.to_string())),
            None => {
                return Err(ClientError::InvalidUrl {
                    url: self.base_url.clone(),
                    reason: "missing scheme".to_string(),
                })
            }
        }

        if uri.authority().is_none() {
            return Err(ClientError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "missing host".to_string(),
            });
        }

        Ok(uri)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidTimeout);
        }
        self.peers_uri().map(|_| ())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NODE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            stale_policy: StalePolicy::Discard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.stale_policy, StalePolicy::Discard);
        assert_eq!(
            config.peers_uri().unwrap().to_string(),
            "http://127.0.0.1:5000/getActivePeers"
        );
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let config = ClientConfig::new("http://10.2.0.2:5000/");
        assert_eq!(
            config.peers_uri().unwrap().to_string(),
            "http://10.2.0.2:5000/getActivePeers"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let config = ClientConfig::new("http://localhost:8080/node");
        assert_eq!(config.peers_uri().unwrap().path(), "/node/getActivePeers");
    }

    #[test]
    fn test_rejects_https() {
        let config = ClientConfig::new("https://localhost:5000");
        assert!(matches!(
            config.validate(),
            Err(ClientError::UnsupportedScheme(scheme)) if scheme == "https"
        ));
    }

    #[test]
    fn test_rejects_missing_scheme() {
        let config = ClientConfig::new("localhost:5000");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = ClientConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ClientError::InvalidTimeout)));
        assert!(config.with_timeout(Duration::from_millis(1)).validate().is_ok());
    }
}
