//! Connection configuration for the search backend client.

use std::fmt;
use std::time::Duration;

/// Default backend URL.
pub const DEFAULT_URL: &str = "http://localhost:9200";

/// Connection settings for [`ElasticsearchClient`](crate::ElasticsearchClient).
///
/// Built with chained `with_*` calls; every setting except the URL is
/// optional. Basic credentials and an API key may both be set, in which case
/// both are sent and the backend decides which one wins.
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend URL, e.g. `https://localhost:9200`.
    pub url: String,
    /// PEM-encoded CA certificate used to validate the backend's TLS certificate.
    pub ca_certificate: Option<Vec<u8>>,
    /// Username and password for basic authentication.
    pub credentials: Option<(String, String)>,
    /// Encoded API key sent as `Authorization: ApiKey <key>`.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("ca_certificate", &self.ca_certificate.is_some())
            .field(
                "username",
                &self.credentials.as_ref().map(|(user, _)| user.as_str()),
            )
            .field("api_key", &self.api_key.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config for the given backend URL with no TLS or auth settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ca_certificate: None,
            credentials: None,
            api_key: None,
            timeout: None,
        }
    }

    /// Trust the given PEM-encoded CA certificate.
    pub fn with_ca_certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_certificate = Some(pem.into());
        self
    }

    /// Authenticate with a username and password.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Authenticate with an encoded API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value of the `Authorization` header for the configured API key.
    pub fn api_key_header(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| format!("ApiKey {}", key))
    }
}
