//! Client configuration

use std::time::Duration;

/// Public WaifuVault instance
pub const DEFAULT_BASE_URL: &str = "https://waifuvault.moe";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Service base URL, without the `/rest` suffix
    pub base_url: String,
    /// Connect timeout applied to every request
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(60),
            user_agent: format!("waifuvault-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Build a config from `WAIFUVAULT_BASE_URL` and
    /// `WAIFUVAULT_CONNECT_TIMEOUT_SECS`, using defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("WAIFUVAULT_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(secs) = std::env::var("WAIFUVAULT_CONNECT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.connect_timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(
                    "Ignoring invalid WAIFUVAULT_CONNECT_TIMEOUT_SECS value: {}",
                    secs
                ),
            }
        }

        config
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Root of the REST API
    pub fn rest_url(&self) -> String {
        format!("{}/rest", self.base_url())
    }

    /// Public direct-access URL for a stored file
    pub fn file_url(&self, filename: &str) -> String {
        format!("{}/f/{}", self.base_url(), filename)
    }
}
