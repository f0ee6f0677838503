//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{GoodreadsError, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

pub const DEFAULT_USER_AGENT: &str = concat!("goodreads-core/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for `GoodreadsClient`.
///
/// Deserialisable so a host application can embed it in its own config file;
/// `timeout_secs` is the serialised form of `timeout`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub client_key: String,
    #[serde(default = "default_timeout", rename = "timeout_secs", with = "secs")]
    pub timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(client_key: &str) -> Self {
        Self {
            base_url: default_base_url(),
            client_key: client_key.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Read `GOODREADS_KEY` (required), `GOODREADS_BASE_URL` and
    /// `GOODREADS_TIMEOUT_SECS` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = lookup("GOODREADS_KEY")
            .ok_or_else(|| GoodreadsError::Config("GOODREADS_KEY is not set".to_string()))?;
        let mut config = Self::new(&key);
        if let Some(base_url) = lookup("GOODREADS_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup("GOODREADS_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                GoodreadsError::Config(format!("GOODREADS_TIMEOUT_SECS is not a number: {raw:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()
    }

    /// Check the settings and normalise the base URL.
    pub fn validate(mut self) -> Result<Self> {
        if self.client_key.trim().is_empty() {
            return Err(GoodreadsError::Config("client key cannot be empty".to_string()));
        }
        let base_url = self.base_url.trim_end_matches('/');
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GoodreadsError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        self.base_url = base_url.to_string();
        Ok(self)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
