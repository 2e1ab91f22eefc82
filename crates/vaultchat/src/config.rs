use config::{Config, Environment};
use serde::Deserialize;
use std::fmt;
use url::Url;

use crate::errors::{ChatError, ChatResult};

/// Path of the chat endpoint, relative to the configured base url
pub const CHAT_PATH: &str = "/api/chat";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Client-level settings, fixed once a client is built
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub user_key: Option<String>,
    #[serde(default)]
    pub user_secret: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

impl ClientConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            user_key: None,
            user_secret: None,
            debug: false,
        }
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Secondary credential pair sent as `X-User-Key` / `X-User-Secret`
    pub fn with_user_credentials<K, S>(mut self, user_key: K, user_secret: S) -> Self
    where
        K: Into<String>,
        S: Into<String>,
    {
        self.user_key = Some(user_key.into());
        self.user_secret = Some(user_secret.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load from `VAULTCHAT_*` environment variables on top of the defaults
    pub fn from_env() -> ChatResult<Self> {
        let config = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("debug", false)?
            .add_source(
                Environment::with_prefix("VAULTCHAT")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = config.try_deserialize()?;
        settings.chat_url()?;
        Ok(settings)
    }

    /// Full url of the chat endpoint
    pub fn chat_url(&self) -> ChatResult<Url> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), CHAT_PATH);
        Url::parse(&url).map_err(|e| {
            ChatError::Config(format!("invalid base url {:?}: {}", self.base_url, e))
        })
    }

    /// The user credential pair, only when both halves are configured
    pub fn user_credentials(&self) -> Option<(&str, &str)> {
        match (self.user_key.as_deref(), self.user_secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key, secret))
            }
            _ => None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// Keep credentials out of logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("user_key", &redact(&self.user_key))
            .field("user_secret", &redact(&self.user_secret))
            .field("debug", &self.debug)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
