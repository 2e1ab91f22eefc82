use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("No API key configured: pass one to the client or set user_api_key on the request")]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request failed: {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Failed to encode request: {0}")]
    Serialization(String),
}

impl ChatError {
    /// HTTP status code of the failed response, if the error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for errors raised before any network I/O was attempted
    pub fn is_config(&self) -> bool {
        matches!(self, ChatError::MissingApiKey | ChatError::Config(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Network(err.to_string())
    }
}

impl From<config::ConfigError> for ChatError {
    fn from(err: config::ConfigError) -> Self {
        ChatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Serialization(err.to_string())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
