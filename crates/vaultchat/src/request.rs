use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{ChatError, ChatResult};
use crate::models::message::ChatMessage;

pub const DEFAULT_SLIPPAGE: f64 = 5.0;

/// Slippage categories the endpoint understands, all defaulting to [`DEFAULT_SLIPPAGE`]
pub const SLIPPAGE_CATEGORIES: [&str; 3] = ["lpSlippage", "swapSlippage", "pumpSlippage"];

pub fn default_slippage() -> BTreeMap<String, f64> {
    SLIPPAGE_CATEGORIES
        .iter()
        .map(|name| (name.to_string(), DEFAULT_SLIPPAGE))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub url: String,
}

/// Per-call options; anything left unset falls back to the defaults in [`build_request`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub vault_id: String,
    pub messages: Vec<ChatMessage>,
    pub user_api_key: Option<String>,
    pub external_wallet_address: Option<String>,
    pub slippage_settings: Option<BTreeMap<String, f64>>,
    pub safe_mode: Option<bool>,
    pub current_path: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

impl RequestOptions {
    pub fn new<S: Into<String>>(vault_id: S, messages: Vec<ChatMessage>) -> Self {
        Self {
            vault_id: vault_id.into(),
            messages,
            ..Default::default()
        }
    }

    pub fn with_user_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.user_api_key = Some(key.into());
        self
    }

    pub fn with_wallet<S: Into<String>>(mut self, address: S) -> Self {
        self.external_wallet_address = Some(address.into());
        self
    }

    /// Replace the slippage table entirely
    pub fn with_slippage_settings(mut self, settings: BTreeMap<String, f64>) -> Self {
        self.slippage_settings = Some(settings);
        self
    }

    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = Some(safe_mode);
        self
    }

    pub fn with_current_path<S: Into<String>>(mut self, path: S) -> Self {
        self.current_path = Some(path.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.get_or_insert_with(Vec::new).push(attachment);
        self
    }
}

/// The JSON body posted to the chat endpoint
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub vault_id: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_wallet_address: Option<String>,
    pub slippage_settings: BTreeMap<String, f64>,
    pub safe_mode: bool,
    pub current_path: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl ChatRequest {
    pub fn to_json(&self) -> ChatResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("id", &self.id)
            .field("messages", &self.messages.len())
            .field("vault_id", &self.vault_id)
            .field("api_key", &"<redacted>")
            .field("external_wallet_address", &self.external_wallet_address)
            .field("slippage_settings", &self.slippage_settings)
            .field("safe_mode", &self.safe_mode)
            .field("current_path", &self.current_path)
            .field("attachments", &self.attachments.len())
            .finish()
    }
}

/// Session identifier the endpoint keys a vault's conversation by
pub fn session_id(vault_id: &str) -> String {
    format!("chat-{}", vault_id)
}

/// Build the request body, resolving the key per call before falling back to the client's.
///
/// Performs no I/O; fails with a configuration error when no key is available.
pub fn build_request(
    options: &RequestOptions,
    default_api_key: Option<&str>,
) -> ChatResult<ChatRequest> {
    let api_key = options
        .user_api_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .or(default_api_key.filter(|key| !key.is_empty()))
        .ok_or(ChatError::MissingApiKey)?;

    if options.vault_id.is_empty() {
        return Err(ChatError::Config("vault_id must not be empty".to_string()));
    }

    Ok(ChatRequest {
        id: session_id(&options.vault_id),
        messages: options.messages.clone(),
        vault_id: options.vault_id.clone(),
        api_key: api_key.to_string(),
        external_wallet_address: options.external_wallet_address.clone(),
        slippage_settings: options
            .slippage_settings
            .clone()
            .unwrap_or_else(default_slippage),
        safe_mode: options.safe_mode.unwrap_or(true),
        current_path: options.current_path.clone(),
        attachments: options.attachments.clone().unwrap_or_default(),
    })
}
