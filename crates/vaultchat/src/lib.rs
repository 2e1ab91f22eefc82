//! Streaming client for a vault-scoped chat agent endpoint.
//!
//! The endpoint answers with newline-delimited lines of the form `<prefix>:<payload>`.
//! [`client::ChatClient`] exposes the reply at three levels: raw chunks, semantic
//! [`models::chunk::StreamChunk`] events, or one aggregated
//! [`models::response::ProcessedResponse`].
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod request;
pub mod stream;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use crate::client::{CallOptions, ChatClient, ChatOutput, Chunk, ChunkSource};
pub use crate::config::ClientConfig;
pub use crate::errors::{ChatError, ChatResult};
pub use crate::models::chunk::{ChunkKind, RawChunk, StreamChunk};
pub use crate::models::message::ChatMessage;
pub use crate::models::response::ProcessedResponse;
pub use crate::request::RequestOptions;
