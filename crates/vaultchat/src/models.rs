//! These models represent the objects exchanged with the chat endpoint
//!
//! There are two directions to cover:
//! - chat messages and request options, sent from the caller to the endpoint
//! - data-stream protocol lines, sent from the endpoint back to the caller
//!
//! Lines off the wire are first captured as [`chunk::RawChunk`]s, then lifted into
//! [`chunk::StreamChunk`] events, and finally folded into a [`response::ProcessedResponse`].
pub mod chunk;
pub mod message;
pub mod response;
pub mod role;
pub mod tool;
