use futures::stream::{StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::errors::{ChatError, ChatResult};
use crate::models::chunk::{RawChunk, StreamChunk};
use crate::models::response::ProcessedResponse;
use crate::request::{build_request, ChatRequest, RequestOptions};
use crate::stream::aggregator::aggregate;
use crate::stream::classifier::classify_lines;
use crate::stream::decoder::decode_lines;
use crate::stream::processor::process_stream;
use crate::stream::{surface_errors, with_cancel, ChunkStream, ErrorChunk};
use crate::transport::{self, HttpTransport, Transport, TransportRequest};

/// Replacement for everything between the request and the raw chunks.
///
/// Used for deterministic tests and for backends that do not speak HTTP. The chunks it
/// yields go through processing and aggregation exactly like chunks read off the wire.
pub trait ChunkSource: Send + Sync {
    fn open(&self, request: &ChatRequest) -> ChunkStream<RawChunk>;
}

impl<F> ChunkSource for F
where
    F: Fn(&ChatRequest) -> ChunkStream<RawChunk> + Send + Sync,
{
    fn open(&self, request: &ChatRequest) -> ChunkStream<RawChunk> {
        self(request)
    }
}

/// Per-call knobs shared by every entry point
#[derive(Clone, Default)]
pub struct CallOptions {
    /// Skip chunk processing: stream raw chunks, or collect them instead of aggregating
    pub raw: bool,
    pub source: Option<Arc<dyn ChunkSource>>,
    pub cancel: Option<CancellationToken>,
}

impl CallOptions {
    pub fn raw() -> Self {
        Self {
            raw: true,
            ..Default::default()
        }
    }

    pub fn with_source<S: ChunkSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("raw", &self.raw)
            .field("source", &self.source.as_ref().map(|_| "<override>"))
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Item of [`ChatClient::stream`]: semantic events, or raw chunks when processing is off
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Raw(RawChunk),
    Event(StreamChunk),
}

impl Chunk {
    pub fn as_event(&self) -> Option<&StreamChunk> {
        match self {
            Chunk::Event(event) => Some(event),
            Chunk::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&RawChunk> {
        match self {
            Chunk::Raw(raw) => Some(raw),
            Chunk::Event(_) => None,
        }
    }
}

impl ErrorChunk for Chunk {
    fn from_error(err: &ChatError) -> Self {
        Chunk::Event(StreamChunk::from_error(err))
    }
}

/// Result of [`ChatClient::send`]
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutput {
    Processed(ProcessedResponse),
    Raw(Vec<RawChunk>),
}

impl ChatOutput {
    pub fn into_processed(self) -> Option<ProcessedResponse> {
        match self {
            ChatOutput::Processed(response) => Some(response),
            ChatOutput::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<Vec<RawChunk>> {
        match self {
            ChatOutput::Raw(chunks) => Some(chunks),
            ChatOutput::Processed(_) => None,
        }
    }
}

/// Client for a single chat endpoint.
///
/// Holds only immutable configuration; every call allocates its own pipeline state, so one
/// client can serve any number of concurrent calls.
#[derive(Clone)]
pub struct ChatClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> ChatResult<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::new()?))
    }

    /// Build a client that sends through `transport` instead of the default HTTP client
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> ChatResult<Self> {
        config.chat_url()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Every line of the reply as a raw chunk
    pub fn stream_raw(
        &self,
        options: RequestOptions,
        call: CallOptions,
    ) -> ChatResult<ChunkStream<RawChunk>> {
        let chunks = self.open(&options, &call)?;
        Ok(surface_errors(chunks))
    }

    /// Semantic events of the reply, or raw chunks when `call.raw` is set
    pub fn stream(
        &self,
        options: RequestOptions,
        call: CallOptions,
    ) -> ChatResult<ChunkStream<Chunk>> {
        let chunks = self.open(&options, &call)?;
        let chunks = if call.raw {
            chunks.map_ok(Chunk::Raw).boxed()
        } else {
            process_stream(chunks).map_ok(Chunk::Event).boxed()
        };
        Ok(surface_errors(chunks))
    }

    /// Read the whole reply; aggregated, or the raw chunk list when `call.raw` is set
    pub async fn send(
        &self,
        options: RequestOptions,
        call: CallOptions,
    ) -> ChatResult<ChatOutput> {
        if call.raw {
            let raw: Vec<RawChunk> = self.open(&options, &call)?.try_collect().await?;
            return Ok(ChatOutput::Raw(raw));
        }
        Ok(ChatOutput::Processed(self.collect_response(&options, &call).await?))
    }

    /// Read the whole reply into a [`ProcessedResponse`] with default call options
    pub async fn chat(&self, options: RequestOptions) -> ChatResult<ProcessedResponse> {
        self.collect_response(&options, &CallOptions::default()).await
    }

    async fn collect_response(
        &self,
        options: &RequestOptions,
        call: &CallOptions,
    ) -> ChatResult<ProcessedResponse> {
        let chunks = self.open(options, call)?;
        let response = aggregate(process_stream(chunks)).await?;
        tracing::debug!(
            vault_id = %options.vault_id,
            message_id = ?response.message_id,
            tool_calls = response.tool_calls.len(),
            "Chat reply complete"
        );
        Ok(response)
    }

    /// Build the request and start the raw chunk stream, from the override or the transport
    fn open(
        &self,
        options: &RequestOptions,
        call: &CallOptions,
    ) -> ChatResult<ChunkStream<RawChunk>> {
        let request = build_request(options, self.config.api_key.as_deref())?;
        tracing::debug!(
            vault_id = %request.vault_id,
            messages = request.messages.len(),
            overridden = call.source.is_some(),
            "Starting chat request"
        );

        let chunks = match &call.source {
            Some(source) => source.open(&request),
            None => self.wire_chunks(TransportRequest::new(&self.config, &request)?),
        };

        let chunks = if self.config.debug {
            chunks
                .inspect_ok(|chunk| tracing::trace!(raw = %chunk.raw, "Received chunk"))
                .boxed()
        } else {
            chunks
        };

        Ok(with_cancel(chunks, call.cancel.clone()))
    }

    fn wire_chunks(&self, request: TransportRequest) -> ChunkStream<RawChunk> {
        let transport = self.transport.clone();
        Box::pin(async_stream::try_stream! {
            let body = transport::open(transport.as_ref(), request).await?;
            let mut chunks = classify_lines(decode_lines(body));
            while let Some(chunk) = chunks.next().await {
                yield chunk?;
            }
        })
    }
}
