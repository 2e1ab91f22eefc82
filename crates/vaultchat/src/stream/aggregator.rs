use futures::stream::{Stream, StreamExt};

use crate::errors::ChatResult;
use crate::models::chunk::StreamChunk;
use crate::models::response::ProcessedResponse;

/// Folds stream chunks into a [`ProcessedResponse`] in arrival order
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    response: ProcessedResponse,
}

impl ResponseAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: StreamChunk) {
        let response = &mut self.response;
        match chunk {
            StreamChunk::Text(text) => response.content.push_str(&text),
            StreamChunk::MessageId(id) => response.message_id = Some(id),
            StreamChunk::Finish(finish) => {
                if let Some(usage) = finish.usage {
                    response.usage = Some(usage);
                }
            }
            StreamChunk::PathInfo(info) => response.path_info = Some(info),
            StreamChunk::ToolCall(call) => response.tool_calls.push(call),
            StreamChunk::ToolResult(result) => response.tool_results.push(result),
            StreamChunk::ToolCallDelta(_) => {}
            StreamChunk::Unknown(raw) => {
                tracing::debug!(raw = %raw.raw, "Skipping unrecognized chunk");
            }
            StreamChunk::Error(message) => {
                tracing::warn!(%message, "Error chunk in response stream");
            }
        }
    }

    /// The response as folded so far
    pub fn current(&self) -> &ProcessedResponse {
        &self.response
    }

    pub fn finish(self) -> ProcessedResponse {
        self.response
    }
}

/// Drain `chunks` to the end and fold them; the first error aborts without a partial result.
///
/// A finish event does not end aggregation, since multi-step replies finish each step
/// mid-stream. A server that keeps the connection open after its final `d:` line therefore
/// holds this future (and `ChatClient::chat`) open until it closes the body or the call is
/// cancelled.
pub async fn aggregate<S>(chunks: S) -> ChatResult<ProcessedResponse>
where
    S: Stream<Item = ChatResult<StreamChunk>>,
{
    let mut chunks = Box::pin(chunks);
    let mut aggregator = ResponseAggregator::new();

    while let Some(chunk) = chunks.next().await {
        aggregator.push(chunk?);
    }

    Ok(aggregator.finish())
}
