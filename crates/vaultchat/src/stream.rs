//! The response pipeline: bytes -> lines -> raw chunks -> stream chunks -> response
//!
//! Every stage is a pull-driven [`ChunkStream`]; nothing advances until the consumer asks for
//! the next item, and all per-call state lives inside the stage that owns it.
pub mod aggregator;
pub mod classifier;
pub mod decoder;
pub mod processor;

use futures::stream::{BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::errors::{ChatError, ChatResult};
use crate::models::chunk::{RawChunk, StreamChunk};

pub type ChunkStream<T> = BoxStream<'static, ChatResult<T>>;

/// Items that can stand in for a failure so consumers see it before the error itself
pub trait ErrorChunk {
    fn from_error(err: &ChatError) -> Self;
}

impl ErrorChunk for RawChunk {
    fn from_error(err: &ChatError) -> Self {
        RawChunk::error(err.to_string())
    }
}

impl ErrorChunk for StreamChunk {
    fn from_error(err: &ChatError) -> Self {
        StreamChunk::Error(err.to_string())
    }
}

/// Turn the first `Err` into an error chunk followed by the error, then end the stream
pub fn surface_errors<T>(inner: ChunkStream<T>) -> ChunkStream<T>
where
    T: ErrorChunk + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut inner = inner;
        while let Some(item) = inner.next().await {
            match item {
                Ok(chunk) => yield Ok(chunk),
                Err(err) => {
                    tracing::warn!(error = %err, "Chat stream failed");
                    yield Ok(T::from_error(&err));
                    yield Err(err);
                    break;
                }
            }
        }
    })
}

/// End the stream with [`ChatError::Cancelled`] as soon as `cancel` fires
pub fn with_cancel<T>(inner: ChunkStream<T>, cancel: Option<CancellationToken>) -> ChunkStream<T>
where
    T: Send + 'static,
{
    let Some(token) = cancel else {
        return inner;
    };

    Box::pin(async_stream::stream! {
        let mut inner = inner;
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                item = inner.next() => Some(item),
            };

            match next {
                None => {
                    tracing::debug!("Chat stream cancelled");
                    yield Err(ChatError::Cancelled);
                    break;
                }
                Some(Some(item)) => yield item,
                Some(None) => break,
            }
        }
    })
}

/// Replay already-received wire lines as raw chunks, e.g. from a recorded session
pub fn replay_lines<I, S>(lines: I) -> ChunkStream<RawChunk>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let chunks: Vec<ChatResult<RawChunk>> = lines
        .into_iter()
        .filter_map(|line| classifier::classify(line.as_ref()))
        .map(Ok)
        .collect();
    futures::stream::iter(chunks).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_surface_errors_emits_error_chunk_then_error() {
        let inner: ChunkStream<StreamChunk> = stream::iter(vec![
            Ok(StreamChunk::Text("partial".into())),
            Err(ChatError::Network("connection reset".into())),
            Ok(StreamChunk::Text("never seen".into())),
        ])
        .boxed();

        let items: Vec<_> = surface_errors(inner).collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Ok(StreamChunk::Text("partial".into())));
        assert_eq!(
            items[1],
            Ok(StreamChunk::Error("Network error: connection reset".into()))
        );
        assert_eq!(items[2], Err(ChatError::Network("connection reset".into())));
    }

    #[tokio::test]
    async fn test_with_cancel_ends_pending_stream() {
        let token = CancellationToken::new();
        let inner: ChunkStream<StreamChunk> = stream::pending().boxed();
        let mut cancellable = with_cancel(inner, Some(token.clone()));

        token.cancel();
        assert_eq!(cancellable.next().await, Some(Err(ChatError::Cancelled)));
        assert_eq!(cancellable.next().await, None);
    }

    #[tokio::test]
    async fn test_with_cancel_passes_items_through() {
        let token = CancellationToken::new();
        let inner = replay_lines(["0:\"a\"", "0:\"b\""]);
        let items: Vec<_> = with_cancel(inner, Some(token)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.is_ok()));
    }

    #[test]
    fn test_replay_lines_skips_empty_lines() {
        let chunks: Vec<_> =
            tokio_test::block_on(replay_lines(["0:\"a\"", "", "f:{}"]).collect::<Vec<_>>());
        assert_eq!(chunks.len(), 2);
    }
}
