use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::StatusCode;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use crate::errors::{ChatError, ChatResult};
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// A mock transport that answers every request with the same pre-configured body
pub struct MockTransport {
    status: StatusCode,
    reads: Vec<ChatResult<Bytes>>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    released: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Create a mock transport delivering `reads` one body read at a time
    pub fn new<B: Into<Bytes>>(status: StatusCode, reads: Vec<B>) -> Self {
        Self {
            status,
            reads: reads.into_iter().map(|b| Ok(b.into())).collect(),
            requests: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the body read after the configured reads
    pub fn with_read_error(mut self, err: ChatError) -> Self {
        self.reads.push(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of response bodies that have been dropped so far
    pub fn released_bodies(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> ChatResult<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        let body = TrackedBody {
            reads: stream::iter(self.reads.clone()),
            released: self.released.clone(),
        };
        Ok(TransportResponse {
            status: self.status,
            body: body.boxed(),
        })
    }
}

/// Body stream that counts itself as released when dropped
struct TrackedBody {
    reads: stream::Iter<std::vec::IntoIter<ChatResult<Bytes>>>,
    released: Arc<AtomicUsize>,
}

impl Stream for TrackedBody {
    type Item = ChatResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.reads.poll_next_unpin(cx)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
