use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::ClientConfig;
use crate::errors::{ChatError, ChatResult};
use crate::request::ChatRequest;

pub const CLIENT_USER_AGENT: &str = concat!("vaultchat-rs/", env!("CARGO_PKG_VERSION"));
pub const USER_KEY_HEADER: &str = "x-user-key";
pub const USER_SECRET_HEADER: &str = "x-user-secret";

pub type ByteStream = BoxStream<'static, ChatResult<Bytes>>;

/// A fully prepared POST to the chat endpoint
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportRequest {
    pub fn new(config: &ClientConfig, request: &ChatRequest) -> ChatResult<Self> {
        Ok(Self {
            url: config.chat_url()?,
            headers: request_headers(config)?,
            body: request.to_json()?,
        })
    }
}

/// Status plus a body that has not been read yet
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: ByteStream,
}

impl TransportResponse {
    /// A response whose body is delivered as the given reads, in order
    pub fn from_chunks<I, B>(status: StatusCode, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<ChatResult<Bytes>> = chunks.into_iter().map(|b| Ok(b.into())).collect();
        Self {
            status,
            body: stream::iter(chunks).boxed(),
        }
    }
}

/// The fetch-like call underneath a [`crate::client::ChatClient`]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> ChatResult<TransportResponse>;
}

/// Default transport backed by reqwest. No timeout is applied; wrap the call if one is needed.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> ChatResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> ChatResult<TransportResponse> {
        let response = self
            .client
            .post(request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes_stream().map_err(ChatError::from).boxed();
        Ok(TransportResponse { status, body })
    }
}

pub fn request_headers(config: &ClientConfig) -> ChatResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

    if let Some((key, secret)) = config.user_credentials() {
        headers.insert(USER_KEY_HEADER, header_value(key)?);
        headers.insert(USER_SECRET_HEADER, header_value(secret)?);
    }

    Ok(headers)
}

fn header_value(value: &str) -> ChatResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        ChatError::Config("user credentials contain invalid header characters".to_string())
    })
}

/// Send the request and hand back the body, failing on any non-success status.
///
/// The returned stream owns the body reader; dropping it at any point releases the connection.
pub async fn open(transport: &dyn Transport, request: TransportRequest) -> ChatResult<ByteStream> {
    let url = request.url.to_string();
    let response = transport.send(request).await?;

    if !response.status.is_success() {
        let status = response.status;
        let body = read_error_body(response.body).await;
        tracing::warn!(%url, status = status.as_u16(), "Chat request rejected");
        return Err(ChatError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        });
    }

    Ok(Box::pin(async_stream::stream! {
        let _guard = ReaderGuard { url };
        let mut body = response.body;
        while let Some(bytes) = body.next().await {
            yield bytes;
        }
    }))
}

async fn read_error_body(body: ByteStream) -> String {
    let bytes: Vec<Bytes> = body
        .take_while(|chunk| futures::future::ready(chunk.is_ok()))
        .filter_map(|chunk| futures::future::ready(chunk.ok()))
        .collect()
        .await;
    let joined: Vec<u8> = bytes.concat();
    String::from_utf8_lossy(&joined).into_owned()
}

struct ReaderGuard {
    url: String,
}

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        tracing::debug!(url = %self.url, "Released response body reader");
    }
}
