// ─── Transport ───
// The network seam: one GET, answered with a length hint and a byte stream.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::Client;

use crate::core::error::{LauncherError, LauncherResult};

/// Upper bound on what a claimed `Content-Length` may reserve up front.
const MAX_PREALLOC: u64 = 1 << 20;

pub struct TransportResponse {
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, LauncherResult<Bytes>>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET. Non-2xx responses are errors.
    async fn get(&self, url: &str) -> LauncherResult<TransportResponse>;
}

/// `reqwest`-backed transport streaming the body chunk by chunk.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> LauncherResult<TransportResponse> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(LauncherError::from))
            .boxed();

        Ok(TransportResponse {
            content_length,
            body,
        })
    }
}

/// Read a whole (small) document into memory.
pub async fn read_to_string(transport: &dyn Transport, url: &str) -> LauncherResult<String> {
    let mut response = transport.get(url).await?;

    let reserve = response.content_length.unwrap_or(0).min(MAX_PREALLOC);
    let mut buffer = Vec::with_capacity(reserve as usize);
    while let Some(chunk) = response.body.next().await {
        buffer.extend_from_slice(&chunk?);
    }

    String::from_utf8(buffer).map_err(|e| LauncherError::malformed(url, e))
}
