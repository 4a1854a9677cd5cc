//! HTTP transport for upload requests.
//!
//! The worker is generic over [`Transport`] so tests can substitute a
//! scripted server. [`HttpTransport`] is the real implementation backed by
//! `reqwest`.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::UploadError;
use crate::format::UploadRequest;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("idokep-uploader/", env!("CARGO_PKG_VERSION"));

/// Status and body of a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response body as text.
    pub body: String,
}

/// Something that can deliver an [`UploadRequest`].
///
/// The returned future must be `Send` so the worker can run on a
/// multi-threaded runtime.
pub trait Transport: Send + Sync + 'static {
    /// Send `request` and return whatever the server answered.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Transport`] if no response was received.
    fn send(
        &self,
        request: &UploadRequest,
    ) -> impl Future<Output = Result<HttpReply, UploadError>> + Send;
}

/// Transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Transport`] if the client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UploadError::Transport(format!("failed to build client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &UploadRequest) -> Result<HttpReply, UploadError> {
        let response = self
            .client
            .request(request.method.clone(), request.url())
            .send()
            .await
            .map_err(|e| UploadError::Transport(describe(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(format!("failed to read body: {e}")))?;

        Ok(HttpReply { status, body })
    }
}

/// Summarise a `reqwest` error without echoing the URL, which carries the
/// password.
fn describe(error: reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    format!("{kind}: {}", error.without_url())
}
