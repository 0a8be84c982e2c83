//! HTTP transport seam and its reqwest implementation

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use thiserror::Error;

/// Errors that can occur in the HTTP transport layer
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or its response body could not be read
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// An HTTP response after the transport has drained its body
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

/// Minimal async surface the dispatcher needs from an HTTP client
///
/// Implemented by [`ReqwestTransport`] in production and by scripted fakes
/// in tests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes one request and drains the response body
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`
///
/// Every request declares and accepts JSON content.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with a fresh client and default settings
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Transport reusing an existing client, keeping its pools and timeouts
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        // Request bodies only travel on non-GET methods
        if method != Method::GET {
            if let Some(body) = body {
                request = request.body(body);
            }
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}
