// Seams between the pipeline and the outside world

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::errors::{ProviderError, SinkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub json_body: Option<Value>,
    pub timeout: Duration,
    /// Abort the read once the body grows past this many bytes
    pub max_body_bytes: Option<usize>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            json_body: None,
            timeout,
            max_body_bytes: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            json_body: Some(body),
            timeout,
            max_body_bytes: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_max_body_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

/// A fully buffered response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used by the resolver and the relay
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError>;
}

/// Media handed to the sink
#[derive(Debug, Clone)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub caption: String,
}

/// External messaging destination.
///
/// `Ok(())` means the sink reported success for the call. Nothing here
/// retries; callers decide what a rejection means.
#[async_trait]
pub trait MessagingSink: Send + Sync {
    /// Name of the sink (for logging)
    fn name(&self) -> &'static str;

    async fn send_text(&self, message: &str) -> Result<(), SinkError>;

    async fn send_attachment(&self, attachment: Attachment) -> Result<(), SinkError>;
}
