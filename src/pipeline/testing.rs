// Test doubles for the HttpClient and MessagingSink seams

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::errors::{ProviderError, SinkError};
use super::traits::{Attachment, HttpClient, HttpRequest, HttpResponse, MessagingSink};

#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    Fail(ProviderError),
    /// Never answers within any sane timeout
    Hang,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self::Respond {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Respond {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn media(bytes: &[u8], content_type: &str) -> Self {
        Self::Respond {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: bytes.to_vec(),
        }
    }
}

/// Answers by URL prefix, records every request URL
#[derive(Default)]
pub struct ScriptedClient {
    routes: Vec<(String, Reply)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, reply: Reply) -> Self {
        self.routes.push((prefix.to_string(), reply));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        self.calls.lock().unwrap().push(request.url.clone());

        let reply = self
            .routes
            .iter()
            .find(|(prefix, _)| request.url.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Respond {
                status,
                content_type,
                body,
            }) => {
                if let Some(limit) = request.max_body_bytes {
                    if body.len() > limit {
                        return Err(ProviderError::TooLarge { limit });
                    }
                }
                Ok(HttpResponse {
                    status,
                    content_type,
                    body,
                })
            }
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ProviderError::Network("hung".to_string()))
            }
            None => Err(ProviderError::Network(format!("no route for {}", request.url))),
        }
    }
}

/// Sink that records what it was given
pub struct RecordingSink {
    accept: bool,
    panic_on_caption: Option<String>,
    pub texts: Mutex<Vec<String>>,
    pub attachments: Mutex<Vec<Attachment>>,
    pub attempts: AtomicUsize,
}

impl RecordingSink {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            panic_on_caption: None,
            texts: Mutex::new(Vec::new()),
            attachments: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            ..Self::accepting()
        }
    }

    /// Panics when a caption contains `needle`
    pub fn panicking_on(needle: &str) -> Self {
        Self {
            panic_on_caption: Some(needle.to_string()),
            ..Self::accepting()
        }
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.lock().unwrap().len()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send_text(&self, message: &str) -> Result<(), SinkError> {
        self.texts.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn send_attachment(&self, attachment: Attachment) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = &self.panic_on_caption {
            if attachment.caption.contains(needle.as_str()) {
                panic!("sink blew up on {}", needle);
            }
        }
        if !self.accept {
            return Err(SinkError::Rejected {
                status: 400,
                message: "Bad Request: wrong file".to_string(),
            });
        }
        self.attachments.lock().unwrap().push(attachment);
        Ok(())
    }
}
