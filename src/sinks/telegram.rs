// Telegram Bot API sink
//
// Text goes through sendMessage; media is uploaded as multipart to
// sendVideo, sendPhoto or sendDocument depending on its MIME type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::pipeline::errors::SinkError;
use crate::pipeline::models::NetworkConfig;
use crate::pipeline::traits::{Attachment, MessagingSink};

const API_BASE: &str = "https://api.telegram.org";

/// Telegram limits captions to 1024 characters
const CAPTION_LIMIT: usize = 1024;
const MESSAGE_LIMIT: usize = 4096;

/// Bot credentials and destination chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub bot_token: String,
    /// Target chat / channel id (numeric or `@channel`)
    pub chat_id: String,
}

pub struct TelegramSink {
    config: TelegramConfig,
    client: reqwest::Client,
    api_base: String,
}

impl TelegramSink {
    pub fn new(config: TelegramConfig, network: &NetworkConfig) -> Result<Self, SinkError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(network.user_agent.as_str())
            .timeout(Duration::from_secs(300));
        if let Some(proxy_url) = network.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| SinkError::Transport(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            config,
            client: builder.build()?,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point at a different Bot API server (self-hosted `telegram-bot-api`)
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.config.bot_token, method)
    }

    async fn check(response: reqwest::Response) -> Result<(), SinkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("no description")
            .to_string();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Bot API method and form field for a MIME type
pub fn upload_method(mime_type: &str) -> (&'static str, &'static str) {
    if mime_type.starts_with("video/") {
        ("sendVideo", "video")
    } else if mime_type.starts_with("image/") {
        ("sendPhoto", "photo")
    } else {
        ("sendDocument", "document")
    }
}

/// Clip to `limit` characters, keeping whole chars
pub fn clip(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[async_trait]
impl MessagingSink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send_text(&self, message: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": clip(message, MESSAGE_LIMIT),
                "disable_web_page_preview": true,
            }))
            .send()
            .await?;

        Self::check(response).await
    }

    async fn send_attachment(&self, attachment: Attachment) -> Result<(), SinkError> {
        let (method, field) = upload_method(&attachment.mime_type);
        debug!(method, bytes = attachment.bytes.len(), file = %attachment.filename, "Uploading to Telegram");

        let part = reqwest::multipart::Part::bytes(attachment.bytes)
            .file_name(attachment.filename)
            .mime_str(&attachment.mime_type)
            .map_err(|e| SinkError::Transport(format!("failed to build form part: {e}")))?;

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part(field, part);
        if !attachment.caption.is_empty() {
            form = form.text("caption", clip(&attachment.caption, CAPTION_LIMIT));
        }
        if method == "sendVideo" {
            form = form.text("supports_streaming", "true");
        }

        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?;

        let result = Self::check(response).await;
        if let Err(e) = &result {
            warn!(method, error = %e, "Telegram rejected upload");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_method_by_mime() {
        assert_eq!(upload_method("video/mp4"), ("sendVideo", "video"));
        assert_eq!(upload_method("image/jpeg"), ("sendPhoto", "photo"));
        assert_eq!(upload_method("application/zip"), ("sendDocument", "document"));
    }

    #[test]
    fn test_clip_respects_char_limit() {
        assert_eq!(clip("short", 10), "short");
        let clipped = clip(&"é".repeat(2000), CAPTION_LIMIT);
        assert_eq!(clipped.chars().count(), CAPTION_LIMIT);
        assert!(clipped.ends_with('…'));
    }

    #[test]
    fn test_method_url() {
        let sink = TelegramSink::new(
            TelegramConfig {
                bot_token: "123:abc".to_string(),
                chat_id: "@channel".to_string(),
            },
            &NetworkConfig::default(),
        )
        .unwrap()
        .with_api_base("http://localhost:8081/");
        assert_eq!(sink.method_url("sendVideo"), "http://localhost:8081/bot123:abc/sendVideo");
    }
}
