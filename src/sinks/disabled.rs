// Disabled sink - used when no credential pair is configured

use async_trait::async_trait;
use tracing::{info, warn};

use crate::pipeline::errors::SinkError;
use crate::pipeline::traits::{Attachment, MessagingSink};

/// Logs text, refuses attachments
#[derive(Debug, Default)]
pub struct DisabledSink;

#[async_trait]
impl MessagingSink for DisabledSink {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn send_text(&self, message: &str) -> Result<(), SinkError> {
        info!(text = message, "Sink disabled; message not delivered");
        Ok(())
    }

    async fn send_attachment(&self, attachment: Attachment) -> Result<(), SinkError> {
        warn!(file = %attachment.filename, "Sink disabled; attachment dropped");
        Err(SinkError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_attachments() {
        let sink = DisabledSink;
        let result = sink
            .send_attachment(Attachment {
                bytes: vec![1, 2, 3],
                filename: "a.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                caption: String::new(),
            })
            .await;
        assert_eq!(result, Err(SinkError::NotConfigured));
        assert!(sink.send_text("hi").await.is_ok());
    }
}
