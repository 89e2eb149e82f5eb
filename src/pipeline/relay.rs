// Media relay - downloads resolved media and forwards it to the sink

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::client::{ClientFactory, SharedClient};
use super::errors::{ProviderError, RelayError};
use super::models::{NetworkConfig, RelayResult};
use super::traits::{Attachment, HttpRequest, MessagingSink};

const DEFAULT_MIME: &str = "video/mp4";

/// Relay limits
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Whole-download time budget
    pub timeout: Duration,
    /// Reject media larger than this (None = unbounded)
    pub max_media_bytes: Option<usize>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_media_bytes: Some(50 * 1024 * 1024),
        }
    }
}

pub struct MediaRelay {
    sink: Arc<dyn MessagingSink>,
    client: SharedClient,
    config: RelayConfig,
}

impl MediaRelay {
    pub fn new(sink: Arc<dyn MessagingSink>, factory: ClientFactory, config: RelayConfig) -> Self {
        Self {
            sink,
            client: SharedClient::new("relay", factory),
            config,
        }
    }

    /// Relay backed by a reqwest client built from `network` on first use
    pub fn with_network(
        sink: Arc<dyn MessagingSink>,
        network: NetworkConfig,
        config: RelayConfig,
    ) -> Self {
        Self {
            sink,
            client: SharedClient::from_network("relay", network),
            config,
        }
    }

    pub fn sink(&self) -> &Arc<dyn MessagingSink> {
        &self.sink
    }

    /// Release the client. Returns true only for the call that released it.
    pub async fn close(&self) -> bool {
        self.client.close().await
    }

    pub async fn is_closed(&self) -> bool {
        self.client.is_closed().await
    }

    /// Fetch `download_url` and hand it to the sink. Never retries.
    pub async fn relay(&self, download_url: &str, caption: &str, filename_stem: &str) -> RelayResult {
        match self.try_relay(download_url, caption, filename_stem).await {
            Ok(()) => {
                info!(sink = self.sink.name(), file = filename_stem, "Media relayed");
                RelayResult::sent()
            }
            Err(e) => {
                warn!(sink = self.sink.name(), file = filename_stem, error = %e, "Relay failed");
                RelayResult::failed(e)
            }
        }
    }

    async fn try_relay(
        &self,
        download_url: &str,
        caption: &str,
        filename_stem: &str,
    ) -> Result<(), RelayError> {
        let client = self.client.get().await?;

        let request = HttpRequest::get(download_url, self.config.timeout)
            .with_max_body_bytes(self.config.max_media_bytes);
        let response = match timeout(self.config.timeout, client.execute(request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(RelayError::Fetch(ProviderError::Timeout(
                    self.config.timeout.as_millis() as u64,
                )))
            }
        };

        if !response.is_success() {
            return Err(RelayError::FetchStatus(response.status));
        }
        debug!(bytes = response.body.len(), "Media fetched");

        let mime_type = media_mime(response.content_type.as_deref());
        let attachment = Attachment {
            filename: format!("{}.{}", filename_stem, extension_for(&mime_type)),
            mime_type,
            bytes: response.body,
            caption: caption.to_string(),
        };

        self.sink.send_attachment(attachment).await?;
        Ok(())
    }
}

/// Keep the host's type when it is media, otherwise assume mp4
fn media_mime(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_lowercase())
        .filter(|ct| ct.starts_with("video/") || ct.starts_with("image/"))
        .unwrap_or_else(|| DEFAULT_MIME.to_string())
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        m if m.starts_with("image/") => "jpg",
        _ => "mp4",
    }
}
