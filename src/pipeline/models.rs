// Common data models for the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::RelayError;

/// Social platform a post URL belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    TikTok,
    Instagram,
    YouTubeShorts,
    Unknown,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TikTok => "tiktok",
            Self::Instagram => "instagram",
            Self::YouTubeShorts => "youtube_shorts",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable name used in captions
    pub fn label(&self) -> &'static str {
        match self {
            Self::TikTok => "TikTok",
            Self::Instagram => "Instagram",
            Self::YouTubeShorts => "YouTube Shorts",
            Self::Unknown => "Link",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::TikTok => "🎵",
            Self::Instagram => "📸",
            Self::YouTubeShorts => "▶️",
            Self::Unknown => "🔗",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional metadata rendered into the relay caption
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionMeta {
    pub description: Option<String>,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// One post to resolve and relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    /// Entity id used for batch deduplication
    pub id: String,
    pub source_url: String,
    /// Detected on demand when not supplied
    pub platform: Option<PlatformKind>,
    #[serde(default)]
    pub meta: CaptionMeta,
}

impl MediaRequest {
    /// Request keyed by its own URL
    pub fn new(source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        Self {
            id: source_url.clone(),
            source_url,
            platform: None,
            meta: CaptionMeta::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_platform(mut self, platform: PlatformKind) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_meta(mut self, meta: CaptionMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Outcome of running the provider chain for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionResult {
    Success { url: String, provider: String },
    Exhausted,
}

impl ResolutionResult {
    pub fn download_url(&self) -> Option<&str> {
        match self {
            Self::Success { url, .. } => Some(url),
            Self::Exhausted => None,
        }
    }

    pub fn provider_used(&self) -> Option<&str> {
        match self {
            Self::Success { provider, .. } => Some(provider),
            Self::Exhausted => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Outcome of forwarding resolved media to the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayResult {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RelayError>,
}

impl RelayResult {
    pub fn sent() -> Self {
        Self {
            sent: true,
            reason: None,
        }
    }

    pub fn failed(reason: RelayError) -> Self {
        Self {
            sent: false,
            reason: Some(reason),
        }
    }
}

/// Point-in-time view of the aggregate counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate: f64,
    /// RFC 3339, unset until the first batch completes
    pub last_run: Option<String>,
}

/// Everything the pipeline produced for one request
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub request: MediaRequest,
    pub resolution: ResolutionResult,
    pub relay: Option<RelayResult>,
    /// Set when processing was cut short by a caught fault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Network configuration shared by the HTTP clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP or SOCKS5 proxy URL (e.g., "socks5h://127.0.0.1:1080")
    pub proxy: Option<String>,

    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
        }
    }
}
