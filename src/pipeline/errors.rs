// Error types for the resolve-and-relay pipeline

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failure at a single resolver provider. Never fatal: the resolver logs it
/// against the provider and moves on to the next one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Connection, DNS or read failure
    #[error("Network error: {0}")]
    Network(String),

    /// Provider did not answer within its time budget
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Non-success HTTP status
    #[error("Provider answered with HTTP {0}")]
    Status(u16),

    /// Body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON parsed but none of the field paths held a value
    #[error("No field path matched the response")]
    NoMatch,

    /// The resolver's client was closed or could not be built
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Extracted value could not be turned into an absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Body exceeded the configured byte cap
    #[error("Response exceeded {limit} bytes")]
    TooLarge { limit: usize },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not carry the configured duration
            return Self::Timeout(0);
        }
        if let Some(status) = err.status() {
            return Self::Status(status.as_u16());
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Why a component's shared HTTP client is unavailable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Released at shutdown
    #[error("HTTP client has been closed")]
    Closed,

    /// The factory could not build it
    #[error("Failed to initialise HTTP client: {0}")]
    Init(String),
}

/// Failure reported by a messaging sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// No credential pair configured
    #[error("Messaging sink is not configured")]
    NotConfigured,

    /// Sink answered with a non-success status
    #[error("Sink rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Request never reached the sink
    #[error("Sink unreachable: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Why a relay did not deliver the media.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    /// The relay's client was already released
    #[error("Relay client has been closed")]
    Closed,

    /// The shared client could not be built
    #[error("Failed to initialise HTTP client: {0}")]
    ClientInit(String),

    /// Media download failed before a response arrived
    #[error("Media fetch failed: {0}")]
    Fetch(ProviderError),

    /// Media host answered with a non-success status
    #[error("Media fetch returned HTTP {0}")]
    FetchStatus(u16),

    /// Media is larger than the configured cap
    #[error("Media exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Sink refused the attachment
    #[error("Sink error: {0}")]
    Sink(SinkError),
}

impl From<SinkError> for RelayError {
    fn from(err: SinkError) -> Self {
        Self::Sink(err)
    }
}

impl From<ClientError> for RelayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Closed => Self::Closed,
            ClientError::Init(message) => Self::ClientInit(message),
        }
    }
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Status(status) => Self::FetchStatus(status),
            ProviderError::TooLarge { limit } => Self::PayloadTooLarge { limit },
            ProviderError::Client(err) => err.into(),
            other => Self::Fetch(other),
        }
    }
}

// Outcomes are rendered as JSON; the reason travels as its message.
impl Serialize for RelayError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
