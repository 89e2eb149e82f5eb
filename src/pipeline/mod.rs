// Pipeline module - resolve a post URL, relay the media, count outcomes

pub mod caption;
pub mod client;
pub mod detector;
pub mod errors;
pub mod http;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod relay;
pub mod resolver;
pub mod stats;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use caption::{CaptionBuilder, CaptionConfig};
pub use client::{ClientFactory, SharedClient};
pub use detector::detect;
pub use errors::{ClientError, ProviderError, RelayError, SinkError};
pub use http::ReqwestClient;
pub use models::{
    CaptionMeta, MediaRequest, NetworkConfig, PlatformKind, ProcessOutcome, RelayResult,
    ResolutionResult, StatsSnapshot,
};
pub use orchestrator::Orchestrator;
pub use providers::{FieldPath, ProviderSpec, ProviderTable};
pub use relay::{MediaRelay, RelayConfig};
pub use resolver::ProviderResolver;
pub use stats::StatsTracker;
pub use traits::{Attachment, HttpClient, HttpMethod, HttpRequest, HttpResponse, MessagingSink};
