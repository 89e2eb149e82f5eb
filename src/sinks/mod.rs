// Messaging sinks

pub mod disabled;
pub mod telegram;

use std::sync::Arc;
use tracing::info;

pub use disabled::DisabledSink;
pub use telegram::{TelegramConfig, TelegramSink};

use crate::pipeline::errors::SinkError;
use crate::pipeline::models::NetworkConfig;
use crate::pipeline::traits::MessagingSink;

/// Telegram when credentials are present, otherwise the disabled sink
pub fn build_sink(
    telegram: Option<&TelegramConfig>,
    network: &NetworkConfig,
) -> Result<Arc<dyn MessagingSink>, SinkError> {
    match telegram {
        Some(config) => {
            info!(chat_id = %config.chat_id, "Using Telegram sink");
            Ok(Arc::new(TelegramSink::new(config.clone(), network)?))
        }
        None => {
            info!("No sink credentials configured; relays will be rejected");
            Ok(Arc::new(DisabledSink))
        }
    }
}
