pub mod config;
pub mod logging;
pub mod pipeline;
pub mod sinks;

use anyhow::Context;

use config::AppConfig;
use pipeline::{CaptionBuilder, MediaRelay, Orchestrator, ProviderResolver};

/// Wire the full pipeline from configuration
pub fn build_orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let sink = sinks::build_sink(config.telegram_config().as_ref(), &config.network)
        .context("failed to create messaging sink")?;

    let resolver = ProviderResolver::with_network(config.network.clone(), config.provider_table());

    let relay = MediaRelay::with_network(sink, config.network.clone(), config.relay_config());

    Ok(Orchestrator::new(
        resolver,
        relay,
        CaptionBuilder::new(config.caption.clone()),
    ))
}
