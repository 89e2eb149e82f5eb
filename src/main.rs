use anyhow::Context;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use social_relay::config::AppConfig;
use social_relay::logging::init_tracing;
use social_relay::pipeline::{CaptionMeta, MediaRequest};

/// Resolve watermark-free media for social post URLs and relay it to the
/// configured messaging sink.
#[derive(Debug, Parser)]
#[command(name = "social-relay", version, about)]
struct Cli {
    /// Post URLs (TikTok, Instagram, YouTube Shorts)
    urls: Vec<String>,

    /// JSON file holding an array of media requests
    #[arg(long)]
    input: Option<PathBuf>,

    /// Config file (defaults to <config_dir>/social-relay/config.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Description added to the caption of every URL given on the command line
    #[arg(long)]
    description: Option<String>,

    /// Hashtag for the caption (repeatable)
    #[arg(long = "hashtag")]
    hashtags: Vec<String>,

    /// Override the provider timeout in milliseconds
    #[arg(long)]
    provider_timeout_ms: Option<u64>,
}

fn read_requests(cli: &Cli) -> anyhow::Result<Vec<MediaRequest>> {
    let mut requests = Vec::new();

    if let Some(path) = &cli.input {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let from_file: Vec<MediaRequest> =
            serde_json::from_str(&text).context("input must be a JSON array of media requests")?;
        requests.extend(from_file);
    }

    let meta = CaptionMeta {
        description: cli.description.clone(),
        hashtags: cli.hashtags.clone(),
        ..CaptionMeta::default()
    };
    requests.extend(
        cli.urls
            .iter()
            .map(|url| MediaRequest::new(url.as_str()).with_meta(meta.clone())),
    );

    Ok(requests)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.provider_timeout_ms.is_some() {
        config = config.with_provider_timeout(cli.provider_timeout_ms);
        config.validate()?;
    }
    init_tracing(&config.log_level, config.log_format);

    let requests = read_requests(&cli)?;
    if requests.is_empty() {
        anyhow::bail!("no URLs given (pass them as arguments or via --input)");
    }

    let orchestrator = social_relay::build_orchestrator(&config)?;
    let results = orchestrator.process(requests).await;
    let stats = orchestrator.stats();
    orchestrator.shutdown().await;

    let report = json!({ "results": results, "stats": stats });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
