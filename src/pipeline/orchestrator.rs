// Orchestrator - dedup, per-platform batches, resolve -> caption -> relay

use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::caption::CaptionBuilder;
use super::detector::detect;
use super::models::{
    MediaRequest, PlatformKind, ProcessOutcome, RelayResult, ResolutionResult, StatsSnapshot,
};
use super::relay::MediaRelay;
use super::resolver::ProviderResolver;
use super::stats::StatsTracker;

pub struct Orchestrator {
    resolver: ProviderResolver,
    relay: MediaRelay,
    captions: CaptionBuilder,
    stats: Arc<StatsTracker>,
}

impl Orchestrator {
    pub fn new(resolver: ProviderResolver, relay: MediaRelay, captions: CaptionBuilder) -> Self {
        Self {
            resolver,
            relay,
            captions,
            stats: Arc::new(StatsTracker::new()),
        }
    }

    /// Share counters with another owner (e.g. a front-end)
    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Release both network clients
    pub async fn shutdown(&self) {
        let resolver = self.resolver.close().await;
        let relay = self.relay.close().await;
        info!(resolver, relay, "Orchestrator shut down");
    }

    /// Process a batch. Outcomes come back in deduplicated input order.
    ///
    /// Platforms run concurrently on the calling task; items of one platform
    /// run strictly one after another.
    pub async fn process(&self, requests: Vec<MediaRequest>) -> Vec<ProcessOutcome> {
        let received = requests.len();
        let unique = dedupe_by_id(requests);
        let batches = group_by_platform(unique);

        info!(
            received,
            batches = batches.len(),
            "Processing media requests"
        );

        let runs = batches
            .into_iter()
            .map(|(platform, items)| self.run_batch(platform, items));

        let mut outcomes: Vec<(usize, ProcessOutcome)> =
            join_all(runs).await.into_iter().flatten().collect();
        outcomes.sort_by_key(|(index, _)| *index);

        let snapshot = self.stats.snapshot();
        info!(
            total = snapshot.total,
            successful = snapshot.successful,
            failed = snapshot.failed,
            success_rate = snapshot.success_rate,
            "Batch complete"
        );

        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    async fn run_batch(
        &self,
        platform: PlatformKind,
        items: Vec<(usize, MediaRequest)>,
    ) -> Vec<(usize, ProcessOutcome)> {
        info!(%platform, items = items.len(), "Starting platform batch");
        let mut outcomes = Vec::with_capacity(items.len());

        for (index, request) in items {
            let outcome = self.process_one(platform, request).await;
            outcomes.push((index, outcome));
        }

        self.stats.mark_run();
        info!(%platform, "Platform batch finished");
        outcomes
    }

    /// Resolve, caption and relay one item. A panic in either stage is
    /// caught here, counted as failed and reported; the resolution that was
    /// reached is kept.
    async fn process_one(&self, platform: PlatformKind, mut request: MediaRequest) -> ProcessOutcome {
        request.platform = Some(platform);

        let resolved = AssertUnwindSafe(self.resolver.resolve(platform, &request.source_url))
            .catch_unwind()
            .await;
        let resolution = match resolved {
            Ok(resolution) => resolution,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                return self.fault(request, ResolutionResult::Exhausted, message).await;
            }
        };

        let relayed = match resolution.download_url() {
            Some(url) => AssertUnwindSafe(self.deliver(platform, &request, url))
                .catch_unwind()
                .await
                .map(Some),
            None => Ok(None),
        };
        let relay = match relayed {
            Ok(relay) => relay,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                return self.fault(request, resolution, message).await;
            }
        };

        self.stats.record(&resolution, relay.as_ref());

        ProcessOutcome {
            request,
            resolution,
            relay,
            fault: None,
        }
    }

    async fn deliver(&self, platform: PlatformKind, request: &MediaRequest, url: &str) -> RelayResult {
        let caption = self.captions.build(platform, &request.source_url, &request.meta);
        let stem = filename_stem(platform, &request.id);
        self.relay.relay(url, &caption, &stem).await
    }

    async fn fault(
        &self,
        request: MediaRequest,
        resolution: ResolutionResult,
        message: String,
    ) -> ProcessOutcome {
        let platform = request.platform.unwrap_or(PlatformKind::Unknown);
        error!(%platform, id = %request.id, error = %message, "Processing fault");
        self.stats.record_fault();
        self.report_fault(platform, &request, &message).await;

        ProcessOutcome {
            request,
            resolution,
            relay: None,
            fault: Some(message),
        }
    }

    async fn report_fault(&self, platform: PlatformKind, request: &MediaRequest, message: &str) {
        let text = format!(
            "⚠️ Relay fault\nPlatform: {}\nItem: {}\nURL: {}\nError: {}",
            platform.label(),
            request.id,
            request.source_url,
            message
        );
        if let Err(e) = self.relay.sink().send_text(&text).await {
            warn!(error = %e, "Could not report fault to sink");
        }
    }
}

/// Last occurrence of each id survives, at its own position
fn dedupe_by_id(requests: Vec<MediaRequest>) -> Vec<MediaRequest> {
    let mut seen = HashSet::new();
    let mut kept: Vec<MediaRequest> = requests
        .into_iter()
        .rev()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    kept.reverse();
    kept
}

/// Platforms in order of first appearance, items tagged with their position
fn group_by_platform(requests: Vec<MediaRequest>) -> Vec<(PlatformKind, Vec<(usize, MediaRequest)>)> {
    let mut batches: Vec<(PlatformKind, Vec<(usize, MediaRequest)>)> = Vec::new();

    for (index, request) in requests.into_iter().enumerate() {
        let platform = request.platform.unwrap_or_else(|| detect(&request.source_url));
        match batches.iter_mut().find(|(p, _)| *p == platform) {
            Some((_, items)) => items.push((index, request)),
            None => batches.push((platform, vec![(index, request)])),
        }
    }
    batches
}

fn filename_stem(platform: PlatformKind, id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    format!("{}_{}", platform, safe)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
