// Provider resolver - ordered fallback across no-watermark services
//
// Strategy:
// 1. Look up the platform's provider list (empty => Exhausted)
// 2. Try each provider once, in order, bounded by its own timeout
// 3. First usable URL wins; any failure only skips that provider

use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::client::{ClientFactory, SharedClient};
use super::errors::ProviderError;
use super::models::{NetworkConfig, PlatformKind, ResolutionResult};
use super::providers::{extract_first, normalize_media_url, ProviderSpec, ProviderTable};
use super::traits::{HttpClient, HttpResponse};

pub struct ProviderResolver {
    client: SharedClient,
    table: ProviderTable,
}

impl ProviderResolver {
    pub fn new(client: Arc<dyn HttpClient>, table: ProviderTable) -> Self {
        Self {
            client: SharedClient::fixed("resolver", client),
            table,
        }
    }

    pub fn with_factory(factory: ClientFactory, table: ProviderTable) -> Self {
        Self {
            client: SharedClient::new("resolver", factory),
            table,
        }
    }

    /// Resolver backed by a reqwest client built from `network` on first use
    pub fn with_network(network: NetworkConfig, table: ProviderTable) -> Self {
        Self {
            client: SharedClient::from_network("resolver", network),
            table,
        }
    }

    pub fn table(&self) -> &ProviderTable {
        &self.table
    }

    /// Release the client. Returns true only for the call that released it.
    pub async fn close(&self) -> bool {
        self.client.close().await
    }

    pub async fn is_closed(&self) -> bool {
        self.client.is_closed().await
    }

    /// Run the fallback chain for `source_url`
    pub async fn resolve(&self, platform: PlatformKind, source_url: &str) -> ResolutionResult {
        let providers = self.table.providers_for(platform);
        if providers.is_empty() {
            debug!(%platform, source_url, "No providers for platform");
            return ResolutionResult::Exhausted;
        }

        let client = match self.client.get().await {
            Ok(client) => client,
            Err(e) => {
                warn!(%platform, error = %e, "Resolver client unavailable");
                return ResolutionResult::Exhausted;
            }
        };

        for spec in providers {
            debug!(provider = %spec.name, %platform, "Trying provider");

            match attempt(client.as_ref(), spec, source_url).await {
                Ok(url) => {
                    info!(provider = %spec.name, %platform, "Resolved media URL");
                    return ResolutionResult::Success {
                        url,
                        provider: spec.name.clone(),
                    };
                }
                Err(e) => {
                    warn!(provider = %spec.name, %platform, error = %e, "Provider failed");
                }
            }
        }

        warn!(%platform, source_url, tried = providers.len(), "All providers exhausted");
        ResolutionResult::Exhausted
    }

    /// Single attempt against one provider
    pub async fn try_provider(
        &self,
        spec: &ProviderSpec,
        source_url: &str,
    ) -> Result<String, ProviderError> {
        let client = self.client.get().await?;
        attempt(client.as_ref(), spec, source_url).await
    }
}

async fn attempt(
    client: &dyn HttpClient,
    spec: &ProviderSpec,
    source_url: &str,
) -> Result<String, ProviderError> {
    let request = spec.build_request(source_url);

    let response = match timeout(spec.timeout, client.execute(request)).await {
        Ok(result) => result?,
        Err(_) => return Err(ProviderError::Timeout(spec.timeout.as_millis() as u64)),
    };

    interpret_response(spec, &response)
}

/// Read a provider response into a download URL.
///
/// Pure: used by the resolver and directly by fixture tests.
pub fn interpret_response(spec: &ProviderSpec, response: &HttpResponse) -> Result<String, ProviderError> {
    if !response.is_success() {
        return Err(ProviderError::Status(response.status));
    }

    let body: Value = serde_json::from_slice(&response.body)?;
    let (value, path) = extract_first(&body, &spec.field_paths).ok_or(ProviderError::NoMatch)?;
    debug!(provider = %spec.name, path = %path, "Field path matched");

    normalize_media_url(value, &spec.endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::errors::ClientError;
    use crate::pipeline::testing::{Reply, ScriptedClient};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SOURCE: &str = "https://www.tiktok.com/@user/video/1";

    fn spec(name: &str, paths: &[&str]) -> ProviderSpec {
        ProviderSpec::get(name, &format!("https://{}.test/api?url={{url}}", name))
            .with_paths(paths)
            .with_timeout(Duration::from_millis(200))
    }

    fn build_resolver(client: ScriptedClient, providers: Vec<ProviderSpec>) -> (Arc<ScriptedClient>, ProviderResolver) {
        let client = Arc::new(client);
        let table = ProviderTable::empty().with_platform(PlatformKind::TikTok, providers);
        (client.clone(), ProviderResolver::new(client, table))
    }

    #[tokio::test]
    async fn test_malformed_first_provider_falls_through() {
        let client = ScriptedClient::new()
            .route("https://p1.test", Reply::json("{not json"))
            .route("https://p2.test", Reply::json(r#"{"data":{"play":"https://cdn.test/v.mp4"}}"#));
        let (client, resolver) = build_resolver(
            client,
            vec![spec("p1", &["data.play"]), spec("p2", &["data.play"])],
        );

        let result = resolver.resolve(PlatformKind::TikTok, SOURCE).await;

        assert_eq!(
            result,
            ResolutionResult::Success {
                url: "https://cdn.test/v.mp4".to_string(),
                provider: "p2".to_string(),
            }
        );
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let client = ScriptedClient::new()
            .route("https://p1.test", Reply::json(r#"{"url":"https://cdn.test/a.mp4"}"#))
            .route("https://p2.test", Reply::json(r#"{"url":"https://cdn.test/b.mp4"}"#));
        let (client, resolver) = build_resolver(client, vec![spec("p1", &["url"]), spec("p2", &["url"])]);

        let result = resolver.resolve(PlatformKind::TikTok, SOURCE).await;

        assert_eq!(result.provider_used(), Some("p1"));
        assert_eq!(client.calls().len(), 1);
        assert!(client.calls()[0].starts_with("https://p1.test"));
    }

    #[tokio::test]
    async fn test_field_priority_prefers_play_over_wmplay() {
        let client = ScriptedClient::new().route(
            "https://p1.test",
            Reply::json(r#"{"data":{"wmplay":"https://cdn.test/wm.mp4","play":"https://cdn.test/clean.mp4"}}"#),
        );
        let (_, resolver) = build_resolver(client, vec![spec("p1", &["data.play", "data.wmplay"])]);

        let result = resolver.resolve(PlatformKind::TikTok, SOURCE).await;
        assert_eq!(result.download_url(), Some("https://cdn.test/clean.mp4"));
    }

    #[tokio::test]
    async fn test_scheme_relative_result_is_absolute() {
        let client = ScriptedClient::new()
            .route("https://p1.test", Reply::json(r#"{"data":{"play":"//cdn.example.com/v.mp4"}}"#));
        let (_, resolver) = build_resolver(client, vec![spec("p1", &["data.play"])]);

        let result = resolver.resolve(PlatformKind::TikTok, SOURCE).await;
        assert_eq!(result.download_url(), Some("https://cdn.example.com/v.mp4"));
    }

    #[tokio::test]
    async fn test_every_failure_kind_advances_chain() {
        let client = ScriptedClient::new()
            .route("https://p1.test", Reply::Fail(ProviderError::Network("refused".to_string())))
            .route("https://p2.test", Reply::status(503))
            .route("https://p3.test", Reply::json(r#"{"data":{}}"#))
            .route("https://p4.test", Reply::json(r#"{"data":{"play":""}}"#))
            .route("https://p5.test", Reply::Hang)
            .route("https://p6.test", Reply::json(r#"{"url":"//ok.test/v.mp4"}"#));
        let (client, resolver) = build_resolver(
            client,
            vec![
                spec("p1", &["url"]),
                spec("p2", &["url"]),
                spec("p3", &["data.play"]),
                spec("p4", &["data.play"]),
                spec("p5", &["url"]),
                spec("p6", &["url"]),
            ],
        );

        let result = resolver.resolve(PlatformKind::TikTok, SOURCE).await;

        assert_eq!(result.provider_used(), Some("p6"));
        assert_eq!(result.download_url(), Some("https://ok.test/v.mp4"));
        assert_eq!(client.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_all_failing_is_exhausted() {
        let client = ScriptedClient::new()
            .route("https://p1.test", Reply::status(500))
            .route("https://p2.test", Reply::json(r#"{"msg":"rate limited"}"#));
        let (client, resolver) = build_resolver(client, vec![spec("p1", &["url"]), spec("p2", &["url"])]);

        let result = resolver.resolve(PlatformKind::TikTok, SOURCE).await;
        assert_eq!(result, ResolutionResult::Exhausted);
        // each provider tried exactly once
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_platform_makes_no_requests() {
        let (client, resolver) = build_resolver(ScriptedClient::new(), vec![spec("p1", &["url"])]);

        let result = resolver.resolve(PlatformKind::Unknown, "https://example.com/x").await;
        assert_eq!(result, ResolutionResult::Exhausted);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_reported_per_provider() {
        let (_, resolver) = build_resolver(
            ScriptedClient::new().route("https://p1.test", Reply::Hang),
            vec![spec("p1", &["url"])],
        );
        let provider = &resolver.table().providers_for(PlatformKind::TikTok)[0];

        let err = resolver.try_provider(provider, SOURCE).await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout(200));
    }

    #[tokio::test]
    async fn test_closed_resolver_makes_no_requests() {
        let (client, resolver) = build_resolver(
            ScriptedClient::new().route("https://p1.test", Reply::json(r#"{"url":"https://cdn.test/a.mp4"}"#)),
            vec![spec("p1", &["url"])],
        );

        assert!(resolver.close().await);
        assert!(resolver.is_closed().await);

        let result = resolver.resolve(PlatformKind::TikTok, SOURCE).await;
        assert_eq!(result, ResolutionResult::Exhausted);
        assert!(client.calls().is_empty());

        let provider = &resolver.table().providers_for(PlatformKind::TikTok)[0];
        let err = resolver.try_provider(provider, SOURCE).await.unwrap_err();
        assert_eq!(err, ProviderError::Client(ClientError::Closed));
    }

    #[tokio::test]
    async fn test_factory_client_is_built_on_first_resolve() {
        let client: Arc<dyn HttpClient> = Arc::new(
            ScriptedClient::new().route("https://p1.test", Reply::json(r#"{"url":"https://cdn.test/a.mp4"}"#)),
        );
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let factory: ClientFactory = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(client.clone())
        });
        let table = ProviderTable::empty().with_platform(PlatformKind::TikTok, vec![spec("p1", &["url"])]);
        let resolver = ProviderResolver::with_factory(factory, table);

        assert_eq!(builds.load(Ordering::SeqCst), 0);
        resolver.resolve(PlatformKind::TikTok, SOURCE).await;
        resolver.resolve(PlatformKind::TikTok, SOURCE).await;
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_interpret_response_fixtures() {
        let tikwm = ProviderTable::builtin().providers_for(PlatformKind::TikTok)[0].clone();
        let ok = HttpResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: br#"{"code":0,"data":{"play":"https://v16.tikwm.test/a.mp4","wmplay":"https://v16.tikwm.test/wm.mp4"}}"#.to_vec(),
        };
        assert_eq!(
            interpret_response(&tikwm, &ok).unwrap(),
            "https://v16.tikwm.test/a.mp4"
        );

        let empty = HttpResponse {
            status: 200,
            content_type: None,
            body: br#"{"code":-1,"msg":"Url parsing is failed!"}"#.to_vec(),
        };
        assert_eq!(interpret_response(&tikwm, &empty), Err(ProviderError::NoMatch));

        let garbage = HttpResponse {
            status: 200,
            content_type: None,
            body: b"<html>".to_vec(),
        };
        assert!(matches!(
            interpret_response(&tikwm, &garbage),
            Err(ProviderError::Parse(_))
        ));
    }
}
