// Resolver provider table
//
// Each platform owns an ordered list of "no-watermark" services. Order is the
// fallback order used by the resolver; the first entry is tried first.

pub mod extract;

use lazy_static::lazy_static;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use super::models::PlatformKind;
use super::traits::{HttpMethod, HttpRequest};

pub use extract::{extract_first, normalize_media_url, FieldPath};

/// One resolver endpoint and how to read its answer
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    /// Identifier reported in `ResolutionResult::Success`
    pub name: String,
    pub method: HttpMethod,
    /// Endpoint URL; `{url}` is replaced by the URL-encoded source
    pub endpoint: String,
    /// POST only: JSON body field carrying the source URL
    pub body_url_field: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Extraction rules in priority order
    pub field_paths: Vec<FieldPath>,
    pub timeout: Duration,
}

impl ProviderSpec {
    pub fn get(name: &str, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            method: HttpMethod::Get,
            endpoint: endpoint.to_string(),
            body_url_field: None,
            headers: Vec::new(),
            field_paths: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn post_json(name: &str, endpoint: &str, body_url_field: &str) -> Self {
        Self {
            method: HttpMethod::Post,
            body_url_field: Some(body_url_field.to_string()),
            ..Self::get(name, endpoint)
        }
    }

    pub fn with_paths(mut self, paths: &[&str]) -> Self {
        self.field_paths = paths.iter().map(|p| FieldPath::parse(p)).collect();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the outbound request for `source_url`
    pub fn build_request(&self, source_url: &str) -> HttpRequest {
        let url = self
            .endpoint
            .replace("{url}", &urlencoding::encode(source_url));

        let mut request = match (self.method, &self.body_url_field) {
            (HttpMethod::Post, Some(field)) => {
                HttpRequest::post_json(url, json!({ field.as_str(): source_url }), self.timeout)
            }
            (HttpMethod::Post, None) => HttpRequest::post_json(url, json!({}), self.timeout),
            (HttpMethod::Get, _) => HttpRequest::get(url, self.timeout),
        };

        for (name, value) in &self.headers {
            request = request.with_header(name.clone(), value.clone());
        }
        request
    }
}

/// Ordered provider lists keyed by platform
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    entries: HashMap<PlatformKind, Vec<ProviderSpec>>,
}

impl ProviderTable {
    /// Empty table; every platform resolves to `Exhausted`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in services for every supported platform
    pub fn builtin() -> Self {
        BUILTIN_PROVIDERS.clone()
    }

    pub fn with_platform(mut self, platform: PlatformKind, providers: Vec<ProviderSpec>) -> Self {
        self.entries.insert(platform, providers);
        self
    }

    pub fn providers_for(&self, platform: PlatformKind) -> &[ProviderSpec] {
        self.entries
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop a provider (by name) from every platform
    pub fn without_provider(mut self, name: &str) -> Self {
        for list in self.entries.values_mut() {
            list.retain(|p| !p.name.eq_ignore_ascii_case(name));
        }
        self
    }

    /// Override every provider's timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        for spec in self.entries.values_mut().flatten() {
            spec.timeout = timeout;
        }
        self
    }
}

const COBALT_ENDPOINT: &str = "https://api.cobalt.tools/";

fn cobalt(paths: &[&str]) -> ProviderSpec {
    ProviderSpec::post_json("cobalt", COBALT_ENDPOINT, "url")
        .with_header("Accept", "application/json")
        .with_paths(paths)
        .with_timeout(Duration::from_secs(15))
}

lazy_static! {
    static ref BUILTIN_PROVIDERS: ProviderTable = ProviderTable::empty()
        .with_platform(
            PlatformKind::TikTok,
            vec![
                ProviderSpec::get("tikwm", "https://www.tikwm.com/api/?url={url}&hd=1")
                    .with_paths(&["data.play", "data.wmplay", "data.hdplay", "url"]),
                ProviderSpec::get("tiklydown", "https://api.tiklydown.eu.org/api/download?url={url}")
                    .with_paths(&["video.noWatermark", "video.watermark", "url"]),
                cobalt(&["url"]),
            ],
        )
        .with_platform(
            PlatformKind::Instagram,
            vec![
                cobalt(&["url", "picker.0.url"]),
                ProviderSpec::get("igdownloader", "https://api.igdownloader.app/api/media?url={url}")
                    .with_paths(&["data.0.url", "media.0.url", "url"]),
            ],
        )
        .with_platform(
            PlatformKind::YouTubeShorts,
            vec![
                cobalt(&["url"]),
                ProviderSpec::get("ytshorts", "https://api.ytshorts.app/v1/fetch?url={url}")
                    .with_paths(&["data.url", "download_url", "url"]),
            ],
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_supported_platforms() {
        let table = ProviderTable::builtin();
        assert_eq!(table.providers_for(PlatformKind::TikTok)[0].name, "tikwm");
        assert!(!table.providers_for(PlatformKind::Instagram).is_empty());
        assert!(!table.providers_for(PlatformKind::YouTubeShorts).is_empty());
        assert!(table.providers_for(PlatformKind::Unknown).is_empty());
    }

    #[test]
    fn test_tikwm_path_order() {
        let table = ProviderTable::builtin();
        let tikwm = &table.providers_for(PlatformKind::TikTok)[0];
        let order: Vec<&str> = tikwm.field_paths.iter().map(FieldPath::as_str).collect();
        assert_eq!(order, vec!["data.play", "data.wmplay", "data.hdplay", "url"]);
    }

    #[test]
    fn test_get_request_encodes_source() {
        let spec = ProviderSpec::get("p", "https://api.test/?url={url}");
        let req = spec.build_request("https://www.tiktok.com/@a/video/1?x=1&y=2");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://api.test/?url=https%3A%2F%2Fwww.tiktok.com%2F%40a%2Fvideo%2F1%3Fx%3D1%26y%3D2"
        );
        assert!(req.json_body.is_none());
    }

    #[test]
    fn test_post_request_carries_body_and_headers() {
        let req = cobalt(&["url"]).build_request("https://youtu.be/abc");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, COBALT_ENDPOINT);
        assert_eq!(req.json_body, Some(json!({ "url": "https://youtu.be/abc" })));
        assert!(req.headers.iter().any(|(k, v)| k == "Accept" && v == "application/json"));
        assert_eq!(req.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_without_provider_and_timeout_override() {
        let table = ProviderTable::builtin()
            .without_provider("cobalt")
            .with_timeout(Duration::from_millis(500));
        let tiktok = table.providers_for(PlatformKind::TikTok);
        assert!(tiktok.iter().all(|p| p.name != "cobalt"));
        assert!(tiktok.iter().all(|p| p.timeout == Duration::from_millis(500)));
        assert_eq!(table.providers_for(PlatformKind::YouTubeShorts).len(), 1);
    }
}
