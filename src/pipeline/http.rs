// reqwest-backed HttpClient

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::errors::ProviderError;
use super::models::NetworkConfig;
use super::traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

/// One long-lived reqwest client with optional proxy
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(config: &NetworkConfig) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ProviderError::Network(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        let timeout_ms = request.timeout.as_millis() as u64;

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        }
        .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }

        let mut response = builder.send().await.map_err(|e| match ProviderError::from(e) {
            ProviderError::Timeout(_) => ProviderError::Timeout(timeout_ms),
            other => other,
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let (Some(limit), Some(len)) = (request.max_body_bytes, response.content_length()) {
            if len as usize > limit {
                return Err(ProviderError::TooLarge { limit });
            }
        }

        // Read chunk-wise so the cap also holds when Content-Length is missing
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| match ProviderError::from(e) {
            ProviderError::Timeout(_) => ProviderError::Timeout(timeout_ms),
            other => other,
        })? {
            body.extend_from_slice(&chunk);
            if let Some(limit) = request.max_body_bytes {
                if body.len() > limit {
                    return Err(ProviderError::TooLarge { limit });
                }
            }
        }

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_without_proxy() {
        assert!(ReqwestClient::new(&NetworkConfig::default()).is_ok());
    }

    #[test]
    fn test_builds_with_socks_proxy() {
        let config = NetworkConfig {
            proxy: Some("socks5h://127.0.0.1:1080".to_string()),
            ..NetworkConfig::default()
        };
        assert!(ReqwestClient::new(&config).is_ok());
    }
}
