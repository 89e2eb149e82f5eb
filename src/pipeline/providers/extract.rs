// Field-path extraction and URL normalization for provider responses

use reqwest::Url;
use serde_json::Value;
use std::fmt;

use crate::pipeline::errors::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Dotted path into a JSON document, e.g. `data.play` or `picker.0.url`.
///
/// Numeric segments index into arrays; on objects they are treated as keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(i) => Segment::Index(i),
                Err(_) => Segment::Key(s.to_string()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        if self.segments.is_empty() {
            return None;
        }
        self.segments.iter().try_fold(root, |node, seg| match seg {
            Segment::Key(key) => node.get(key.as_str()),
            Segment::Index(i) => match node {
                Value::Array(items) => items.get(*i),
                Value::Object(map) => map.get(&i.to_string()),
                _ => None,
            },
        })
    }

    /// Non-empty string at this path, trimmed
    pub fn lookup_str<'a>(&self, root: &'a Value) -> Option<&'a str> {
        self.lookup(root)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Apply `paths` in priority order; first present non-empty string wins.
pub fn extract_first<'a, 'p>(
    root: &'a Value,
    paths: &'p [FieldPath],
) -> Option<(&'a str, &'p FieldPath)> {
    paths
        .iter()
        .find_map(|p| p.lookup_str(root).map(|v| (v, p)))
}

/// Turn an extracted value into an absolute http(s) URL.
///
/// `//host/x` gets `https:`; `/x` is joined onto the provider's origin; a bare
/// `host/x` gets `https://`. Anything that still fails to parse is rejected.
pub fn normalize_media_url(value: &str, endpoint: &str) -> Result<String, ProviderError> {
    let value = value.trim();
    let lower = value.to_lowercase();

    let candidate = if lower.starts_with("https://") || lower.starts_with("http://") {
        value.to_string()
    } else if value.starts_with("//") {
        format!("https:{}", value)
    } else if value.starts_with('/') {
        let base = Url::parse(endpoint).map_err(|_| ProviderError::InvalidUrl(value.to_string()))?;
        base.join(value)
            .map_err(|_| ProviderError::InvalidUrl(value.to_string()))?
            .to_string()
    } else if has_scheme(&lower) {
        return Err(ProviderError::InvalidUrl(value.to_string()));
    } else {
        format!("https://{}", value)
    };

    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(candidate)
        }
        _ => Err(ProviderError::InvalidUrl(value.to_string())),
    }
}

// e.g. "data:", "blob:", "javascript:": never fetchable media
fn has_scheme(lower: &str) -> bool {
    match lower.find(':') {
        Some(idx) => {
            let scheme = &lower[..idx];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && !lower[idx + 1..].chars().next().map_or(false, |c| c.is_ascii_digit())
        }
        None => false,
    }
}
