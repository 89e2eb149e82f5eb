// Caption rendering for relayed media

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::models::{CaptionMeta, PlatformKind};

lazy_static! {
    static ref HASHTAG_RE: Regex = Regex::new(r"#\w+").unwrap();
}

/// Pull `#tags` out of free text, in order of appearance
pub fn extract_hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Compact count: 999, 1.2K, 3.4M, 1.1B
pub fn format_count(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000, "K"), (1_000_000, "M"), (1_000_000_000, "B")];

    let mut unit = match UNITS.iter().rposition(|(scale, _)| n >= *scale) {
        Some(unit) => unit,
        None => return n.to_string(),
    };
    let tenths = |scale: u64| (n as f64 / scale as f64 * 10.0).round() / 10.0;

    let mut value = tenths(UNITS[unit].0);
    // 999_999 rounds to 1000K; show it as 1M
    if value >= 1000.0 && unit + 1 < UNITS.len() {
        unit += 1;
        value = tenths(UNITS[unit].0);
    }

    let text = format!("{:.1}", value);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{}{}", text, UNITS[unit].1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Max characters of description before truncation
    pub description_limit: usize,
    pub max_hashtags: usize,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            description_limit: 200,
            max_hashtags: 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaptionBuilder {
    config: CaptionConfig,
}

impl CaptionBuilder {
    pub fn new(config: CaptionConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, platform: PlatformKind, source_url: &str, meta: &CaptionMeta) -> String {
        let mut lines = vec![format!("{} {}", platform.icon(), platform.label())];

        if let Some(description) = meta.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            lines.push(truncate(description, self.config.description_limit));
        }

        let counts: Vec<String> = [("👁", meta.views), ("❤️", meta.likes), ("💬", meta.comments)]
            .into_iter()
            .filter_map(|(icon, n)| n.map(|n| format!("{} {}", icon, format_count(n))))
            .collect();
        if !counts.is_empty() {
            lines.push(counts.join("  "));
        }

        lines.push(format!("🔗 {}", source_url));

        let hashtags = if meta.hashtags.is_empty() {
            meta.description
                .as_deref()
                .map(extract_hashtags)
                .unwrap_or_default()
        } else {
            meta.hashtags.clone()
        };
        let tags: Vec<String> = hashtags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| if t.starts_with('#') { t.to_string() } else { format!("#{}", t) })
            .take(self.config.max_hashtags)
            .collect();
        if !tags.is_empty() {
            lines.push(tags.join(" "));
        }

        lines.join("\n")
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}…", cut.trim_end())
}
