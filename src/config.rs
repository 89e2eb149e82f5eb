// Application configuration: defaults -> TOML file -> environment

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::caption::CaptionConfig;
use crate::pipeline::models::NetworkConfig;
use crate::pipeline::providers::ProviderTable;
use crate::pipeline::relay::RelayConfig;
use crate::sinks::TelegramConfig;

pub const ENV_TELEGRAM_TOKEN: &str = "SOCIAL_RELAY_TELEGRAM_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "SOCIAL_RELAY_TELEGRAM_CHAT_ID";
pub const ENV_PROXY: &str = "SOCIAL_RELAY_PROXY";
pub const ENV_LOG_LEVEL: &str = "SOCIAL_RELAY_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Optional credential pair; both halves are needed to enable the sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    /// Overrides every provider's timeout
    pub timeout_ms: Option<u64>,
    pub disabled_providers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    pub timeout_secs: u64,
    pub max_media_bytes: Option<usize>,
}

impl Default for RelaySection {
    fn default() -> Self {
        let defaults = RelayConfig::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            max_media_bytes: defaults.max_media_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramSection,
    pub network: NetworkConfig,
    pub resolver: ResolverSection,
    pub relay: RelaySection,
    pub caption: CaptionConfig,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramSection::default(),
            network: NetworkConfig::default(),
            resolver: ResolverSection::default(),
            relay: RelaySection::default(),
            caption: CaptionConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/social-relay/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("social-relay").join("config.toml"))
    }

    /// Load from `path` (or the default location if it exists), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let config = match file {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path, source })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };

        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay values from an environment lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ENV_TELEGRAM_TOKEN) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = non_empty(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(proxy) = non_empty(ENV_PROXY) {
            self.network.proxy = Some(proxy);
        }
        if let Some(level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let token = self.telegram.bot_token.as_deref().map_or(false, |t| !t.is_empty());
        let chat = self.telegram.chat_id.as_deref().map_or(false, |c| !c.is_empty());
        if token != chat {
            return Err(ConfigError::Invalid(
                "telegram.bot_token and telegram.chat_id must be set together".to_string(),
            ));
        }
        if self.relay.timeout_secs == 0 {
            return Err(ConfigError::Invalid("relay.timeout_secs must be positive".to_string()));
        }
        if self.resolver.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("resolver.timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_telegram(mut self, bot_token: &str, chat_id: &str) -> Self {
        self.telegram = TelegramSection {
            bot_token: Some(bot_token.to_string()),
            chat_id: Some(chat_id.to_string()),
        };
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.network.proxy = proxy;
        self
    }

    pub fn with_provider_timeout(mut self, millis: Option<u64>) -> Self {
        self.resolver.timeout_ms = millis;
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    /// Sink credentials, if both halves are present
    pub fn telegram_config(&self) -> Option<TelegramConfig> {
        match (&self.telegram.bot_token, &self.telegram.chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
                Some(TelegramConfig {
                    bot_token: token.clone(),
                    chat_id: chat_id.clone(),
                })
            }
            _ => None,
        }
    }

    /// Built-in providers with this config's overrides applied
    pub fn provider_table(&self) -> ProviderTable {
        let mut table = ProviderTable::builtin();
        for name in &self.resolver.disabled_providers {
            table = table.without_provider(name);
        }
        if let Some(ms) = self.resolver.timeout_ms {
            table = table.with_timeout(Duration::from_millis(ms));
        }
        table
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            timeout: Duration::from_secs(self.relay.timeout_secs),
            max_media_bytes: self.relay.max_media_bytes,
        }
    }
}
