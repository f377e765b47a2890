//! Server settings.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. `memento.toml` (or `.yaml`/`.json`) in the working directory, if present
//! 3. environment variables prefixed with `MEMENTO`, `__` between sections
//!    (`MEMENTO__CACHE__PROVIDER=redis`, `MEMENTO__SERVER__PORT=9000`)

use std::net::SocketAddr;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use memento_core::{LockBehavior, MAX_TTL_SECONDS, MIN_TTL_SECONDS};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::CacheServiceOptions;

const CONFIG_BASENAME: &str = "memento";
const ENV_PREFIX: &str = "MEMENTO";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Storage backend of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub provider: ProviderKind,
    /// Required when `provider = "redis"`.
    pub redis_url: Option<String>,
    /// Prepended by the Redis provider to every key it touches.
    pub redis_key_prefix: String,
    /// First segment of every cache key.
    pub key_prefix: String,
    pub default_ttl_seconds: u64,
    pub compression_threshold_bytes: usize,
    pub enable_stats: bool,
    pub lock_timeout_ms: u64,
    pub lock_behavior: LockBehavior,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let options = CacheServiceOptions::default();
        Self {
            provider: ProviderKind::Memory,
            redis_url: None,
            redis_key_prefix: String::new(),
            key_prefix: options.key_prefix,
            default_ttl_seconds: options.default_ttl,
            compression_threshold_bytes: options.compression_threshold,
            enable_stats: options.enable_stats,
            lock_timeout_ms: options.lock_timeout_ms,
            lock_behavior: options.lock_behavior,
        }
    }
}

impl CacheSettings {
    /// Service options derived from these settings.
    pub fn service_options(&self) -> CacheServiceOptions {
        CacheServiceOptions {
            default_ttl: self.default_ttl_seconds,
            compression_threshold: self.compression_threshold_bytes,
            key_prefix: self.key_prefix.clone(),
            enable_stats: self.enable_stats,
            lock_timeout_ms: self.lock_timeout_ms,
            lock_behavior: self.lock_behavior,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cache: CacheSettings,
}

impl Settings {
    /// Loads settings from the optional config file and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_BASENAME).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        Self::from_builder(builder)
    }

    /// Builds and validates settings from an arbitrary source stack.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Socket address the server binds to.
    pub fn addr(&self) -> Result<SocketAddr, SettingsError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| SettingsError::invalid("server.host", format!("{}", e)))
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let cache = &self.cache;

        if cache.provider == ProviderKind::Redis
            && cache.redis_url.as_deref().is_none_or(|u| u.trim().is_empty())
        {
            return Err(SettingsError::invalid(
                "cache.redis_url",
                "required when cache.provider is redis",
            ));
        }

        if !(MIN_TTL_SECONDS..=MAX_TTL_SECONDS).contains(&cache.default_ttl_seconds) {
            return Err(SettingsError::invalid(
                "cache.default_ttl_seconds",
                format!(
                    "must be between {} and {}",
                    MIN_TTL_SECONDS, MAX_TTL_SECONDS
                ),
            ));
        }

        if cache.lock_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "cache.lock_timeout_ms",
                "must be greater than zero",
            ));
        }

        if cache.key_prefix.trim().is_empty() {
            return Err(SettingsError::invalid(
                "cache.key_prefix",
                "cannot be empty",
            ));
        }

        self.addr()?;
        Ok(())
    }
}
