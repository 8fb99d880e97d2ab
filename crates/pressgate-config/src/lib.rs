//! # Pressgate Config
//!
//! Handles configuration loading from files and environment variables.
//! Environment variables use the `PRESSGATE` prefix with `__` as the section
//! separator, e.g. `PRESSGATE__AUTH__ACCESS_SECRET`.

pub mod validation;

use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Platform base domain; `Host: {slug}.{base_domain}` resolves by
    /// subdomain, anything else is treated as a custom domain.
    #[serde(default = "default_base_domain")]
    pub base_domain: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_domain() -> String {
    "pressgate.dev".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,

    pub connection_string: Option<String>,

    /// Bound on every synchronous store call on the request path
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_store_timeout_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for access tokens; must be set and distinct from the
    /// refresh secret
    #[serde(default)]
    pub access_secret: String,

    /// HS256 secret for refresh tokens
    #[serde(default)]
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_ttl_seconds")]
    pub access_ttl_seconds: u64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_ttl_seconds")]
    pub refresh_ttl_seconds: u64,
}

fn default_access_ttl_seconds() -> u64 {
    3600 // 1 hour
}

fn default_refresh_ttl_seconds() -> u64 {
    2_592_000 // 30 days
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_max_capacity")]
    pub max_capacity: u64,

    /// Tenant resolution cache TTL in seconds
    #[serde(default = "default_tenant_ttl_seconds")]
    pub tenant_ttl_seconds: u64,

    /// Quota snapshot cache TTL in seconds
    #[serde(default = "default_quota_ttl_seconds")]
    pub quota_ttl_seconds: u64,
}

fn default_cache_max_capacity() -> u64 {
    10_000
}

fn default_tenant_ttl_seconds() -> u64 {
    3600
}

fn default_quota_ttl_seconds() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Hourly budget applied to session traffic, which has no per-key limit
    #[serde(default = "default_rate_limit_per_hour")]
    pub default_rate_limit_per_hour: u32,

    /// Rate-limit window sweeper interval in seconds
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Soft-limit fraction at which quota warnings attach
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold: f64,
}

fn default_rate_limit_per_hour() -> u32 {
    1000
}

fn default_sweep_interval_seconds() -> u64 {
    300
}

fn default_warn_threshold() -> f64 {
    0.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_domain: default_base_domain(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            connection_string: None,
            timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_ttl_seconds: default_access_ttl_seconds(),
            refresh_ttl_seconds: default_refresh_ttl_seconds(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_max_capacity(),
            tenant_ttl_seconds: default_tenant_ttl_seconds(),
            quota_ttl_seconds: default_quota_ttl_seconds(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_rate_limit_per_hour: default_rate_limit_per_hour(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            warn_threshold: default_warn_threshold(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Load configuration from file and environment
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let builder = ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).required(false))
        .add_source(Environment::with_prefix("PRESSGATE").separator("__"))
        .build()?;

    builder.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.base_domain, "pressgate.dev");
        assert_eq!(config.store.timeout_ms, 500);
        assert_eq!(config.auth.access_ttl_seconds, 3600);
        assert_eq!(config.cache.quota_ttl_seconds, 300);
        assert!((config.limits.warn_threshold - 0.8).abs() < f64::EPSILON);
    }
}
