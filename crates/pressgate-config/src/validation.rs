//! Configuration validation
//!
//! Validates configuration values and ensures consistency before the
//! pipeline is built from them.

use crate::{AuthConfig, CacheConfig, Config, LimitsConfig, ServerConfig, StoreConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number: {0}")]
    InvalidPort(u16),

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Base domain must not be empty")]
    MissingBaseDomain,

    #[error("Invalid backend: {0} (must be one of: memory)")]
    InvalidBackend(String),

    #[error("Invalid store timeout: {0}ms (must be > 0)")]
    InvalidStoreTimeout(u64),

    #[error("Auth secret {0} must be set")]
    MissingSecret(&'static str),

    #[error("Access and refresh secrets must be distinct")]
    SharedSecret,

    #[error("Invalid token TTL: {0}s (must be > 0)")]
    InvalidTokenTtl(u64),

    #[error("Invalid cache capacity: {0} (must be > 0)")]
    InvalidCacheCapacity(u64),

    #[error("Invalid cache TTL: {0}s (must be > 0)")]
    InvalidCacheTtl(u64),

    #[error("Invalid rate limit: {0} (must be > 0)")]
    InvalidRateLimit(u32),

    #[error("Invalid warn threshold: {0} (must be within (0, 1])")]
    InvalidWarnThreshold(f64),

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate complete configuration
pub fn validate(config: &Config) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_server(&config.server) {
        errors.push(e);
    }

    if let Err(e) = validate_store(&config.store) {
        errors.push(e);
    }

    if let Err(e) = validate_auth(&config.auth) {
        errors.push(e);
    }

    if let Err(e) = validate_cache(&config.cache) {
        errors.push(e);
    }

    if let Err(e) = validate_limits(&config.limits) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.swap_remove(0))
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

pub fn validate_server(config: &ServerConfig) -> ValidationResult<()> {
    if config.port == 0 {
        return Err(ValidationError::InvalidPort(config.port));
    }
    if config.host.is_empty() {
        return Err(ValidationError::InvalidHost(config.host.clone()));
    }
    if config.base_domain.trim().is_empty() {
        return Err(ValidationError::MissingBaseDomain);
    }
    Ok(())
}

pub fn validate_store(config: &StoreConfig) -> ValidationResult<()> {
    if config.backend != "memory" {
        return Err(ValidationError::InvalidBackend(config.backend.clone()));
    }
    if config.timeout_ms == 0 {
        return Err(ValidationError::InvalidStoreTimeout(config.timeout_ms));
    }
    Ok(())
}

pub fn validate_auth(config: &AuthConfig) -> ValidationResult<()> {
    if config.access_secret.trim().is_empty() {
        return Err(ValidationError::MissingSecret("access_secret"));
    }
    if config.refresh_secret.trim().is_empty() {
        return Err(ValidationError::MissingSecret("refresh_secret"));
    }
    if config.access_secret == config.refresh_secret {
        return Err(ValidationError::SharedSecret);
    }
    if config.access_ttl_seconds == 0 {
        return Err(ValidationError::InvalidTokenTtl(config.access_ttl_seconds));
    }
    if config.refresh_ttl_seconds == 0 {
        return Err(ValidationError::InvalidTokenTtl(config.refresh_ttl_seconds));
    }
    Ok(())
}

pub fn validate_cache(config: &CacheConfig) -> ValidationResult<()> {
    if config.max_capacity == 0 {
        return Err(ValidationError::InvalidCacheCapacity(config.max_capacity));
    }
    if config.tenant_ttl_seconds == 0 {
        return Err(ValidationError::InvalidCacheTtl(config.tenant_ttl_seconds));
    }
    if config.quota_ttl_seconds == 0 {
        return Err(ValidationError::InvalidCacheTtl(config.quota_ttl_seconds));
    }
    Ok(())
}

pub fn validate_limits(config: &LimitsConfig) -> ValidationResult<()> {
    if config.default_rate_limit_per_hour == 0 {
        return Err(ValidationError::InvalidRateLimit(config.default_rate_limit_per_hour));
    }
    if !(config.warn_threshold > 0.0 && config.warn_threshold <= 1.0) {
        return Err(ValidationError::InvalidWarnThreshold(config.warn_threshold));
    }
    Ok(())
}
