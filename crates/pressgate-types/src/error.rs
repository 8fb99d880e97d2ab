//! Error taxonomy for pipeline decisions
//!
//! Each failure family is a distinct, inspectable enum — never a single
//! generic error — so the pipeline can apply its fail-open/fail-closed policy
//! per kind and callers can assert on specific outcomes. User-visible denial
//! bodies are built from these variants without leaking internal detail.

use thiserror::Error;

use crate::quota::ResourceKind;

/// Credential failures: missing, malformed, invalid or expired API keys and
/// session tokens. All map to 401 for callers, with distinct internal codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No API key was presented on a machine route
    #[error("API key required")]
    MissingApiKey,

    /// No session token was presented on a user route
    #[error("Authentication token required")]
    MissingToken,

    /// Credential is syntactically unusable (empty key, bad encoding)
    #[error("Malformed credential: {0}")]
    Malformed(String),

    /// No key record matches the presented key
    #[error("Unknown API key")]
    KeyNotFound,

    /// The key record exists but has been deactivated
    #[error("API key has been deactivated")]
    KeyInactive,

    /// The key record exists but its expiry has passed
    #[error("API key has expired")]
    KeyExpired,

    /// Token signature or structure is invalid
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token expiry has passed
    #[error("Token expired")]
    TokenExpired,

    /// Token identifier is present in the revocation set
    #[error("Token has been revoked")]
    TokenRevoked,
}

/// Tenant resolution failures. Suspended and expired tenants are different
/// user-facing conditions (403/402) than an unknown one (404).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantError {
    /// No tenant matches the resolution signal
    #[error("Tenant not found")]
    NotFound,

    /// Tenant account is suspended
    #[error("Tenant account is suspended")]
    Suspended,

    /// Tenant subscription has expired
    #[error("Tenant subscription has expired")]
    Expired,

    /// Tenant record has been deleted
    #[error("Tenant not found")]
    Deleted,

    /// Token tenant does not match the tenant resolved from the request host
    #[error("Token does not belong to this tenant")]
    Mismatch,
}

/// Traffic and billing quota failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuotaError {
    /// Hourly request budget exhausted
    #[error("Rate limit exceeded")]
    RateLimitExceeded {
        /// Configured hourly budget
        limit: u32,
        /// Epoch seconds at which the window resets
        reset_at: i64,
    },

    /// A plan resource cap has been reached
    #[error("Plan limit exceeded for {resource}", resource = .resource.as_str())]
    LimitExceeded {
        /// The metered resource that is capped
        resource: ResourceKind,
        /// Current usage
        current: u64,
        /// Plan cap
        limit: u64,
        /// All resources currently in violation
        violations: Vec<ResourceKind>,
    },
}

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The caller lacks the capability the route requires
    #[error("Insufficient permissions: {required} required")]
    Insufficient {
        /// The capability the route requires
        required: &'static str,
    },
}

/// Backing-store failures. Fail-closed stages surface these as 500; fail-open
/// stages log and swallow them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfrastructureError {
    /// Store call exceeded its bounded timeout
    #[error("Backing store timed out")]
    Timeout,

    /// Store is unreachable or returned a transport error
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    /// Invariant violation inside the store layer
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, InfrastructureError>;

/// Top-level pipeline failure, one variant per taxonomy family.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_are_distinct_outcomes() {
        assert_ne!(CredentialError::KeyNotFound, CredentialError::KeyInactive);
        assert_ne!(CredentialError::KeyInactive, CredentialError::KeyExpired);
        assert_ne!(TenantError::Suspended, TenantError::NotFound);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(CredentialError::TokenExpired.to_string(), "Token expired");
        assert_eq!(TenantError::Suspended.to_string(), "Tenant account is suspended");
        let err = QuotaError::LimitExceeded {
            resource: ResourceKind::Articles,
            current: 10,
            limit: 10,
            violations: vec![ResourceKind::Articles],
        };
        assert!(err.to_string().contains("articles"));
    }

    #[test]
    fn test_pipeline_error_from_families() {
        let err: PipelineError = CredentialError::KeyNotFound.into();
        assert!(matches!(err, PipelineError::Credential(CredentialError::KeyNotFound)));

        let err: PipelineError = InfrastructureError::Timeout.into();
        assert!(matches!(err, PipelineError::Infrastructure(_)));
    }

    #[test]
    fn test_infrastructure_display_does_not_leak_into_denial_variants() {
        // Denial payload construction only ever uses the generic message for
        // infrastructure failures; the detail stays in logs.
        let err = InfrastructureError::Unavailable("postgres://secret@host".into());
        assert!(err.to_string().contains("unavailable"));
    }
}
