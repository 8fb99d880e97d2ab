//! # Pressgate Types
//!
//! Shared domain types for the Pressgate request pipeline: tenants, API key
//! records, session claims, quota snapshots, the enriched request context,
//! and the error taxonomy every pipeline stage reports through.

#![deny(unsafe_code)]

/// Request context attached to authenticated requests
pub mod context;
/// API key records, capabilities and roles
pub mod credential;
/// Error taxonomy for pipeline decisions
pub mod error;
/// Quota snapshots and plan limits
pub mod quota;
/// JWT session claims
pub mod session;
/// Tenant records and status
pub mod tenant;

pub use context::{CallerIdentity, RequestContext};
pub use credential::{ApiKeyRecord, Capability, CapabilitySet, Role, UserAccount, ValidatedKey};
pub use error::{
    CredentialError, InfrastructureError, PermissionError, PipelineError, QuotaError, StoreResult,
    TenantError,
};
pub use quota::{PlanLimits, QuotaCheck, QuotaSnapshot, RateLimitDecision, ResourceKind};
pub use session::{SessionClaims, TokenUse};
pub use tenant::{PlanTier, Tenant, TenantStatus};
