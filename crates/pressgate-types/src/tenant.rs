//! Tenant records
//!
//! A tenant is an isolated customer account on the platform. Tenant records
//! are created during onboarding (out of scope for the pipeline) and are
//! read-only here except for cached copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quota::PlanLimits;

/// Lifecycle status of a tenant account.
///
/// Status is evaluated after resolution, not folded into "not found": a
/// suspended tenant is a different user-facing condition (403) than an
/// unknown one (404).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Suspended,
    Expired,
    Deleted,
}

/// Subscription plan tier controlling resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Starter,
    Pro,
    Unlimited,
}

impl PlanTier {
    /// Resource limits for this tier. `None` means unlimited.
    pub fn limits(&self) -> PlanLimits {
        match self {
            PlanTier::Free => PlanLimits {
                max_articles: Some(10),
                max_users: Some(1),
                max_api_requests: Some(10_000),
            },
            PlanTier::Starter => PlanLimits {
                max_articles: Some(100),
                max_users: Some(5),
                max_api_requests: Some(100_000),
            },
            PlanTier::Pro => PlanLimits {
                max_articles: Some(1_000),
                max_users: Some(25),
                max_api_requests: Some(1_000_000),
            },
            PlanTier::Unlimited => PlanLimits {
                max_articles: None,
                max_users: None,
                max_api_requests: None,
            },
        }
    }
}

/// An isolated customer account owning all data and quotas scoped to it.
///
/// Invariant: exactly one active tenant may own a given subdomain or custom
/// domain at a time (enforced at onboarding, relied upon here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique identifier for this tenant
    pub id: Uuid,

    /// URL-safe short name
    pub slug: String,

    /// Subdomain under the platform base domain (e.g. `acme` in
    /// `acme.pressgate.io`)
    pub subdomain: String,

    /// Optional custom domain pointing at this tenant
    pub custom_domain: Option<String>,

    /// Account lifecycle status
    pub status: TenantStatus,

    /// Subscription plan tier
    pub plan: PlanTier,

    /// Opaque per-tenant settings blob
    pub settings: serde_json::Value,

    /// When this tenant was created
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Create an active tenant with defaults suitable for tests and fixtures.
    pub fn new(slug: impl Into<String>, plan: PlanTier) -> Self {
        let slug = slug.into();
        Self {
            id: Uuid::new_v4(),
            subdomain: slug.clone(),
            slug,
            custom_domain: None,
            status: TenantStatus::Active,
            plan,
            settings: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Set a custom domain.
    pub fn with_custom_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }

    /// Set the lifecycle status.
    pub fn with_status(mut self, status: TenantStatus) -> Self {
        self.status = status;
        self
    }
}
