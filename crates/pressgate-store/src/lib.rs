//! # Pressgate Store
//!
//! Async storage traits consumed by the pipeline, plus [`MemoryBackend`], an
//! in-memory implementation with fault injection used by tests and
//! single-node development.
//!
//! The pipeline never talks to a concrete database; every stage takes its
//! store as an `Arc<dyn Trait>` so it can be exercised against fakes.

#![deny(unsafe_code)]

/// In-memory backend with fault injection
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pressgate_types::{ApiKeyRecord, ResourceKind, StoreResult, Tenant, UserAccount};

pub use memory::MemoryBackend;

/// Read access to tenant records, one lookup per resolution signal.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Look up a tenant by id.
    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>>;

    /// Look up a tenant by its platform subdomain.
    async fn tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>>;

    /// Look up a tenant by a custom domain.
    async fn tenant_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Tenant>>;
}

/// Access to API key records, indexed by deterministic key hash.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Single indexed lookup by hashed key.
    async fn api_key_by_hash(&self, key_hash: &str) -> StoreResult<Option<ApiKeyRecord>>;

    /// Bump the last-used timestamp. Called off the request path; failures
    /// must never fail the request that triggered them.
    async fn touch_last_used(&self, key_id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
}

/// Read access to authoritative user state, re-read on token refresh.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by id.
    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>>;
}

/// Persistence for hourly rate-limit windows. The in-process cache is the
/// hot path; this store only seeds cold windows and absorbs asynchronous
/// increments so counts converge across restarts (best-effort).
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Persisted count for `(credential, window_start)`, zero if absent.
    async fn window_count(&self, credential: Uuid, window_start: i64) -> StoreResult<u64>;

    /// Increment the persisted count, returning the new value.
    async fn increment_window(&self, credential: Uuid, window_start: i64) -> StoreResult<u64>;
}

/// Per-tenant resource usage for quota snapshots, plus the request usage log.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Current usage per resource for a tenant.
    async fn usage_for_tenant(&self, tenant_id: Uuid)
        -> StoreResult<HashMap<ResourceKind, u64>>;

    /// Append a request to the usage log. Runs after the response is sent;
    /// failures are logged and swallowed (fail-open).
    async fn record_request(&self, tenant_id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
}
