//! Tenant resolution with a read-through cache
//!
//! Resolves a tenant from one of four signals. Resolution order is decided by
//! the pipeline and is significant: a credential-derived tenant id is an
//! authenticated signal and always beats host-based inference, because a Host
//! header is attacker-controlled.
//!
//! Each signal is cached under a namespaced key with a fixed TTL; a miss
//! reads the store and populates the cache. Resolution is fail-closed: a
//! store failure denies rather than misattributing the request.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use pressgate_store::TenantStore;
use pressgate_types::{
    InfrastructureError, PipelineError, StoreResult, Tenant, TenantError, TenantStatus,
};

/// A tenant-resolution signal, ordered strongest-first by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantSignal {
    /// Tenant id derived from a validated credential
    Credential(Uuid),
    /// Tenant id hinted via the `X-Tenant-ID` header (not a credential)
    Header(Uuid),
    /// Full custom domain from the Host header
    CustomDomain(String),
    /// Subdomain under the platform base domain
    Subdomain(String),
}

impl TenantSignal {
    /// Namespaced cache key for this signal value.
    fn cache_key(&self) -> String {
        match self {
            TenantSignal::Credential(id) | TenantSignal::Header(id) => format!("id:{id}"),
            TenantSignal::CustomDomain(domain) => format!("dom:{domain}"),
            TenantSignal::Subdomain(sub) => format!("sub:{sub}"),
        }
    }
}

/// Resolves tenants from signals, with a short-TTL read-through cache.
pub struct TenantDirectory {
    store: Arc<dyn TenantStore>,
    cache: Cache<String, Tenant>,
    store_timeout: Duration,
}

impl TenantDirectory {
    /// Create a directory over a tenant store.
    ///
    /// `cache_ttl` bounds how stale a cached tenant may be (on the order of
    /// one hour); `store_timeout` bounds each store read.
    pub fn new(store: Arc<dyn TenantStore>, cache_ttl: Duration, store_timeout: Duration) -> Self {
        let cache = Cache::builder().max_capacity(10_000).time_to_live(cache_ttl).build();
        Self { store, cache, store_timeout }
    }

    /// Resolve a tenant from a signal.
    ///
    /// Returns [`TenantError::NotFound`] when nothing matches; store failures
    /// propagate (fail-closed). Status is NOT checked here — callers decide
    /// whether a suspended tenant is fatal via [`ensure_active`].
    ///
    /// [`ensure_active`]: TenantDirectory::ensure_active
    pub async fn resolve(&self, signal: &TenantSignal) -> Result<Tenant, PipelineError> {
        let key = signal.cache_key();

        if let Some(tenant) = self.cache.get(&key).await {
            return Ok(tenant);
        }

        let lookup = self.lookup(signal);
        let found = tokio::time::timeout(self.store_timeout, lookup)
            .await
            .map_err(|_| InfrastructureError::Timeout)?
            .map_err(PipelineError::Infrastructure)?;

        match found {
            Some(tenant) => {
                self.cache.insert(key, tenant.clone()).await;
                Ok(tenant)
            }
            None => Err(TenantError::NotFound.into()),
        }
    }

    async fn lookup(&self, signal: &TenantSignal) -> StoreResult<Option<Tenant>> {
        match signal {
            TenantSignal::Credential(id) | TenantSignal::Header(id) => {
                self.store.tenant_by_id(*id).await
            }
            TenantSignal::CustomDomain(domain) => {
                self.store.tenant_by_custom_domain(domain).await
            }
            TenantSignal::Subdomain(sub) => self.store.tenant_by_subdomain(sub).await,
        }
    }

    /// Map a non-active status to its distinct error outcome.
    pub fn ensure_active(tenant: &Tenant) -> Result<(), TenantError> {
        match tenant.status {
            TenantStatus::Active => Ok(()),
            TenantStatus::Suspended => Err(TenantError::Suspended),
            TenantStatus::Expired => Err(TenantError::Expired),
            TenantStatus::Deleted => Err(TenantError::Deleted),
        }
    }

    /// Drop cached entries for the given signals, e.g. after a tenant record
    /// changes upstream.
    pub async fn invalidate(&self, signals: &[TenantSignal]) {
        for signal in signals {
            self.cache.invalidate(&signal.cache_key()).await;
        }
    }
}
