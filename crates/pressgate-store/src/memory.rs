//! In-memory backend with fault injection
//!
//! Implements every store trait over `tokio::sync::RwLock` maps. The outage
//! switch makes every call fail with `InfrastructureError::Unavailable`,
//! which is how tests exercise the pipeline's fail-open/fail-closed policy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use pressgate_types::{
    ApiKeyRecord, InfrastructureError, ResourceKind, StoreResult, Tenant, UserAccount,
};

use crate::{ApiKeyStore, RateLimitStore, TenantStore, UsageStore, UserStore};

/// In-memory store backend.
#[derive(Default)]
pub struct MemoryBackend {
    tenants: RwLock<HashMap<Uuid, Tenant>>,
    api_keys: RwLock<HashMap<String, ApiKeyRecord>>,
    users: RwLock<HashMap<Uuid, UserAccount>>,
    windows: RwLock<HashMap<(Uuid, i64), u64>>,
    usage: RwLock<HashMap<Uuid, HashMap<ResourceKind, u64>>>,
    request_log: RwLock<Vec<(Uuid, DateTime<Utc>)>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    /// Empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the outage switch: while set, every store call fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(InfrastructureError::Unavailable("memory backend outage injected".into()))
        } else {
            Ok(())
        }
    }

    /// Insert or replace a tenant record.
    pub async fn insert_tenant(&self, tenant: Tenant) {
        self.tenants.write().await.insert(tenant.id, tenant);
    }

    /// Insert or replace an API key record.
    pub async fn insert_api_key(&self, record: ApiKeyRecord) {
        self.api_keys.write().await.insert(record.key_hash.clone(), record);
    }

    /// Insert or replace a user account.
    pub async fn insert_user(&self, user: UserAccount) {
        self.users.write().await.insert(user.id, user);
    }

    /// Set a tenant's usage counters.
    pub async fn set_usage(&self, tenant_id: Uuid, usage: HashMap<ResourceKind, u64>) {
        self.usage.write().await.insert(tenant_id, usage);
    }

    /// Number of logged requests for a tenant (test helper).
    pub async fn logged_requests(&self, tenant_id: Uuid) -> usize {
        self.request_log.read().await.iter().filter(|(t, _)| *t == tenant_id).count()
    }

    /// Last-used timestamp of a key, if bumped (test helper).
    pub async fn last_used(&self, key_hash: &str) -> Option<DateTime<Utc>> {
        self.api_keys.read().await.get(key_hash).and_then(|k| k.last_used_at)
    }
}

#[async_trait]
impl TenantStore for MemoryBackend {
    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>> {
        self.check_available()?;
        Ok(self.tenants.read().await.get(&id).cloned())
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>> {
        self.check_available()?;
        Ok(self.tenants.read().await.values().find(|t| t.subdomain == subdomain).cloned())
    }

    async fn tenant_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Tenant>> {
        self.check_available()?;
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .find(|t| t.custom_domain.as_deref() == Some(domain))
            .cloned())
    }
}

#[async_trait]
impl ApiKeyStore for MemoryBackend {
    async fn api_key_by_hash(&self, key_hash: &str) -> StoreResult<Option<ApiKeyRecord>> {
        self.check_available()?;
        Ok(self.api_keys.read().await.get(key_hash).cloned())
    }

    async fn touch_last_used(&self, key_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        self.check_available()?;
        let mut keys = self.api_keys.write().await;
        if let Some(record) = keys.values_mut().find(|k| k.id == key_id) {
            record.last_used_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        self.check_available()?;
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl RateLimitStore for MemoryBackend {
    async fn window_count(&self, credential: Uuid, window_start: i64) -> StoreResult<u64> {
        self.check_available()?;
        Ok(self.windows.read().await.get(&(credential, window_start)).copied().unwrap_or(0))
    }

    async fn increment_window(&self, credential: Uuid, window_start: i64) -> StoreResult<u64> {
        self.check_available()?;
        let mut windows = self.windows.write().await;
        let count = windows.entry((credential, window_start)).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

#[async_trait]
impl UsageStore for MemoryBackend {
    async fn usage_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> StoreResult<HashMap<ResourceKind, u64>> {
        self.check_available()?;
        Ok(self.usage.read().await.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn record_request(&self, tenant_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        self.check_available()?;
        self.request_log.write().await.push((tenant_id, at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressgate_types::{CapabilitySet, PlanTier};

    fn test_key(tenant_id: Uuid, hash: &str) -> ApiKeyRecord {
        ApiKeyRecord {
            id: Uuid::new_v4(),
            tenant_id,
            key_hash: hash.to_string(),
            permissions: CapabilitySet::normalize(&["read"]),
            rate_limit_per_hour: 100,
            expires_at: None,
            active: true,
            last_used_at: None,
        }
    }

    #[tokio::test]
    async fn test_tenant_lookup_by_each_signal() {
        let store = MemoryBackend::new();
        let tenant = Tenant::new("acme", PlanTier::Pro).with_custom_domain("blog.acme.com");
        let id = tenant.id;
        store.insert_tenant(tenant).await;

        assert!(store.tenant_by_id(id).await.unwrap().is_some());
        assert!(store.tenant_by_subdomain("acme").await.unwrap().is_some());
        assert!(store.tenant_by_custom_domain("blog.acme.com").await.unwrap().is_some());
        assert!(store.tenant_by_subdomain("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_outage_fails_every_call() {
        let store = MemoryBackend::new();
        store.set_unavailable(true);

        assert!(store.tenant_by_id(Uuid::new_v4()).await.is_err());
        assert!(store.api_key_by_hash("abc").await.is_err());
        assert!(store.window_count(Uuid::new_v4(), 0).await.is_err());
        assert!(store.usage_for_tenant(Uuid::new_v4()).await.is_err());

        store.set_unavailable(false);
        assert!(store.tenant_by_id(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn test_touch_last_used_updates_record() {
        let store = MemoryBackend::new();
        let record = test_key(Uuid::new_v4(), "hash-1");
        let key_id = record.id;
        store.insert_api_key(record).await;

        assert!(store.last_used("hash-1").await.is_none());
        let now = Utc::now();
        store.touch_last_used(key_id, now).await.unwrap();
        assert_eq!(store.last_used("hash-1").await, Some(now));
    }

    #[tokio::test]
    async fn test_window_increment_and_read() {
        let store = MemoryBackend::new();
        let cred = Uuid::new_v4();

        assert_eq!(store.window_count(cred, 3600).await.unwrap(), 0);
        assert_eq!(store.increment_window(cred, 3600).await.unwrap(), 1);
        assert_eq!(store.increment_window(cred, 3600).await.unwrap(), 2);
        assert_eq!(store.window_count(cred, 3600).await.unwrap(), 2);
        // A different window is independent.
        assert_eq!(store.window_count(cred, 7200).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_request_log_append() {
        let store = MemoryBackend::new();
        let tenant = Uuid::new_v4();
        store.record_request(tenant, Utc::now()).await.unwrap();
        store.record_request(tenant, Utc::now()).await.unwrap();
        assert_eq!(store.logged_requests(tenant).await, 2);
    }
}
