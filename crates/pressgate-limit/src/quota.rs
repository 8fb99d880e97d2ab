//! Billing quota checks against cached usage snapshots
//!
//! Usage counting is expensive, so checks read a per-tenant snapshot cached
//! for a short TTL; a tenant that just crossed a cap may get a few more
//! requests through until the snapshot refreshes. Before the hard cap there
//! is a soft-limit warning: once usage crosses the warning threshold the
//! check carries the usage fraction so handlers can surface it, without ever
//! denying.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::warn;
use uuid::Uuid;

use pressgate_store::UsageStore;
use pressgate_types::{QuotaCheck, QuotaError, QuotaSnapshot, ResourceKind, Tenant};

/// Checks tenant usage against plan limits via a TTL snapshot cache.
pub struct QuotaGate {
    usage: Arc<dyn UsageStore>,
    snapshots: Cache<Uuid, QuotaSnapshot>,
    warn_threshold: f64,
    store_timeout: Duration,
}

impl QuotaGate {
    /// Create a gate over a usage store.
    ///
    /// `snapshot_ttl` bounds staleness (on the order of minutes);
    /// `warn_threshold` is the soft-limit fraction, e.g. `0.8`.
    pub fn new(
        usage: Arc<dyn UsageStore>,
        snapshot_ttl: Duration,
        warn_threshold: f64,
        store_timeout: Duration,
    ) -> Self {
        let snapshots = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(snapshot_ttl)
            .build();
        Self { usage, snapshots, warn_threshold, store_timeout }
    }

    /// Check one resource against the tenant's plan.
    ///
    /// Fail-open: a store failure while computing a snapshot logs and admits.
    /// An unlimited cap (`None`) never exceeds regardless of usage.
    pub async fn check(&self, tenant: &Tenant, resource: ResourceKind) -> QuotaCheck {
        let limits = tenant.plan.limits();
        let limit = limits.limit_for(resource);

        let snapshot = match self.snapshots.get(&tenant.id).await {
            Some(snapshot) => Some(snapshot),
            None => {
                let snapshot = self.compute_snapshot(tenant).await;
                if let Some(snapshot) = &snapshot {
                    self.snapshots.insert(tenant.id, snapshot.clone()).await;
                }
                snapshot
            }
        };

        let Some(snapshot) = snapshot else {
            // Store is down: admit with nothing to report.
            return QuotaCheck {
                exceeded: false,
                current: 0,
                limit,
                plan: tenant.plan,
                violations: Vec::new(),
                usage_pct: None,
            };
        };

        let current = snapshot.current(resource);
        let exceeded = limit.is_some_and(|cap| current >= cap);

        let usage_pct = limit
            .filter(|cap| *cap > 0)
            .map(|cap| current as f64 / cap as f64)
            .filter(|pct| *pct >= self.warn_threshold);

        QuotaCheck {
            exceeded,
            current,
            limit,
            plan: tenant.plan,
            violations: snapshot.violations.clone(),
            usage_pct,
        }
    }

    /// [`check`] as a pipeline stage: an exceeded cap becomes the denial.
    ///
    /// [`check`]: QuotaGate::check
    pub async fn enforce(
        &self,
        tenant: &Tenant,
        resource: ResourceKind,
    ) -> Result<QuotaCheck, QuotaError> {
        let check = self.check(tenant, resource).await;
        if check.exceeded {
            return Err(QuotaError::LimitExceeded {
                resource,
                current: check.current,
                // An exceeded check always has a finite cap.
                limit: check.limit.unwrap_or(check.current),
                violations: check.violations.clone(),
            });
        }
        Ok(check)
    }

    /// Drop a tenant's cached snapshot, e.g. after usage changes upstream.
    pub async fn invalidate(&self, tenant_id: Uuid) {
        self.snapshots.invalidate(&tenant_id).await;
    }

    async fn compute_snapshot(&self, tenant: &Tenant) -> Option<QuotaSnapshot> {
        let read =
            tokio::time::timeout(self.store_timeout, self.usage.usage_for_tenant(tenant.id));
        match read.await {
            Ok(Ok(usage)) => Some(QuotaSnapshot::compute(usage, tenant.plan.limits())),
            Ok(Err(e)) => {
                warn!(tenant_id = %tenant.id, error = %e, "Usage read failed, admitting without quota check");
                None
            }
            Err(_) => {
                warn!(tenant_id = %tenant.id, "Usage read timed out, admitting without quota check");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressgate_store::MemoryBackend;
    use pressgate_types::PlanTier;
    use std::collections::HashMap;

    fn gate(store: Arc<MemoryBackend>) -> QuotaGate {
        QuotaGate::new(store, Duration::from_secs(300), 0.8, Duration::from_millis(500))
    }

    async fn tenant_with_usage(
        store: &Arc<MemoryBackend>,
        plan: PlanTier,
        articles: u64,
    ) -> Tenant {
        let tenant = Tenant::new("acme", plan);
        store
            .set_usage(tenant.id, HashMap::from([(ResourceKind::Articles, articles)]))
            .await;
        tenant
    }

    #[tokio::test]
    async fn test_under_limit_passes() {
        let store = Arc::new(MemoryBackend::new());
        let tenant = tenant_with_usage(&store, PlanTier::Free, 3).await;

        let check = gate(store).check(&tenant, ResourceKind::Articles).await;
        assert!(!check.exceeded);
        assert_eq!(check.current, 3);
        assert_eq!(check.limit, Some(10));
        assert!(check.usage_pct.is_none());
    }

    #[tokio::test]
    async fn test_at_limit_is_exceeded() {
        let store = Arc::new(MemoryBackend::new());
        let tenant = tenant_with_usage(&store, PlanTier::Free, 10).await;

        let err = gate(store)
            .enforce(&tenant, ResourceKind::Articles)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuotaError::LimitExceeded { resource: ResourceKind::Articles, current: 10, limit: 10, .. }
        ));
    }

    #[tokio::test]
    async fn test_unlimited_plan_never_exceeds() {
        let store = Arc::new(MemoryBackend::new());
        let tenant = tenant_with_usage(&store, PlanTier::Unlimited, 1_000_000).await;

        let check = gate(store).check(&tenant, ResourceKind::Articles).await;
        assert!(!check.exceeded);
        assert_eq!(check.limit, None);
        assert!(check.usage_pct.is_none());
    }

    #[tokio::test]
    async fn test_soft_limit_warning_attached() {
        let store = Arc::new(MemoryBackend::new());
        let tenant = tenant_with_usage(&store, PlanTier::Free, 8).await;

        let check = gate(store).check(&tenant, ResourceKind::Articles).await;
        assert!(!check.exceeded);
        let pct = check.usage_pct.unwrap();
        assert!((pct - 0.8).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_store_outage_fails_open() {
        let store = Arc::new(MemoryBackend::new());
        let tenant = tenant_with_usage(&store, PlanTier::Free, 10).await;
        store.set_unavailable(true);

        let check = gate(store).check(&tenant, ResourceKind::Articles).await;
        assert!(!check.exceeded);
    }

    #[tokio::test]
    async fn test_snapshot_is_cached_within_ttl() {
        let store = Arc::new(MemoryBackend::new());
        let tenant = tenant_with_usage(&store, PlanTier::Free, 3).await;
        let g = gate(Arc::clone(&store));

        g.check(&tenant, ResourceKind::Articles).await;
        store
            .set_usage(tenant.id, HashMap::from([(ResourceKind::Articles, 10)]))
            .await;

        // Still the cached view until the TTL elapses or invalidation.
        let check = g.check(&tenant, ResourceKind::Articles).await;
        assert_eq!(check.current, 3);

        g.invalidate(tenant.id).await;
        let check = g.check(&tenant, ResourceKind::Articles).await;
        assert_eq!(check.current, 10);
        assert!(check.exceeded);
    }
}
