//! Quota snapshots, plan limits and rate-limit decisions

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::tenant::PlanTier;

/// Countable resources capped per subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Articles,
    Users,
    ApiRequests,
}

impl ResourceKind {
    /// Stable string form for error payloads and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Articles => "articles",
            ResourceKind::Users => "users",
            ResourceKind::ApiRequests => "api_requests",
        }
    }
}

/// Per-plan caps. `None` means the resource is unlimited on that plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_articles: Option<u64>,
    pub max_users: Option<u64>,
    pub max_api_requests: Option<u64>,
}

impl PlanLimits {
    /// Cap for a resource kind.
    pub fn limit_for(&self, resource: ResourceKind) -> Option<u64> {
        match resource {
            ResourceKind::Articles => self.max_articles,
            ResourceKind::Users => self.max_users,
            ResourceKind::ApiRequests => self.max_api_requests,
        }
    }
}

/// Cached per-tenant view of usage against plan limits.
///
/// Recomputed from the authoritative store once `ttl` has elapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Current usage per resource
    pub usage: HashMap<ResourceKind, u64>,
    /// Plan limits in effect when the snapshot was taken
    pub limits: PlanLimits,
    /// Resources at or over their cap
    pub violations: Vec<ResourceKind>,
    /// When the snapshot was computed
    pub computed_at: DateTime<Utc>,
}

impl QuotaSnapshot {
    /// Compute a snapshot from usage and limits.
    pub fn compute(usage: HashMap<ResourceKind, u64>, limits: PlanLimits) -> Self {
        let mut violations = Vec::new();
        for resource in
            [ResourceKind::Articles, ResourceKind::Users, ResourceKind::ApiRequests]
        {
            if let Some(limit) = limits.limit_for(resource) {
                if usage.get(&resource).copied().unwrap_or(0) >= limit {
                    violations.push(resource);
                }
            }
        }
        Self { usage, limits, violations, computed_at: Utc::now() }
    }

    /// Whether the snapshot is still within its TTL at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.computed_at < ttl
    }

    /// Current usage for a resource.
    pub fn current(&self, resource: ResourceKind) -> u64 {
        self.usage.get(&resource).copied().unwrap_or(0)
    }
}

/// Result of a quota check against one resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaCheck {
    /// Whether the resource is at or over its cap
    pub exceeded: bool,
    /// Current usage
    pub current: u64,
    /// Plan cap; `None` is unlimited
    pub limit: Option<u64>,
    /// Plan the check was evaluated against
    pub plan: PlanTier,
    /// All resources currently in violation (for the denial payload)
    pub violations: Vec<ResourceKind>,
    /// Usage as a fraction of the cap, attached once it crosses the
    /// soft-limit warning threshold; advisory only, never a denial
    pub usage_pct: Option<f64>,
}

/// Outcome of a rate-limit check, also surfaced as response headers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Configured hourly budget
    pub limit: u32,
    /// Requests remaining in the current window
    pub remaining: u32,
    /// Epoch seconds at which the window resets
    pub reset_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(articles: u64) -> HashMap<ResourceKind, u64> {
        HashMap::from([(ResourceKind::Articles, articles)])
    }

    #[test]
    fn test_snapshot_flags_violations_at_limit() {
        let snapshot = QuotaSnapshot::compute(usage(10), PlanTier::Free.limits());
        assert!(snapshot.violations.contains(&ResourceKind::Articles));
        assert_eq!(snapshot.current(ResourceKind::Articles), 10);
    }

    #[test]
    fn test_snapshot_under_limit_is_clean() {
        let snapshot = QuotaSnapshot::compute(usage(3), PlanTier::Free.limits());
        assert!(!snapshot.violations.contains(&ResourceKind::Articles));
    }

    #[test]
    fn test_unlimited_plan_never_violates() {
        let snapshot = QuotaSnapshot::compute(usage(u64::MAX), PlanTier::Unlimited.limits());
        assert!(snapshot.violations.is_empty());
    }

    #[test]
    fn test_snapshot_freshness() {
        let snapshot = QuotaSnapshot::compute(usage(0), PlanTier::Pro.limits());
        let now = Utc::now();
        assert!(snapshot.is_fresh(Duration::minutes(5), now));
        assert!(!snapshot.is_fresh(Duration::minutes(5), now + Duration::minutes(6)));
    }
}
