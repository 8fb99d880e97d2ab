//! Enriched request context
//!
//! The pipeline's success output: attached to the request and consumed by
//! downstream business handlers (which are out of scope here).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::{Capability, CapabilitySet, Role};
use crate::quota::RateLimitDecision;
use crate::tenant::Tenant;

/// Who the authenticated caller is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallerIdentity {
    /// Machine caller holding an API key
    ApiKey {
        /// The key record id (also the rate-limit credential id)
        key_id: Uuid,
    },
    /// Human caller holding a session token
    User {
        /// The user id
        user_id: Uuid,
        /// Role carried by the verified token
        role: Role,
    },
}

/// Context attached to a request once the full pipeline has admitted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Resolved, active tenant
    pub tenant: Tenant,

    /// Authenticated caller identity
    pub caller: CallerIdentity,

    /// Effective capability grants for this request
    pub capabilities: CapabilitySet,

    /// Rate-limit state, surfaced as `X-RateLimit-*` response headers
    pub rate_limit: Option<RateLimitDecision>,

    /// Soft-limit usage percentage once past the warning threshold
    pub quota_warning_pct: Option<f64>,
}

impl RequestContext {
    /// Role implied by the caller, if any (machine keys carry none).
    pub fn role(&self) -> Option<Role> {
        match self.caller {
            CallerIdentity::User { role, .. } => Some(role),
            CallerIdentity::ApiKey { .. } => None,
        }
    }

    /// Whether the caller holds a capability, directly or via role defaults.
    pub fn has_capability(&self, cap: Capability) -> bool {
        if self.capabilities.contains(cap) {
            return true;
        }
        self.role().map(|r| r.default_capabilities().contains(cap)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::PlanTier;

    #[test]
    fn test_api_key_caller_has_no_role() {
        let ctx = RequestContext {
            tenant: Tenant::new("acme", PlanTier::Pro),
            caller: CallerIdentity::ApiKey { key_id: Uuid::new_v4() },
            capabilities: CapabilitySet::from_capabilities([Capability::Read]),
            rate_limit: None,
            quota_warning_pct: None,
        };
        assert_eq!(ctx.role(), None);
        assert!(ctx.has_capability(Capability::Read));
        assert!(!ctx.has_capability(Capability::Write));
    }

    #[test]
    fn test_user_caller_falls_back_to_role_defaults() {
        let ctx = RequestContext {
            tenant: Tenant::new("acme", PlanTier::Pro),
            caller: CallerIdentity::User { user_id: Uuid::new_v4(), role: Role::Author },
            capabilities: CapabilitySet::new(),
            rate_limit: None,
            quota_warning_pct: None,
        };
        assert!(ctx.has_capability(Capability::Write));
        assert!(!ctx.has_capability(Capability::Admin));
    }
}
