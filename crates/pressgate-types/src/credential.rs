//! API key records, capabilities and roles
//!
//! Permissions are modeled as a single well-typed set of capabilities from
//! the start; loosely-typed permission arrays coming out of storage are
//! normalized through [`CapabilitySet::normalize`] at the load boundary.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A capability an actor may hold on tenant resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Write,
    Admin,
}

impl Capability {
    /// Stable string form used in stored permission lists and JWT claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Admin => "admin",
        }
    }

    /// Parse a stored permission string; unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "read" => Some(Capability::Read),
            "write" => Some(Capability::Write),
            "admin" => Some(Capability::Admin),
            _ => None,
        }
    }
}

/// A typed set of capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(HashSet<Capability>);

impl CapabilitySet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from capabilities.
    pub fn from_capabilities(caps: impl IntoIterator<Item = Capability>) -> Self {
        Self(caps.into_iter().collect())
    }

    /// Normalize loosely-typed permission strings loaded from storage into a
    /// typed set. Unknown entries are dropped rather than failing the load.
    pub fn normalize<S: AsRef<str>>(values: &[S]) -> Self {
        Self(values.iter().filter_map(|v| Capability::parse(v.as_ref())).collect())
    }

    /// Membership check.
    pub fn contains(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable string forms, for embedding in JWT claims.
    pub fn to_strings(&self) -> Vec<String> {
        let mut out: Vec<String> = self.0.iter().map(|c| c.as_str().to_string()).collect();
        out.sort();
        out
    }
}

/// Roles assignable to human users of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Author,
    Editor,
    Owner,
}

impl Role {
    /// Default capability set implied by a role, consulted when an actor has
    /// no explicit grant for the required capability.
    pub fn default_capabilities(&self) -> CapabilitySet {
        match self {
            Role::Viewer => CapabilitySet::from_capabilities([Capability::Read]),
            Role::Author | Role::Editor => {
                CapabilitySet::from_capabilities([Capability::Read, Capability::Write])
            }
            Role::Owner => CapabilitySet::from_capabilities([
                Capability::Read,
                Capability::Write,
                Capability::Admin,
            ]),
        }
    }
}

/// Stored record for a machine API key.
///
/// The raw key is never stored; `key_hash` is a deterministic digest usable
/// for O(1) equality lookup. Records are deactivated, never physically
/// deleted while referenced by usage logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    /// Unique identifier for this key
    pub id: Uuid,

    /// Owning tenant
    pub tenant_id: Uuid,

    /// Deterministic hex digest of the raw key
    pub key_hash: String,

    /// Granted capabilities
    pub permissions: CapabilitySet,

    /// Hourly request budget for this credential
    pub rate_limit_per_hour: u32,

    /// Optional hard expiry
    pub expires_at: Option<DateTime<Utc>>,

    /// Revoked keys have this cleared
    pub active: bool,

    /// Bumped asynchronously on each successful use
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Outcome of a successful API key validation.
#[derive(Debug, Clone)]
pub struct ValidatedKey {
    /// The key record id (the rate-limit credential id)
    pub key_id: Uuid,
    /// Owning tenant
    pub tenant_id: Uuid,
    /// Granted capabilities
    pub permissions: CapabilitySet,
    /// Hourly request budget
    pub rate_limit_per_hour: u32,
}

/// Authoritative state of a human user, re-read on token refresh so that
/// role or permission changes since issuance take effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique identifier for this user
    pub id: Uuid,
    /// Tenant the user belongs to
    pub tenant_id: Uuid,
    /// Assigned role
    pub role: Role,
    /// Explicit capability grants beyond the role defaults
    pub permissions: CapabilitySet,
    /// Disabled users cannot refresh sessions
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_unknown_entries() {
        let set = CapabilitySet::normalize(&["read", "WRITE", "bogus", " admin "]);
        assert!(set.contains(Capability::Read));
        assert!(set.contains(Capability::Write));
        assert!(set.contains(Capability::Admin));
        assert_eq!(set.to_strings(), vec!["admin", "read", "write"]);
    }

    #[test]
    fn test_normalize_empty() {
        let set = CapabilitySet::normalize::<&str>(&[]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_role_defaults() {
        assert!(Role::Viewer.default_capabilities().contains(Capability::Read));
        assert!(!Role::Viewer.default_capabilities().contains(Capability::Write));
        assert!(Role::Author.default_capabilities().contains(Capability::Write));
        assert!(Role::Owner.default_capabilities().contains(Capability::Admin));
    }

    #[test]
    fn test_capability_round_trip() {
        for cap in [Capability::Read, Capability::Write, Capability::Admin] {
            assert_eq!(Capability::parse(cap.as_str()), Some(cap));
        }
        assert_eq!(Capability::parse("superuser"), None);
    }
}
