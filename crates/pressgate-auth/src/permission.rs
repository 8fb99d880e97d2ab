//! Capability checks and verb-to-capability mapping
//!
//! Authorization resolves in fixed order: admin wildcard, then explicit
//! grants, then role defaults (for human sessions only — API keys have no
//! role and their explicit grants are final).

use async_trait::async_trait;
use uuid::Uuid;

use pressgate_types::{Capability, CapabilitySet, PermissionError, Role, StoreResult};

/// Whether an actor holds the required capability.
///
/// An explicit `admin` grant (or a role whose defaults include it) satisfies
/// any requirement. Role defaults are consulted only when the explicit set
/// lacks the capability; an explicit set never removes what the role grants.
pub fn authorize(caps: &CapabilitySet, role: Option<Role>, required: Capability) -> bool {
    if caps.contains(Capability::Admin) || caps.contains(required) {
        return true;
    }
    match role {
        Some(role) => {
            let defaults = role.default_capabilities();
            defaults.contains(Capability::Admin) || defaults.contains(required)
        }
        None => false,
    }
}

/// [`authorize`] as a pipeline stage: deny carries the capability name.
pub fn require(
    caps: &CapabilitySet,
    role: Option<Role>,
    required: Capability,
) -> Result<(), PermissionError> {
    if authorize(caps, role, required) {
        Ok(())
    } else {
        Err(PermissionError::Insufficient { required: required.as_str() })
    }
}

/// Capability implied by an HTTP verb.
///
/// Unknown or uncommon verbs map to `Admin`, the most restrictive bucket.
pub fn method_capability(method: &str) -> Capability {
    match method.to_ascii_uppercase().as_str() {
        "GET" | "HEAD" => Capability::Read,
        "POST" | "PUT" | "PATCH" => Capability::Write,
        _ => Capability::Admin,
    }
}

/// Resource-level ownership checks, e.g. "may this author edit this article".
///
/// Capability checks gate the verb; handlers that touch a specific resource
/// plug an implementation of this seam for the finer-grained decision.
#[async_trait]
pub trait OwnershipCheck: Send + Sync {
    /// Whether `user_id` owns (or may act for the owner of) `resource_id`.
    async fn owns(&self, user_id: Uuid, resource_id: Uuid) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_grant_satisfies_everything() {
        let caps = CapabilitySet::from_capabilities([Capability::Admin]);
        assert!(authorize(&caps, None, Capability::Read));
        assert!(authorize(&caps, None, Capability::Write));
        assert!(authorize(&caps, None, Capability::Admin));
    }

    #[test]
    fn test_explicit_grant_without_role() {
        let caps = CapabilitySet::from_capabilities([Capability::Read]);
        assert!(authorize(&caps, None, Capability::Read));
        assert!(!authorize(&caps, None, Capability::Write));
    }

    #[test]
    fn test_role_defaults_fill_empty_grants() {
        let empty = CapabilitySet::new();
        assert!(authorize(&empty, Some(Role::Viewer), Capability::Read));
        assert!(!authorize(&empty, Some(Role::Viewer), Capability::Write));
        assert!(authorize(&empty, Some(Role::Editor), Capability::Write));
        assert!(authorize(&empty, Some(Role::Owner), Capability::Admin));
    }

    #[test]
    fn test_explicit_grants_do_not_shrink_role_defaults() {
        // An author with only an explicit read grant still writes via role.
        let caps = CapabilitySet::from_capabilities([Capability::Read]);
        assert!(authorize(&caps, Some(Role::Author), Capability::Write));
    }

    #[test]
    fn test_require_names_missing_capability() {
        let caps = CapabilitySet::from_capabilities([Capability::Read]);
        let err = require(&caps, None, Capability::Admin).unwrap_err();
        assert_eq!(err, PermissionError::Insufficient { required: "admin" });
    }

    #[test]
    fn test_method_capability_mapping() {
        assert_eq!(method_capability("GET"), Capability::Read);
        assert_eq!(method_capability("head"), Capability::Read);
        assert_eq!(method_capability("POST"), Capability::Write);
        assert_eq!(method_capability("PUT"), Capability::Write);
        assert_eq!(method_capability("PATCH"), Capability::Write);
        assert_eq!(method_capability("DELETE"), Capability::Admin);
        assert_eq!(method_capability("TRACE"), Capability::Admin);
    }
}
