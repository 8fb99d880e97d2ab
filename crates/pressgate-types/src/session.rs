//! JWT session claims
//!
//! Human users authenticate with short-lived access tokens and longer-lived
//! refresh tokens. The two classes are signed with distinct secrets and carry
//! a `token_use` discriminator so one can never stand in for the other.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::Role;

/// Token class discriminator embedded in every session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Claims carried by a Pressgate session token.
///
/// Refresh tokens carry the reduced claim set: `permissions` is empty and the
/// holder's current grants are re-read from the user store when a new access
/// token is minted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user id
    pub sub: Uuid,

    /// Tenant the session is bound to
    pub tenant_id: Uuid,

    /// User role at issuance
    pub role: Role,

    /// Permission strings at issuance (empty for refresh tokens)
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expiration time (seconds since epoch)
    pub exp: i64,

    /// Unique token identifier, tracked by the revocation set
    pub jti: String,

    /// Token class
    pub token_use: TokenUse,
}

impl SessionClaims {
    /// Remaining lifetime in seconds at `now`, zero if already expired.
    pub fn remaining_lifetime(&self, now: i64) -> u64 {
        (self.exp - now).max(0) as u64
    }

    /// Mint a jti for a fresh token.
    pub fn new_jti() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_lifetime() {
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::Author,
            permissions: vec![],
            iat: 1_000,
            exp: 4_600,
            jti: SessionClaims::new_jti(),
            token_use: TokenUse::Access,
        };
        assert_eq!(claims.remaining_lifetime(1_000), 3_600);
        assert_eq!(claims.remaining_lifetime(5_000), 0);
    }

    #[test]
    fn test_token_use_serde() {
        assert_eq!(serde_json::to_string(&TokenUse::Refresh).unwrap(), "\"refresh\"");
        let parsed: TokenUse = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(parsed, TokenUse::Access);
    }

    #[test]
    fn test_jtis_are_unique() {
        assert_ne!(SessionClaims::new_jti(), SessionClaims::new_jti());
    }
}
