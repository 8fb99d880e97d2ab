//! Token revocation set
//!
//! Revoked tokens are tracked by `jti` until their natural expiry. A revoked
//! token needs no tracking past its `exp` — the expiry check already rejects
//! it — so each entry stores the token's expiry timestamp and lookups treat
//! stale entries as absent. The cache-wide TTL matches the longest-lived
//! token (the refresh TTL) so entries age out on their own.

use std::time::Duration;

use moka::future::Cache;

/// In-process set of revoked token ids, bounded by token lifetime.
#[derive(Clone)]
pub struct RevocationSet {
    revoked: Cache<String, i64>,
}

impl RevocationSet {
    /// Create a set whose entries live at most `max_token_ttl` — callers pass
    /// the refresh-token lifetime, the longest any revocation stays relevant.
    pub fn new(max_token_ttl: Duration) -> Self {
        let revoked = Cache::builder()
            .max_capacity(100_000)
            .time_to_live(max_token_ttl)
            .build();
        Self { revoked }
    }

    /// Mark a token id revoked until `exp` (unix seconds).
    ///
    /// Tokens already past expiry are not recorded; the expiry check rejects
    /// them without a set lookup.
    pub async fn revoke(&self, jti: &str, exp: i64, now: i64) {
        if exp > now {
            self.revoked.insert(jti.to_string(), exp).await;
        }
    }

    /// Whether a token id is currently revoked.
    pub async fn is_revoked(&self, jti: &str, now: i64) -> bool {
        match self.revoked.get(jti).await {
            Some(exp) => exp > now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoked_token_is_flagged() {
        let set = RevocationSet::new(Duration::from_secs(3600));
        set.revoke("jti-1", 1_000_100, 1_000_000).await;
        assert!(set.is_revoked("jti-1", 1_000_000).await);
        assert!(!set.is_revoked("jti-other", 1_000_000).await);
    }

    #[tokio::test]
    async fn test_entry_past_expiry_is_absent() {
        let set = RevocationSet::new(Duration::from_secs(3600));
        set.revoke("jti-1", 1_000_100, 1_000_000).await;
        // Once the token itself has expired the entry no longer matters.
        assert!(!set.is_revoked("jti-1", 1_000_200).await);
    }

    #[tokio::test]
    async fn test_already_expired_token_not_recorded() {
        let set = RevocationSet::new(Duration::from_secs(3600));
        set.revoke("jti-1", 1_000_000, 1_000_100).await;
        assert!(!set.is_revoked("jti-1", 1_000_050).await);
    }
}
