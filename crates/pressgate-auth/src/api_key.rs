//! API key validation
//!
//! A single indexed lookup by hashed key, followed by ordered checks that
//! each map to a distinct outcome: record exists, active flag set, expiry
//! (when present) in the future. Distinct outcomes let the pipeline emit a
//! precise 401 code instead of a generic failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use pressgate_store::ApiKeyStore;
use pressgate_types::{CredentialError, InfrastructureError, PipelineError, ValidatedKey};

/// Validates hashed API keys against stored key records.
pub struct ApiKeyValidator {
    store: Arc<dyn ApiKeyStore>,
    store_timeout: Duration,
}

impl ApiKeyValidator {
    /// Create a validator over a key store. `store_timeout` bounds the
    /// lookup; validation is fail-closed, so a timed-out lookup denies.
    pub fn new(store: Arc<dyn ApiKeyStore>, store_timeout: Duration) -> Self {
        Self { store, store_timeout }
    }

    /// Validate a hashed key.
    ///
    /// Check order: record exists → active → not expired. On success the
    /// last-used timestamp is bumped on a spawned task; that write never
    /// blocks or fails the request.
    pub async fn validate(&self, key_hash: &str) -> Result<ValidatedKey, PipelineError> {
        let record = tokio::time::timeout(self.store_timeout, self.store.api_key_by_hash(key_hash))
            .await
            .map_err(|_| InfrastructureError::Timeout)?
            .map_err(PipelineError::Infrastructure)?
            .ok_or(CredentialError::KeyNotFound)?;

        if !record.active {
            return Err(CredentialError::KeyInactive.into());
        }

        if let Some(expires_at) = record.expires_at {
            if expires_at <= Utc::now() {
                return Err(CredentialError::KeyExpired.into());
            }
        }

        let store = Arc::clone(&self.store);
        let key_id = record.id;
        tokio::spawn(async move {
            if let Err(e) = store.touch_last_used(key_id, Utc::now()).await {
                warn!(key_id = %key_id, error = %e, "Failed to bump API key last-used timestamp");
            }
        });

        Ok(ValidatedKey {
            key_id: record.id,
            tenant_id: record.tenant_id,
            permissions: record.permissions,
            rate_limit_per_hour: record.rate_limit_per_hour,
        })
    }
}
