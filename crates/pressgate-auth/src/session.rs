//! JWT session issuance, verification and refresh
//!
//! Access and refresh tokens are signed with distinct HS256 secrets and carry
//! a `token_use` discriminator, so a refresh token can never pass an
//! access-token check even if both layers of defense were misconfigured to
//! share a secret. Expiry is checked explicitly (library exp validation is
//! disabled) so an expired token yields its own outcome instead of folding
//! into generic invalidity. Refresh re-reads the user store: grants minted
//! into the new access token reflect the user's current role and permissions,
//! and disabled users cannot refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use pressgate_store::UserStore;
use pressgate_types::{
    CredentialError, InfrastructureError, PipelineError, SessionClaims, TokenUse, UserAccount,
};

use crate::revocation::RevocationSet;

/// Signing configuration for the session service.
#[derive(Clone)]
pub struct SessionConfig {
    /// Secret for access tokens
    pub access_secret: String,
    /// Secret for refresh tokens, distinct from the access secret
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues, verifies, refreshes and revokes session tokens.
pub struct SessionService {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
    revocations: RevocationSet,
    users: Arc<dyn UserStore>,
    store_timeout: Duration,
    validation: Validation,
}

impl SessionService {
    /// Create a session service. Secrets must be non-empty and distinct;
    /// configuration loading enforces that before this is reached.
    pub fn new(config: SessionConfig, users: Arc<dyn UserStore>, store_timeout: Duration) -> Self {
        // Expiry is checked by hand so the outcome stays distinct; no
        // spec claims are required since the claim struct enforces shape.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&[] as &[&str]);

        Self {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            revocations: RevocationSet::new(config.refresh_ttl),
            users,
            store_timeout,
            validation,
        }
    }

    /// Mint an access token carrying the user's current role and grants.
    pub fn issue_access(&self, user: &UserAccount) -> Result<String, PipelineError> {
        let claims = self.claims_for(user, TokenUse::Access, self.access_ttl);
        self.sign(&claims, &self.access)
    }

    /// Mint a refresh token. Refresh tokens carry no permission strings; the
    /// holder's grants are re-read when a new access token is minted.
    pub fn issue_refresh(&self, user: &UserAccount) -> Result<String, PipelineError> {
        let mut claims = self.claims_for(user, TokenUse::Refresh, self.refresh_ttl);
        claims.permissions = Vec::new();
        self.sign(&claims, &self.refresh)
    }

    fn claims_for(&self, user: &UserAccount, token_use: TokenUse, ttl: Duration) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
            permissions: user.permissions.to_strings(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
            jti: SessionClaims::new_jti(),
            token_use,
        }
    }

    fn sign(&self, claims: &SessionClaims, keys: &KeyPair) -> Result<String, PipelineError> {
        encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
            .map_err(|e| InfrastructureError::Internal(format!("token signing failed: {e}")).into())
    }

    /// Verify a token against the expected class.
    ///
    /// Check order: signature/structure → class discriminator → expiry →
    /// revocation, each with a distinct outcome.
    pub async fn verify(
        &self,
        token: &str,
        expected: TokenUse,
    ) -> Result<SessionClaims, PipelineError> {
        let keys = match expected {
            TokenUse::Access => &self.access,
            TokenUse::Refresh => &self.refresh,
        };
        let claims = self.decode_with(token, keys)?;

        if claims.token_use != expected {
            return Err(CredentialError::InvalidToken("wrong token class".into()).into());
        }

        let now = Utc::now().timestamp();
        if claims.exp <= now {
            return Err(CredentialError::TokenExpired.into());
        }

        if self.revocations.is_revoked(&claims.jti, now).await {
            return Err(CredentialError::TokenRevoked.into());
        }

        Ok(claims)
    }

    fn decode_with(&self, token: &str, keys: &KeyPair) -> Result<SessionClaims, CredentialError> {
        decode::<SessionClaims>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    /// Exchange a valid refresh token for a fresh access token.
    ///
    /// The user record is re-read so the new token carries current grants;
    /// a disabled or deleted user cannot refresh. The store read is
    /// fail-closed.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, PipelineError> {
        let claims = self.verify(refresh_token, TokenUse::Refresh).await?;

        let user = tokio::time::timeout(self.store_timeout, self.users.user_by_id(claims.sub))
            .await
            .map_err(|_| InfrastructureError::Timeout)?
            .map_err(PipelineError::Infrastructure)?
            .ok_or_else(|| CredentialError::InvalidToken("session subject no longer exists".into()))?;

        if !user.active || user.tenant_id != claims.tenant_id {
            return Err(CredentialError::InvalidToken("session no longer valid".into()).into());
        }

        self.issue_access(&user)
    }

    /// Revoke a token by recording its `jti` until natural expiry.
    ///
    /// Works for either class: the token is decoded against the access key
    /// first, then the refresh key. Already-expired tokens are a no-op.
    pub async fn revoke(&self, token: &str) -> Result<(), PipelineError> {
        let claims = self
            .decode_with(token, &self.access)
            .or_else(|_| self.decode_with(token, &self.refresh))?;

        self.revocations
            .revoke(&claims.jti, claims.exp, Utc::now().timestamp())
            .await;
        Ok(())
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> CredentialError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => CredentialError::TokenExpired,
        ErrorKind::InvalidSignature => CredentialError::InvalidToken("invalid signature".into()),
        ErrorKind::InvalidToken => CredentialError::InvalidToken("malformed token".into()),
        _ => CredentialError::InvalidToken(err.to_string()),
    }
}
