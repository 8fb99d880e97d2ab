//! Pipeline composition root
//!
//! Wires the validators, directory, limiter and quota gate into one
//! `authenticate` call running the fixed stage order: credential → tenant →
//! status → rate limit → permission → quota. The first failing stage decides
//! the denial; later stages never run, so a rate-limited request reveals
//! nothing about its permissions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use pressgate_auth::{
    hash_api_key, method_capability, require, ApiKeyValidator, SessionConfig, SessionService,
    TenantDirectory, TenantSignal,
};
use pressgate_config::Config;
use pressgate_limit::{QuotaGate, RateLimiter};
use pressgate_store::{ApiKeyStore, RateLimitStore, TenantStore, UsageStore, UserStore};
use pressgate_types::{
    CallerIdentity, Capability, CapabilitySet, CredentialError, PipelineError, QuotaError,
    RequestContext, ResourceKind, SessionClaims, TenantError, TokenUse,
};

use crate::extract::Credential;
use crate::metrics::PipelineMetrics;

/// The store handles the pipeline runs on.
#[derive(Clone)]
pub struct PipelineStores {
    pub tenants: Arc<dyn TenantStore>,
    pub api_keys: Arc<dyn ApiKeyStore>,
    pub users: Arc<dyn UserStore>,
    pub rate_limits: Arc<dyn RateLimitStore>,
    pub usage: Arc<dyn UsageStore>,
}

/// Per-route enforcement knobs, set where the route is mounted.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteRequirements {
    /// Capability override; defaults to the verb mapping
    pub capability: Option<Capability>,
    /// Resource whose plan cap gates mutations on this route
    pub metered: Option<ResourceKind>,
}

/// Everything extracted from the request before the pipeline runs.
#[derive(Debug, Clone)]
pub struct RequestSignals {
    pub credential: Option<Credential>,
    pub tenant_hint: Option<Uuid>,
    pub host: Option<TenantSignal>,
    pub method: String,
}

/// The authentication pipeline.
pub struct AuthPipeline {
    validator: ApiKeyValidator,
    directory: TenantDirectory,
    sessions: SessionService,
    limiter: Arc<RateLimiter>,
    quota: QuotaGate,
    usage: Arc<dyn UsageStore>,
    metrics: Option<PipelineMetrics>,
    default_rate_limit: u32,
    base_domain: String,
}

impl AuthPipeline {
    /// Build the pipeline from validated configuration and store handles.
    pub fn new(stores: PipelineStores, config: &Config) -> Self {
        let store_timeout = Duration::from_millis(config.store.timeout_ms);

        let sessions = SessionService::new(
            SessionConfig {
                access_secret: config.auth.access_secret.clone(),
                refresh_secret: config.auth.refresh_secret.clone(),
                access_ttl: Duration::from_secs(config.auth.access_ttl_seconds),
                refresh_ttl: Duration::from_secs(config.auth.refresh_ttl_seconds),
            },
            Arc::clone(&stores.users),
            store_timeout,
        );

        Self {
            validator: ApiKeyValidator::new(Arc::clone(&stores.api_keys), store_timeout),
            directory: TenantDirectory::new(
                Arc::clone(&stores.tenants),
                Duration::from_secs(config.cache.tenant_ttl_seconds),
                store_timeout,
            ),
            sessions,
            limiter: Arc::new(RateLimiter::new(Arc::clone(&stores.rate_limits), store_timeout)),
            quota: QuotaGate::new(
                Arc::clone(&stores.usage),
                Duration::from_secs(config.cache.quota_ttl_seconds),
                config.limits.warn_threshold,
                store_timeout,
            ),
            usage: stores.usage,
            metrics: None,
            default_rate_limit: config.limits.default_rate_limit_per_hour,
            base_domain: config.server.base_domain.clone(),
        }
    }

    /// Register pipeline metrics with a Prometheus registry.
    pub fn with_metrics(mut self, registry: &prometheus::Registry) -> Result<Self, prometheus::Error> {
        self.metrics = Some(PipelineMetrics::new(registry)?);
        Ok(self)
    }

    /// Run the full pipeline for one request.
    pub async fn authenticate(
        &self,
        signals: &RequestSignals,
        requirements: RouteRequirements,
    ) -> Result<RequestContext, PipelineError> {
        let credential =
            signals.credential.clone().ok_or(CredentialError::MissingApiKey)?;

        let (caller, capabilities, credential_id, rate_limit, tenant) = match credential {
            Credential::ApiKey(raw) => {
                let hash = hash_api_key(&raw)?;
                let key = self.validator.validate(&hash).await?;
                // The key's tenant is authoritative; hint and host signals
                // never override an authenticated credential.
                let tenant = self
                    .directory
                    .resolve(&TenantSignal::Credential(key.tenant_id))
                    .await?;
                (
                    CallerIdentity::ApiKey { key_id: key.key_id },
                    key.permissions,
                    key.key_id,
                    key.rate_limit_per_hour,
                    tenant,
                )
            }
            Credential::Session(token) => {
                let claims = self.sessions.verify(&token, TokenUse::Access).await?;
                let tenant = self
                    .directory
                    .resolve(&TenantSignal::Credential(claims.tenant_id))
                    .await?;
                self.check_tenant_binding(&claims, signals).await?;
                (
                    CallerIdentity::User { user_id: claims.sub, role: claims.role },
                    CapabilitySet::normalize(&claims.permissions),
                    claims.sub,
                    self.default_rate_limit,
                    tenant,
                )
            }
        };

        TenantDirectory::ensure_active(&tenant)?;

        let decision = self.limiter.check(credential_id, rate_limit).await;
        if !decision.allowed {
            return Err(QuotaError::RateLimitExceeded {
                limit: decision.limit,
                reset_at: decision.reset_at,
            }
            .into());
        }

        let required = requirements
            .capability
            .unwrap_or_else(|| method_capability(&signals.method));
        let role = match &caller {
            CallerIdentity::User { role, .. } => Some(*role),
            CallerIdentity::ApiKey { .. } => None,
        };
        require(&capabilities, role, required)?;

        let mut quota_warning_pct = None;
        if let Some(resource) = requirements.metered {
            // Reads never consume creation quota; only mutations are gated.
            if required != Capability::Read {
                let check = self.quota.enforce(&tenant, resource).await?;
                quota_warning_pct = check.usage_pct;
            }
        }

        Ok(RequestContext {
            tenant,
            caller,
            capabilities,
            rate_limit: Some(decision),
            quota_warning_pct,
        })
    }

    /// A session token must belong to the tenant the request is addressed
    /// to. Both the `X-Tenant-ID` hint and the host signal are resolved
    /// through the directory and compared against the token's tenant. A
    /// signal that resolves to nothing (or fails to resolve) skips the
    /// check rather than failing it — the token's own tenant was already
    /// resolved and verified.
    async fn check_tenant_binding(
        &self,
        claims: &SessionClaims,
        signals: &RequestSignals,
    ) -> Result<(), PipelineError> {
        let mut addressed = Vec::new();
        if let Some(hint) = signals.tenant_hint {
            addressed.push(TenantSignal::Header(hint));
        }
        if let Some(host) = &signals.host {
            addressed.push(host.clone());
        }

        for signal in &addressed {
            match self.directory.resolve(signal).await {
                Ok(tenant) if tenant.id != claims.tenant_id => {
                    return Err(TenantError::Mismatch.into());
                }
                Ok(_) | Err(PipelineError::Tenant(TenantError::NotFound)) => {}
                Err(e) => {
                    warn!(error = %e, "Tenant lookup failed during binding check, skipping signal");
                }
            }
        }
        Ok(())
    }

    /// Fire-and-forget usage logging after a successful handler run.
    pub fn record_usage(&self, tenant_id: Uuid) {
        let usage = Arc::clone(&self.usage);
        tokio::spawn(async move {
            if let Err(e) = usage.record_request(tenant_id, Utc::now()).await {
                warn!(tenant_id = %tenant_id, error = %e, "Failed to log request usage");
            }
        });
    }

    /// Spawn the rate-limit window sweeper.
    pub fn spawn_sweeper(
        &self,
        interval: Duration,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        self.limiter.spawn_sweeper(interval, shutdown)
    }

    /// Session service, for login/refresh/logout handlers.
    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// Tenant directory, for explicit cache invalidation.
    pub fn directory(&self) -> &TenantDirectory {
        &self.directory
    }

    /// Platform base domain for host-signal parsing.
    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub(crate) fn metrics(&self) -> Option<&PipelineMetrics> {
        self.metrics.as_ref()
    }
}

/// Stage label for a denial, used as the metrics label.
pub(crate) fn denial_stage(err: &PipelineError) -> &'static str {
    match err {
        PipelineError::Credential(_) => "credential",
        PipelineError::Tenant(_) => "tenant",
        PipelineError::Quota(QuotaError::RateLimitExceeded { .. }) => "rate_limit",
        PipelineError::Quota(QuotaError::LimitExceeded { .. }) => "quota",
        PipelineError::Permission(_) => "permission",
        PipelineError::Infrastructure(_) => "infrastructure",
    }
}
