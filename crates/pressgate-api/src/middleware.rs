//! Axum middleware running the authentication pipeline
//!
//! On admission the enriched [`pressgate_types::RequestContext`] is attached
//! to the request extensions for handlers and extractors. Successful responses get the
//! `X-RateLimit-*` headers and, past the soft limit, an `X-Quota-Warning`
//! header; the usage log write happens after the handler and never delays
//! the response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::extract::{extract_credential, host_signal, tenant_hint};
use crate::pipeline::{denial_stage, AuthPipeline, RequestSignals, RouteRequirements};
use crate::response::Denial;

/// State handed to [`gate_middleware`] via `from_fn_with_state`.
#[derive(Clone)]
pub struct GateState {
    pub pipeline: Arc<AuthPipeline>,
    pub requirements: RouteRequirements,
}

impl GateState {
    /// State with the default (verb-mapped, unmetered) requirements.
    pub fn new(pipeline: Arc<AuthPipeline>) -> Self {
        Self { pipeline, requirements: RouteRequirements::default() }
    }

    /// Same pipeline, different per-route requirements.
    pub fn with_requirements(&self, requirements: RouteRequirements) -> Self {
        Self { pipeline: Arc::clone(&self.pipeline), requirements }
    }
}

/// Run the pipeline, attach the context, decorate the response.
pub async fn gate_middleware(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let started = std::time::Instant::now();

    let credential = match extract_credential(request.headers(), request.uri().query()) {
        Ok(credential) => credential,
        Err(e) => return deny(&state, e.into(), started),
    };
    let signals = RequestSignals {
        credential,
        tenant_hint: tenant_hint(request.headers()),
        host: host_signal(request.headers(), state.pipeline.base_domain()),
        method: request.method().as_str().to_string(),
    };

    let context = match state.pipeline.authenticate(&signals, state.requirements).await {
        Ok(context) => context,
        Err(e) => return deny(&state, e, started),
    };

    if let Some(metrics) = state.pipeline.metrics() {
        metrics.record_allow();
        metrics.observe_duration("allow", started.elapsed());
    }

    let rate_limit = context.rate_limit;
    let quota_warning_pct = context.quota_warning_pct;
    let tenant_id = context.tenant.id;
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if response.status().is_success() {
        let headers = response.headers_mut();
        if let Some(decision) = rate_limit {
            if let Ok(v) = HeaderValue::from_str(&decision.limit.to_string()) {
                headers.insert("x-ratelimit-limit", v);
            }
            if let Ok(v) = HeaderValue::from_str(&decision.remaining.to_string()) {
                headers.insert("x-ratelimit-remaining", v);
            }
            if let Ok(v) = HeaderValue::from_str(&decision.reset_at.to_string()) {
                headers.insert("x-ratelimit-reset", v);
            }
        }
        if let Some(pct) = quota_warning_pct {
            if let Ok(v) = HeaderValue::from_str(&format!("{:.0}%", pct * 100.0)) {
                headers.insert("x-quota-warning", v);
            }
        }

        state.pipeline.record_usage(tenant_id);
    }

    response
}

fn deny(
    state: &GateState,
    err: pressgate_types::PipelineError,
    started: std::time::Instant,
) -> Response {
    // The denial body carries only the generic message; the detail goes here.
    if let pressgate_types::PipelineError::Infrastructure(e) = &err {
        tracing::error!(error = %e, "Pipeline denied request on infrastructure failure");
    }
    if let Some(metrics) = state.pipeline.metrics() {
        metrics.record_deny(denial_stage(&err));
        metrics.observe_duration("deny", started.elapsed());
    }
    Denial(err).into_response()
}
