//! # Pressgate API
//!
//! HTTP surface of the Pressgate authentication pipeline: request-signal
//! extraction, the pipeline composition root, the gate middleware, handler
//! extractors, the denial wire format and Prometheus metrics.
//!
//! ## Wiring
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use pressgate_api::{gate_middleware, AuthPipeline, GateState, PipelineStores};
//! use pressgate_store::MemoryBackend;
//!
//! let mut config = pressgate_config::Config::default();
//! config.auth.access_secret = "access".into();
//! config.auth.refresh_secret = "refresh".into();
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let stores = PipelineStores {
//!     tenants: backend.clone(),
//!     api_keys: backend.clone(),
//!     users: backend.clone(),
//!     rate_limits: backend.clone(),
//!     usage: backend,
//! };
//! let pipeline = Arc::new(AuthPipeline::new(stores, &config));
//!
//! let app: Router = Router::new()
//!     .route("/articles", get(|| async { "ok" }))
//!     .layer(middleware::from_fn_with_state(GateState::new(pipeline), gate_middleware));
//! ```

#![deny(unsafe_code)]

/// Credential and tenant-signal extraction
pub mod extract;
/// Handler extractors for the pipeline context
pub mod extractor;
/// Prometheus metrics
pub mod metrics;
/// Gate middleware
pub mod middleware;
/// Pipeline composition root
pub mod pipeline;
/// Denial wire format
pub mod response;

pub use extract::{extract_credential, host_signal, looks_like_jwt, tenant_hint, Credential};
pub use extractor::{OptionalContext, RequireContext};
pub use metrics::PipelineMetrics;
pub use middleware::{gate_middleware, GateState};
pub use pipeline::{AuthPipeline, PipelineStores, RequestSignals, RouteRequirements};
pub use response::Denial;
