//! Axum extractors for the pipeline context
//!
//! - `RequireContext`: requires an admitted request, returns 401 otherwise
//! - `OptionalContext`: never fails, for routes that serve both public and
//!   authenticated traffic

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};

use pressgate_types::RequestContext;

/// Extractor that requires a pipeline-admitted request.
///
/// Returns 401 if the [`RequestContext`] is not present in the request
/// extensions, i.e. the gate middleware did not run on this route.
#[derive(Debug, Clone)]
pub struct RequireContext(pub RequestContext);

impl<S> FromRequestParts<S> for RequireContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestContext>().cloned().map(RequireContext).ok_or_else(|| {
            (StatusCode::UNAUTHORIZED, "Authentication required but not present").into_response()
        })
    }
}

/// Extractor for an optional pipeline context.
#[derive(Debug, Clone)]
pub struct OptionalContext(pub Option<RequestContext>);

impl<S> FromRequestParts<S> for OptionalContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalContext(parts.extensions.get::<RequestContext>().cloned()))
    }
}
