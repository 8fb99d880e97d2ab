//! Wire format for pipeline denials
//!
//! Every denial is a JSON envelope:
//!
//! ```json
//! {"success": false, "error": {"message": "...", "code": "...", "timestamp": "..."}}
//! ```
//!
//! with extra fields per code (rate-limit state on 429, violation detail on
//! 402). Infrastructure failures always render the generic message; the
//! detail goes to logs, never to the caller.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use pressgate_types::{
    CredentialError, PipelineError, QuotaError, TenantError,
};

/// A pipeline denial ready to render.
#[derive(Debug)]
pub struct Denial(pub PipelineError);

impl Denial {
    /// HTTP status for this denial.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::Credential(_) => StatusCode::UNAUTHORIZED,
            PipelineError::Tenant(e) => match e {
                TenantError::NotFound | TenantError::Deleted => StatusCode::NOT_FOUND,
                TenantError::Suspended | TenantError::Mismatch => StatusCode::FORBIDDEN,
                TenantError::Expired => StatusCode::PAYMENT_REQUIRED,
            },
            PipelineError::Quota(e) => match e {
                QuotaError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                QuotaError::LimitExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            },
            PipelineError::Permission(_) => StatusCode::FORBIDDEN,
            PipelineError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for this denial.
    pub fn code(&self) -> &'static str {
        match &self.0 {
            PipelineError::Credential(e) => match e {
                CredentialError::MissingApiKey => "MISSING_API_KEY",
                CredentialError::MissingToken => "MISSING_TOKEN",
                CredentialError::Malformed(_) => "INVALID_FORMAT",
                CredentialError::KeyNotFound
                | CredentialError::KeyInactive
                | CredentialError::KeyExpired => "INVALID_KEY",
                CredentialError::InvalidToken(_)
                | CredentialError::TokenExpired
                | CredentialError::TokenRevoked => "INVALID_TOKEN",
            },
            PipelineError::Tenant(e) => match e {
                TenantError::NotFound | TenantError::Deleted => "TENANT_NOT_FOUND",
                TenantError::Suspended => "TENANT_SUSPENDED",
                TenantError::Expired => "TENANT_EXPIRED",
                TenantError::Mismatch => "TENANT_MISMATCH",
            },
            PipelineError::Quota(e) => match e {
                QuotaError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
                QuotaError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            },
            PipelineError::Permission(_) => "INSUFFICIENT_PERMISSIONS",
            PipelineError::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }

    /// User-facing message. Infrastructure detail never leaks here.
    pub fn message(&self) -> String {
        match &self.0 {
            PipelineError::Infrastructure(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Code-specific extra fields merged into the error object.
    fn extra(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        match &self.0 {
            PipelineError::Quota(QuotaError::RateLimitExceeded { limit, reset_at }) => {
                extra.insert("limit".into(), json!(limit));
                extra.insert("remaining".into(), json!(0));
                extra.insert("reset_at".into(), json!(reset_at));
            }
            PipelineError::Quota(QuotaError::LimitExceeded {
                resource,
                current,
                limit,
                violations,
            }) => {
                extra.insert("resource".into(), json!(resource.as_str()));
                extra.insert("current".into(), json!(current));
                extra.insert("limit".into(), json!(limit));
                extra.insert(
                    "violations".into(),
                    json!(violations.iter().map(|v| v.as_str()).collect::<Vec<_>>()),
                );
            }
            PipelineError::Permission(e) => {
                let pressgate_types::PermissionError::Insufficient { required } = e;
                extra.insert("required".into(), json!(required));
            }
            _ => {}
        }
        extra
    }

    /// The full JSON envelope.
    pub fn body(&self) -> Value {
        let mut error = Map::new();
        error.insert("message".into(), json!(self.message()));
        error.insert("code".into(), json!(self.code()));
        error.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
        error.extend(self.extra());
        json!({ "success": false, "error": Value::Object(error) })
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();

        // 429 carries the window state as headers too, matching what
        // successful responses get.
        if let PipelineError::Quota(QuotaError::RateLimitExceeded { limit, reset_at }) = &self.0 {
            let headers = response.headers_mut();
            if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
                headers.insert("x-ratelimit-limit", v);
            }
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
            if let Ok(v) = HeaderValue::from_str(&reset_at.to_string()) {
                headers.insert("x-ratelimit-reset", v);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressgate_types::{InfrastructureError, PermissionError, ResourceKind};

    #[test]
    fn test_status_and_code_table() {
        let cases: Vec<(PipelineError, StatusCode, &str)> = vec![
            (CredentialError::MissingApiKey.into(), StatusCode::UNAUTHORIZED, "MISSING_API_KEY"),
            (CredentialError::MissingToken.into(), StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            (
                CredentialError::Malformed("x".into()).into(),
                StatusCode::UNAUTHORIZED,
                "INVALID_FORMAT",
            ),
            (CredentialError::KeyInactive.into(), StatusCode::UNAUTHORIZED, "INVALID_KEY"),
            (CredentialError::TokenRevoked.into(), StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            (TenantError::NotFound.into(), StatusCode::NOT_FOUND, "TENANT_NOT_FOUND"),
            (TenantError::Deleted.into(), StatusCode::NOT_FOUND, "TENANT_NOT_FOUND"),
            (TenantError::Suspended.into(), StatusCode::FORBIDDEN, "TENANT_SUSPENDED"),
            (TenantError::Expired.into(), StatusCode::PAYMENT_REQUIRED, "TENANT_EXPIRED"),
            (TenantError::Mismatch.into(), StatusCode::FORBIDDEN, "TENANT_MISMATCH"),
            (
                QuotaError::RateLimitExceeded { limit: 100, reset_at: 0 }.into(),
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
            ),
            (
                PermissionError::Insufficient { required: "admin" }.into(),
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_PERMISSIONS",
            ),
            (
                InfrastructureError::Timeout.into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let denial = Denial(err);
            assert_eq!(denial.status(), status, "status for {code}");
            assert_eq!(denial.code(), code);
        }
    }

    #[test]
    fn test_malformed_credential_is_unauthorized() {
        // A bad credential is still an authentication failure, not a bad
        // request: the caller retries with a valid credential, same route.
        let denial = Denial(CredentialError::Malformed("empty API key".into()).into());
        assert_eq!(denial.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(denial.code(), "INVALID_FORMAT");
    }

    #[test]
    fn test_envelope_shape() {
        let body = Denial(CredentialError::KeyNotFound.into()).body();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!("INVALID_KEY"));
        assert!(body["error"]["timestamp"].is_string());
    }

    #[test]
    fn test_limit_exceeded_carries_violation_detail() {
        let body = Denial(
            QuotaError::LimitExceeded {
                resource: ResourceKind::Articles,
                current: 10,
                limit: 10,
                violations: vec![ResourceKind::Articles],
            }
            .into(),
        )
        .body();
        assert_eq!(body["error"]["resource"], json!("articles"));
        assert_eq!(body["error"]["current"], json!(10));
        assert_eq!(body["error"]["violations"], json!(["articles"]));
    }

    #[test]
    fn test_infrastructure_detail_never_leaks() {
        let denial = Denial(InfrastructureError::Unavailable("postgres://secret@db".into()).into());
        assert_eq!(denial.message(), "Internal server error");
        assert!(!denial.body().to_string().contains("postgres"));
    }
}
