//! Credential and tenant-signal extraction from HTTP requests
//!
//! Credential carriers in priority order: `X-API-Key` header, `Authorization`
//! bearer (shape decides whether it is a session token or a raw key), then
//! the `api_key` query parameter. The `X-Tenant-ID` header and the Host
//! header are tenant signals, never credentials.

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use pressgate_auth::TenantSignal;
use pressgate_types::CredentialError;

/// A credential as presented on the wire, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Raw API key (machine caller)
    ApiKey(String),
    /// Encoded session token (human caller)
    Session(String),
}

/// Whether a bearer value is JWT-shaped (three dot-separated segments).
///
/// Raw API keys contain no dots, so the shape alone routes the bearer to the
/// right validation path.
pub fn looks_like_jwt(value: &str) -> bool {
    value.split('.').count() == 3
}

/// Extract the caller's credential in priority order.
///
/// Returns `Ok(None)` when no carrier is present; the pipeline turns that
/// into the missing-credential denial. An empty key carrier is malformed; a
/// Bearer scheme with nothing after it is a missing token.
pub fn extract_credential(
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<Option<Credential>, CredentialError> {
    if let Some(value) = headers.get("x-api-key") {
        let key = value
            .to_str()
            .map_err(|_| CredentialError::Malformed("X-API-Key header is not valid ASCII".into()))?
            .trim();
        if key.is_empty() {
            return Err(CredentialError::Malformed("X-API-Key header is empty".into()));
        }
        return Ok(Some(Credential::ApiKey(key.to_string())));
    }

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let auth = value.to_str().map_err(|_| {
            CredentialError::Malformed("Authorization header is not valid ASCII".into())
        })?;
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| {
                CredentialError::Malformed("Authorization header must use Bearer scheme".into())
            })?
            .trim();
        if token.is_empty() {
            return Err(CredentialError::MissingToken);
        }
        return Ok(Some(if looks_like_jwt(token) {
            Credential::Session(token.to_string())
        } else {
            Credential::ApiKey(token.to_string())
        }));
    }

    if let Some(key) = query_param(query, "api_key") {
        if key.is_empty() {
            return Err(CredentialError::Malformed("api_key query parameter is empty".into()));
        }
        return Ok(Some(Credential::ApiKey(key)));
    }

    Ok(None)
}

/// Tenant id hinted via `X-Tenant-ID`. A malformed hint is ignored, not an
/// error: it is advisory and never a credential.
pub fn tenant_hint(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// Tenant signal implied by the Host header, port stripped.
///
/// `{sub}.{base_domain}` is a subdomain signal; the bare base domain carries
/// no tenant; anything else is a custom domain.
pub fn host_signal(headers: &HeaderMap, base_domain: &str) -> Option<TenantSignal> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let host = host.rsplit_once(':').map_or(host, |(h, _)| h).trim().to_ascii_lowercase();
    if host.is_empty() || host == base_domain {
        return None;
    }

    match host.strip_suffix(&format!(".{base_domain}")) {
        Some(sub) if !sub.is_empty() && !sub.contains('.') => {
            Some(TenantSignal::Subdomain(sub.to_string()))
        }
        // Nested subdomains are not tenant slugs; treat the whole host as a
        // custom domain and let resolution decide.
        _ => Some(TenantSignal::CustomDomain(host)),
    }
}

// Values are taken verbatim, no percent-decoding: minted keys are "pg_" plus
// hex and contain nothing a client would escape.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_api_key_header_wins_over_bearer() {
        let h = headers(&[("x-api-key", "pg_abc"), ("authorization", "Bearer a.b.c")]);
        let cred = extract_credential(&h, None).unwrap().unwrap();
        assert_eq!(cred, Credential::ApiKey("pg_abc".into()));
    }

    #[test]
    fn test_bearer_shape_routes_jwt_vs_key() {
        let h = headers(&[("authorization", "Bearer aaa.bbb.ccc")]);
        assert_eq!(
            extract_credential(&h, None).unwrap().unwrap(),
            Credential::Session("aaa.bbb.ccc".into())
        );

        let h = headers(&[("authorization", "Bearer pg_rawkey")]);
        assert_eq!(
            extract_credential(&h, None).unwrap().unwrap(),
            Credential::ApiKey("pg_rawkey".into())
        );
    }

    #[test]
    fn test_query_param_is_last_resort() {
        let cred = extract_credential(&HeaderMap::new(), Some("page=2&api_key=pg_q")).unwrap();
        assert_eq!(cred, Some(Credential::ApiKey("pg_q".into())));
    }

    #[test]
    fn test_query_param_value_taken_verbatim() {
        let cred = extract_credential(&HeaderMap::new(), Some("api_key=pg%5Fq")).unwrap();
        assert_eq!(cred, Some(Credential::ApiKey("pg%5Fq".into())));
    }

    #[test]
    fn test_no_carrier_is_none() {
        assert_eq!(extract_credential(&HeaderMap::new(), Some("page=2")).unwrap(), None);
        assert_eq!(extract_credential(&HeaderMap::new(), None).unwrap(), None);
    }

    #[test]
    fn test_empty_carriers_are_malformed() {
        let h = headers(&[("x-api-key", "  ")]);
        assert!(matches!(
            extract_credential(&h, None),
            Err(CredentialError::Malformed(_))
        ));

        let h = headers(&[("authorization", "Basic dXNlcg==")]);
        assert!(matches!(
            extract_credential(&h, None),
            Err(CredentialError::Malformed(_))
        ));

        assert!(matches!(
            extract_credential(&HeaderMap::new(), Some("api_key=")),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_bare_bearer_scheme_is_missing_token() {
        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(
            extract_credential(&h, None),
            Err(CredentialError::MissingToken)
        );
    }

    #[test]
    fn test_tenant_hint_ignores_garbage() {
        let id = Uuid::new_v4();
        let h = headers(&[("x-tenant-id", &id.to_string())]);
        assert_eq!(tenant_hint(&h), Some(id));

        let h = headers(&[("x-tenant-id", "not-a-uuid")]);
        assert_eq!(tenant_hint(&h), None);
    }

    #[test]
    fn test_host_signal_subdomain() {
        let h = headers(&[("host", "acme.pressgate.dev")]);
        assert_eq!(
            host_signal(&h, "pressgate.dev"),
            Some(TenantSignal::Subdomain("acme".into()))
        );
    }

    #[test]
    fn test_host_signal_strips_port() {
        let h = headers(&[("host", "acme.pressgate.dev:8080")]);
        assert_eq!(
            host_signal(&h, "pressgate.dev"),
            Some(TenantSignal::Subdomain("acme".into()))
        );
    }

    #[test]
    fn test_host_signal_custom_domain() {
        let h = headers(&[("host", "blog.acme.com")]);
        assert_eq!(
            host_signal(&h, "pressgate.dev"),
            Some(TenantSignal::CustomDomain("blog.acme.com".into()))
        );
    }

    #[test]
    fn test_bare_base_domain_carries_no_tenant() {
        let h = headers(&[("host", "pressgate.dev")]);
        assert_eq!(host_signal(&h, "pressgate.dev"), None);
    }

    #[test]
    fn test_nested_subdomain_is_custom_domain() {
        let h = headers(&[("host", "a.b.pressgate.dev")]);
        assert_eq!(
            host_signal(&h, "pressgate.dev"),
            Some(TenantSignal::CustomDomain("a.b.pressgate.dev".into()))
        );
    }
}
