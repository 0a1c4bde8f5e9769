//! Bearer-token gate for the write side of the API.

use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Accept the request only if it carries `Authorization: Bearer <ADMIN_TOKEN>`.
/// With no token configured every write is refused.
pub fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let Some(token) = auth.strip_prefix("Bearer ") else {
        return Err(ServerError::Forbidden("Missing bearer token".into()));
    };

    // Constant-time comparison to prevent timing attacks on the admin token.
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn config_with(token: Option<&str>) -> ServerConfig {
        ServerConfig {
            admin_token: token.map(String::from),
            ..ServerConfig::default()
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn disabled_without_token() {
        let result = verify_admin_token(&headers_with("Bearer anything"), &config_with(None));
        assert!(matches!(result, Err(ServerError::Forbidden(_))));
    }

    #[test]
    fn accepts_matching_bearer() {
        let config = config_with(Some("s3cret"));
        assert!(verify_admin_token(&headers_with("Bearer s3cret"), &config).is_ok());
    }

    #[test]
    fn rejects_bare_or_wrong_token() {
        let config = config_with(Some("s3cret"));
        assert!(verify_admin_token(&headers_with("s3cret"), &config).is_err());
        assert!(verify_admin_token(&headers_with("Bearer s3cre"), &config).is_err());
        assert!(verify_admin_token(&HeaderMap::new(), &config).is_err());
    }
}
