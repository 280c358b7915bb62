//! # Authentication Module
//!
//! HTTP Basic authentication for the SteamGraph API.
//!
//! ## Configuration
//!
//! Enabled when both `auth.username` and `auth.password` are configured
//! (or `STEAMGRAPH_USERNAME` / `STEAMGRAPH_PASSWORD`). `/health` is always
//! reachable.
//!
//! ## Usage
//!
//! ```text
//! Authorization: Basic base64(<username>:<password>)
//! ```

use crate::config::AuthConfig;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Expected Basic credentials.
#[derive(Clone)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl BasicCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `None` when authentication is not configured.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        config
            .credentials()
            .map(|(user, pass)| Self::new(user, pass))
    }

    /// Check an `Authorization` header value. Both fields are always
    /// compared, in constant time.
    #[must_use]
    pub fn verify(&self, header_value: &str) -> bool {
        let Some(encoded) = header_value.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        let Some((user, pass)) = decoded.split_once(':') else {
            return false;
        };

        let user_ok = constant_time_eq(user.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(pass.as_bytes(), self.password.as_bytes());
        user_ok & pass_ok
    }
}

/// Compare two byte strings in constant time.
///
/// Both sides are padded to the same length so `ct_eq` always runs over the
/// same number of bytes; the lengths are compared separately.
fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match & (provided.len() == expected.len())
}

/// 401 with a challenge so browsers prompt for credentials.
fn unauthorized() -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"steamgraph\""),
    );
    response
}

/// Basic authentication middleware.
///
/// - `/health` is always allowed (for load balancer health checks)
/// - Every other path requires valid Basic credentials
pub async fn basic_auth_middleware(
    State(credentials): State<Arc<BasicCredentials>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if credentials.verify(value) => next.run(request).await,
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_credentials",
                "Authentication failed: invalid credentials"
            );
            unauthorized()
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            unauthorized()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
    }

    #[test]
    fn accepts_matching_credentials() {
        let creds = BasicCredentials::new("admin", "s3cret:with:colons");
        assert!(creds.verify(&basic("admin", "s3cret:with:colons")));
    }

    #[test]
    fn rejects_wrong_user_or_password() {
        let creds = BasicCredentials::new("admin", "secret");
        assert!(!creds.verify(&basic("admin", "wrong")));
        assert!(!creds.verify(&basic("root", "secret")));
        assert!(!creds.verify(&basic("admin", "secret-longer")));
    }

    #[test]
    fn rejects_malformed_headers() {
        let creds = BasicCredentials::new("admin", "secret");
        assert!(!creds.verify("Bearer abc"));
        assert!(!creds.verify("Basic !!!not-base64!!!"));
        assert!(!creds.verify(&format!("Basic {}", STANDARD.encode("no-colon"))));
    }

    #[test]
    fn unconfigured_auth_yields_none() {
        assert!(BasicCredentials::from_config(&AuthConfig::default()).is_none());

        let half = AuthConfig {
            username: Some("admin".into()),
            password: None,
        };
        assert!(BasicCredentials::from_config(&half).is_none());
    }
}
