//! Shared-secret gate for the tool invocation endpoint.

use crate::error::DbError;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Gate state: open when no secret is configured.
#[derive(Clone, Default)]
pub struct AuthConfig {
    secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl AuthConfig {
    /// Build from an optional secret; empty or blank means open.
    pub fn new(secret: Option<&str>) -> Self {
        let secret = secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        Self { secret }
    }

    pub fn open() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Check request headers against the secret. Always true when open.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), Rejection> {
        let Some(expected) = self.secret.as_deref() else {
            return Ok(());
        };
        let Some(provided) = extract_credential(headers) else {
            return Err(Rejection::Missing);
        };
        if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(Rejection::Mismatch(mask_credential(provided)))
        }
    }
}

/// Why a request was turned away. `Mismatch` carries the masked credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Missing,
    Mismatch(String),
}

/// Axum middleware enforcing [`AuthConfig`].
pub async fn auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match auth_config.authorize(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(Rejection::Missing) => {
            warn!(path = %request.uri().path(), "Authentication failed: missing API key");
            DbError::Unauthorized.into_response()
        }
        Err(Rejection::Mismatch(masked)) => {
            warn!(
                path = %request.uri().path(),
                key_prefix = %masked,
                "Authentication failed: invalid API key"
            );
            DbError::Unauthorized.into_response()
        }
    }
}

/// Bearer token first (scheme matched case-insensitively), then the
/// `x-api-key` header.
fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim_start().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

fn mask_credential(credential: &str) -> String {
    match credential.char_indices().nth(3) {
        Some((idx, _)) => format!("{}***", &credential[..idx]),
        None => "***".to_string(),
    }
}
