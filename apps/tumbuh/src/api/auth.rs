//! # API Key Access Control
//!
//! Evaluations carry child measurements, so they can be locked behind a
//! shared key. Reference tables and SD curves hold only published WHO data
//! and stay readable by chart clients unless the scope says otherwise.
//!
//! ## Configuration
//!
//! - `TUMBUH_API_KEY`: the shared key. Unset or empty disables the check.
//! - `TUMBUH_API_KEY_SCOPE`: `evaluate` (default) guards `POST /evaluate`
//!   and `POST /evaluate/batch`; `all` guards every route except `/health`.
//!
//! The key is sent as `Authorization: Bearer <key>` or `X-Api-Key: <key>`.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header accepted as an alternative to `Authorization`.
pub const API_KEY_HEADER: &str = "x-api-key";

// =============================================================================
// SCOPE
// =============================================================================

/// Which routes require the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScope {
    /// Only the evaluation endpoints.
    #[default]
    Evaluate,
    /// Everything but `/health`.
    All,
}

impl KeyScope {
    /// Parse `TUMBUH_API_KEY_SCOPE`. Unknown values lock everything.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("" | "evaluate") => KeyScope::Evaluate,
            Some("all") => KeyScope::All,
            Some(other) => {
                tracing::warn!(scope = other, "Unknown TUMBUH_API_KEY_SCOPE, guarding all routes");
                KeyScope::All
            }
        }
    }

    /// Whether a request to `path` with `method` needs the key.
    #[must_use]
    pub fn covers(self, method: &Method, path: &str) -> bool {
        if path == "/health" {
            return false;
        }
        match self {
            KeyScope::All => true,
            KeyScope::Evaluate => {
                *method == Method::POST && (path == "/evaluate" || path.starts_with("/evaluate/"))
            }
        }
    }
}

// =============================================================================
// GUARD
// =============================================================================

/// The configured key, held as a BLAKE3 digest so every comparison runs over
/// 32 bytes regardless of what the client sends.
#[derive(Clone)]
pub struct ApiKeyGuard {
    digest: [u8; 32],
    scope: KeyScope,
}

impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ApiKeyGuard {
    /// `None` when `key` is empty.
    #[must_use]
    pub fn new(key: &str, scope: KeyScope) -> Option<Self> {
        let key = key.trim();
        (!key.is_empty()).then(|| Self {
            digest: *blake3::hash(key.as_bytes()).as_bytes(),
            scope,
        })
    }

    /// Build from `TUMBUH_API_KEY` and `TUMBUH_API_KEY_SCOPE`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("TUMBUH_API_KEY").ok()?;
        let scope = KeyScope::parse(std::env::var("TUMBUH_API_KEY_SCOPE").ok().as_deref());
        Self::new(&key, scope)
    }

    #[must_use]
    pub fn scope(&self) -> KeyScope {
        self.scope
    }

    /// Constant-time check of a presented key.
    #[must_use]
    pub fn accepts(&self, presented: &str) -> bool {
        let digest = blake3::hash(presented.as_bytes());
        digest.as_bytes().ct_eq(&self.digest).into()
    }
}

/// Key presented by the client. `X-Api-Key` wins over `Authorization`, and
/// the `Bearer` scheme name is matched case-insensitively.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.trim());
    }
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Reject guarded requests that lack a valid key with 401 and a JSON body.
pub async fn require_api_key(
    State(guard): State<Arc<ApiKeyGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !guard.scope.covers(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let rejection = match presented_key(request.headers()) {
        Some(key) if guard.accepts(key) => None,
        Some(_) => Some("invalid_api_key"),
        None => Some("missing_api_key"),
    };

    match rejection {
        None => next.run(request).await,
        Some(reason) => {
            tracing::warn!(
                event = "auth_failure",
                reason,
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected request without a valid API key"
            );
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(ErrorResponse::new("a valid API key is required")),
            )
                .into_response()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers(pairs: &[(HeaderName, &'static str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(name, value)| (name.clone(), HeaderValue::from_static(value)))
            .collect()
    }

    #[test]
    fn scope_parsing() {
        assert_eq!(KeyScope::parse(None), KeyScope::Evaluate);
        assert_eq!(KeyScope::parse(Some(" Evaluate ")), KeyScope::Evaluate);
        assert_eq!(KeyScope::parse(Some("ALL")), KeyScope::All);
        assert_eq!(KeyScope::parse(Some("reads")), KeyScope::All);
    }

    #[test]
    fn evaluate_scope_leaves_reads_open() {
        let scope = KeyScope::Evaluate;
        assert!(scope.covers(&Method::POST, "/evaluate"));
        assert!(scope.covers(&Method::POST, "/evaluate/batch"));
        assert!(!scope.covers(&Method::GET, "/reference"));
        assert!(!scope.covers(&Method::GET, "/curve/wfa/MALE"));
        assert!(!scope.covers(&Method::OPTIONS, "/evaluate"));
        assert!(!scope.covers(&Method::POST, "/evaluated"));
    }

    #[test]
    fn all_scope_spares_health() {
        assert!(KeyScope::All.covers(&Method::GET, "/reference"));
        assert!(!KeyScope::All.covers(&Method::GET, "/health"));
    }

    #[test]
    fn empty_key_disables_guard() {
        assert!(ApiKeyGuard::new("", KeyScope::All).is_none());
        assert!(ApiKeyGuard::new("  ", KeyScope::All).is_none());
    }

    #[test]
    fn guard_accepts_only_the_exact_key() {
        let guard = ApiKeyGuard::new("posyandu-key", KeyScope::Evaluate).unwrap();
        assert!(guard.accepts("posyandu-key"));
        assert!(!guard.accepts("posyandu-key "));
        assert!(!guard.accepts("posyandu"));
        assert!(!guard.accepts(""));
    }

    #[test]
    fn key_extraction() {
        assert_eq!(
            presented_key(&headers(&[(header::AUTHORIZATION, "Bearer abc")])),
            Some("abc")
        );
        assert_eq!(
            presented_key(&headers(&[(header::AUTHORIZATION, "bearer  abc ")])),
            Some("abc")
        );
        assert_eq!(
            presented_key(&headers(&[(header::AUTHORIZATION, "Basic abc")])),
            None
        );
        assert_eq!(presented_key(&headers(&[(header::AUTHORIZATION, "abc")])), None);
        assert_eq!(
            presented_key(&headers(&[
                (HeaderName::from_static(API_KEY_HEADER), "from-header"),
                (header::AUTHORIZATION, "Bearer other"),
            ])),
            Some("from-header")
        );
        assert_eq!(presented_key(&HeaderMap::new()), None);
    }
}
