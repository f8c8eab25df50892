//! # Browser Origins
//!
//! Growth charts are usually drawn by a web front-end on another origin.
//! `TUMBUH_CORS_ORIGINS` lists the origins allowed to call the API:
//! `*` for any, a comma-separated list, or unset for local development
//! servers only.

use super::auth::API_KEY_HEADER;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Origins of the usual local front-end dev servers.
const LOCAL_DEV_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Parsed origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Parse the value of `TUMBUH_CORS_ORIGINS`. Entries that are not valid
    /// header values, and a `*` inside a list, are dropped. If none survive,
    /// local dev origins apply.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::local_dev();
        };
        if value == "*" {
            return CorsOrigins::Any;
        }

        let origins: Vec<HeaderValue> = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty() && *origin != "*")
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin, "CORS: ignoring invalid origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            Self::local_dev()
        } else {
            CorsOrigins::List(origins)
        }
    }

    /// Policy from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(std::env::var("TUMBUH_CORS_ORIGINS").ok().as_deref())
    }

    fn local_dev() -> Self {
        CorsOrigins::List(
            LOCAL_DEV_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
        )
    }

    /// The tower-http layer for this policy. Clients may send JSON bodies and
    /// either form of API key.
    #[must_use]
    pub fn layer(&self) -> CorsLayer {
        let origin = match self {
            CorsOrigins::Any => {
                tracing::warn!("CORS: allowing every origin (TUMBUH_CORS_ORIGINS=*)");
                AllowOrigin::any()
            }
            CorsOrigins::List(origins) => {
                tracing::info!(count = origins.len(), "CORS: allowing listed origins");
                AllowOrigin::list(origins.iter().cloned())
            }
        };
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static(API_KEY_HEADER),
            ])
    }
}
