//! PSK-based authentication module.
//!
//! Two keys: the admin key may do anything, the viewer key may read reports
//! and drive navigation sessions. Keys are compared in constant time.

use axum::{
    extract::Request,
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, ErrorResponse};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Configured pre-shared keys.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub admin: Option<String>,
    pub viewer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Viewer,
}

impl ApiKeys {
    /// Which role a presented key grants, if any.
    pub fn role_for(&self, provided: &str) -> Option<Role> {
        if let Some(admin) = &self.admin {
            if constant_time_compare(provided, admin) {
                return Some(Role::Admin);
            }
        }
        if let Some(viewer) = &self.viewer {
            if constant_time_compare(provided, viewer) {
                return Some(Role::Viewer);
            }
        }
        None
    }
}

/// PSK authentication layer function that takes the configured keys as a parameter.
pub async fn psk_auth_layer(keys: ApiKeys, request: Request, next: Next) -> Response {
    // No admin key means auth is disabled (dev mode)
    if keys.admin.is_none() {
        return next.run(request).await;
    }

    let Some(provided) = provided_key(&request) else {
        return rejection(AppError::Unauthorized(
            "Missing or invalid API key".to_string(),
        ));
    };

    match keys.role_for(&provided) {
        Some(Role::Admin) => next.run(request).await,
        Some(Role::Viewer) if viewer_may(request.method(), request.uri().path()) => {
            next.run(request).await
        }
        Some(Role::Viewer) => {
            rejection(AppError::Forbidden("Viewer key is read-only".to_string()))
        }
        None => rejection(AppError::Unauthorized("Invalid API key".to_string())),
    }
}

/// Key from `x-api-key`, falling back to `Authorization: Bearer`.
fn provided_key(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|s| s.to_string())
}

/// Viewers may read anything and drive navigation sessions.
fn viewer_may(method: &Method, path: &str) -> bool {
    if method == Method::GET || method == Method::HEAD {
        return true;
    }
    let path = path.strip_prefix("/api").unwrap_or(path);
    path == "/sessions" || path.starts_with("/sessions/")
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Auth runs before any handler, so no revision is known yet.
fn rejection(error: AppError) -> Response {
    (error.status_code(), Json(ErrorResponse::new(&error, 0))).into_response()
}
