//! Identity resolution middleware.
//!
//! One deterministic precedence for every route:
//! session cookie → `Authorization: Bearer <token>` → `X-User-Id`
//! header (role re-verified against the store) → unauthenticated.
//!
//! On success the resolved [`Identity`] is injected into request
//! extensions for downstream handlers.

use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;
use crate::db::repository;

/// Name of the session cookie set by clients after login.
const SESSION_COOKIE: &str = "session";

/// Require an authenticated identity.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let identity = resolve_identity(&ctx, req.headers())?.ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Require the admin role. Must run after [`require_auth`].
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    match req.extensions().get::<Identity>() {
        Some(identity) if identity.is_admin() => next.run(req).await,
        Some(_) => ApiError::Forbidden.into_response(),
        None => ApiError::Unauthorized.into_response(),
    }
}

/// Resolve the acting identity from request headers, if any.
pub fn resolve_identity(
    ctx: &ApiContext,
    headers: &HeaderMap,
) -> Result<Option<Identity>, ApiError> {
    // 1. Session cookie
    if let Some(token) = session_cookie(headers) {
        if let Some(identity) = ctx.core.read_sessions()?.resolve(&token) {
            return Ok(Some(identity));
        }
    }

    // 2. Bearer token
    if let Some(token) = bearer_token(headers) {
        if let Some(identity) = ctx.core.read_sessions()?.resolve(token) {
            return Ok(Some(identity));
        }
    }

    // 3. Raw user-id header; role comes from the store, not the caller
    if let Some(user_id) = headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
    {
        let conn = ctx.core.open_db()?;
        if let Some(role) = repository::get_user_role(&conn, user_id)? {
            return Ok(Some(Identity { user_id, role }));
        }
    }

    Ok(None)
}

/// The token a client presented, for logout. Same precedence as
/// [`resolve_identity`], minus the user-id fallback (nothing to revoke).
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    session_cookie(headers).or_else(|| bearer_token(headers).map(str::to_string))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("Cookie").and_then(|v| v.to_str().ok())?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}
