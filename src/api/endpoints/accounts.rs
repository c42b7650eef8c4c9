//! Account endpoints: signup, login, logout, auth check.

use std::str::FromStr;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::middleware::auth::{presented_token, resolve_identity};
use crate::api::types::ApiContext;
use crate::auth::{self, Identity};
use crate::db::repository;
use crate::models::Role;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub contact: Option<String>,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: i64,
    pub role: String,
}

/// `POST /signup` — create an account (client profile row for clients).
pub async fn signup(
    State(ctx): State<ApiContext>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let name = required(&req.name, "Name, email, and password are required")?;
    let email = required(&req.email, "Name, email, and password are required")?;
    let password = required(&req.password, "Name, email, and password are required")?;

    let role = match &req.role {
        Some(r) => Role::from_str(r).map_err(|_| ApiError::BadRequest(format!("Unknown role: {r}")))?,
        None => Role::Client,
    };

    let mut conn = ctx.core.open_db()?;
    if repository::email_exists(&conn, email)? {
        return Err(ApiError::Conflict("Email already exists".into()));
    }

    let password_hash = auth::hash_password(password)?;

    let tx = conn.transaction()?;
    let user_id = repository::insert_user(&tx, name, email, &password_hash, role).map_err(|e| {
        if e.is_unique_violation() {
            ApiError::Conflict("Email already exists".into())
        } else {
            ApiError::from(e)
        }
    })?;
    if role == Role::Client {
        repository::insert_client_profile(
            &tx,
            user_id,
            req.age,
            req.gender.as_deref(),
            req.contact.as_deref(),
        )?;
    }
    tx.commit()?;

    tracing::info!(user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".into(),
            user_id,
            role: role.as_str().into(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct UserInfo {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

/// `POST /login` — verify credentials and mint a session token.
///
/// The token works both as a `session` cookie value and as a bearer token.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = required(&req.email, "Email and password are required")?;
    let password = required(&req.password, "Email and password are required")?;

    let conn = ctx.core.open_db()?;
    let user = repository::get_user_by_email(&conn, email)?
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password(&user.password_hash, password) {
        return Err(ApiError::InvalidCredentials);
    }

    if user.role == Role::Admin {
        repository::touch_admin_login(&conn, user.user_id, Local::now().naive_local())?;
    }

    let token = ctx.core.write_sessions()?.issue(Identity {
        user_id: user.user_id,
        role: user.role,
    });

    tracing::debug!(user_id = user.user_id, "Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: UserInfo {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role.as_str().into(),
        },
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// `POST /logout` — revoke the presented session token, if any.
pub async fn logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    if let Some(token) = presented_token(&headers) {
        ctx.core.write_sessions()?.revoke(&token);
    }
    Ok(Json(LogoutResponse {
        message: "Logout successful".into(),
    }))
}

#[derive(Serialize)]
pub struct CheckAuthResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// `GET /check-auth` — report the authenticated identity, if any.
pub async fn check_auth(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<CheckAuthResponse>, ApiError> {
    let identity = match resolve_identity(&ctx, &headers)? {
        Some(identity) => identity,
        None => {
            return Ok(Json(CheckAuthResponse {
                authenticated: false,
                user: None,
            }))
        }
    };

    let conn = ctx.core.open_db()?;
    let user = repository::get_user(&conn, identity.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(CheckAuthResponse {
        authenticated: true,
        user: Some(UserInfo {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role.as_str().into(),
        }),
    }))
}

fn required<'a>(field: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(message.into())),
    }
}
