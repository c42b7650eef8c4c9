//! Feature flags: public read, admin-only upsert.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;

/// `GET /api/feature-status` — the full flag map, publicly readable.
pub async fn status(
    State(ctx): State<ApiContext>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let flags = repository::all_flags(&conn)?;
    Ok(Json(flags))
}

#[derive(Deserialize)]
pub struct SetFlagRequest {
    pub key: Option<String>,
    pub value: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SetFlagResponse {
    pub success: bool,
    pub key: String,
    pub value: String,
}

/// `POST /api/admin/feature` — upsert one flag. Boolean-ish values
/// normalize to "1"/"0".
pub async fn set_flag(
    State(ctx): State<ApiContext>,
    Json(req): Json<SetFlagRequest>,
) -> Result<Json<SetFlagResponse>, ApiError> {
    let key = req
        .key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing key".into()))?;

    let value = normalize_flag_value(req.value.as_ref().unwrap_or(&serde_json::Value::Null));

    let conn = ctx.core.open_db()?;
    repository::set_flag(&conn, key, &value)?;

    Ok(Json(SetFlagResponse {
        success: true,
        key: key.to_string(),
        value,
    }))
}

fn normalize_flag_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Bool(true) => "1".to_string(),
        serde_json::Value::Bool(false) => "0".to_string(),
        serde_json::Value::String(s) if matches!(s.as_str(), "1" | "true" | "True") => {
            "1".to_string()
        }
        serde_json::Value::String(s) if matches!(s.as_str(), "0" | "false" | "False") => {
            "0".to_string()
        }
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
