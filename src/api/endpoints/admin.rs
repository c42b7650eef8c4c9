//! Admin surface: user/medicine/reminder tables, the action log, and
//! the reports summary. Every route here sits behind the admin guard.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::Role;
use crate::reports;

const LOG_LISTING_CAP: u32 = 200;

#[derive(Serialize)]
pub struct AdminUserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<AdminUserView>,
}

/// `GET /api/admin/users`
pub async fn list_users(State(ctx): State<ApiContext>) -> Result<Json<UsersResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let users = repository::list_users(&conn)?
        .into_iter()
        .map(|u| AdminUserView {
            id: u.user_id,
            name: u.name,
            email: u.email,
            role: u.role.as_str().into(),
        })
        .collect();
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct SimpleResponse {
    pub success: bool,
    pub message: String,
}

/// `PUT /api/admin/users/:id`
pub async fn update_user(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let (Some(name), Some(email), Some(role)) = (&req.name, &req.email, &req.role) else {
        return Err(ApiError::BadRequest(
            "name, email, and role are required".into(),
        ));
    };
    let role = Role::from_str(role)
        .map_err(|_| ApiError::BadRequest(format!("Unknown role: {role}")))?;

    let conn = ctx.core.open_db()?;
    let changed = repository::update_user(&conn, user_id, name, email, role)?;
    if changed == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "User updated".into(),
    }))
}

/// `DELETE /api/admin/users/:id`
pub async fn delete_user(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let deleted = repository::delete_user(&conn, user_id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "User deleted".into(),
    }))
}

#[derive(Serialize)]
pub struct AdminMedicineView {
    pub id: i64,
    pub client_id: Option<i64>,
    pub name: String,
    pub dosage: String,
    pub notes: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Serialize)]
pub struct MedicinesResponse {
    pub success: bool,
    pub medicines: Vec<AdminMedicineView>,
}

/// `GET /api/admin/medicines`
pub async fn list_medicines(
    State(ctx): State<ApiContext>,
) -> Result<Json<MedicinesResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let medicines = repository::list_medicines_with_owner(&conn)?
        .into_iter()
        .map(|(m, client_name)| AdminMedicineView {
            id: m.medicine_id,
            client_id: m.client_id,
            name: m.name,
            dosage: m.dosage,
            notes: m.note,
            client_name,
        })
        .collect();
    Ok(Json(MedicinesResponse {
        success: true,
        medicines,
    }))
}

#[derive(Deserialize)]
pub struct AdminMedicineRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub notes: Option<String>,
    /// Optional; absent for catalog medicines not owned by anyone.
    pub client_id: Option<i64>,
}

#[derive(Serialize)]
pub struct CreateMedicineResponse {
    pub success: bool,
    pub medicine_id: i64,
}

/// `POST /api/admin/medicines`
pub async fn create_medicine(
    State(ctx): State<ApiContext>,
    Json(req): Json<AdminMedicineRequest>,
) -> Result<(StatusCode, Json<CreateMedicineResponse>), ApiError> {
    let (name, dosage) = medicine_fields(&req)?;
    let conn = ctx.core.open_db()?;
    let medicine_id =
        repository::insert_medicine(&conn, req.client_id, name, dosage, req.notes.as_deref())?;
    Ok((
        StatusCode::CREATED,
        Json(CreateMedicineResponse {
            success: true,
            medicine_id,
        }),
    ))
}

/// `PUT /api/admin/medicines/:id`
pub async fn update_medicine(
    State(ctx): State<ApiContext>,
    Path(medicine_id): Path<i64>,
    Json(req): Json<AdminMedicineRequest>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let (name, dosage) = medicine_fields(&req)?;
    let conn = ctx.core.open_db()?;
    let changed =
        repository::update_medicine(&conn, medicine_id, name, dosage, req.notes.as_deref())?;
    if changed == 0 {
        return Err(ApiError::NotFound("Medicine not found".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "Medicine updated".into(),
    }))
}

/// `DELETE /api/admin/medicines/:id` — reminders cascade.
pub async fn delete_medicine(
    State(ctx): State<ApiContext>,
    Path(medicine_id): Path<i64>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let deleted = repository::delete_medicine_admin(&conn, medicine_id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Medicine not found".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "Medicine deleted".into(),
    }))
}

#[derive(Serialize)]
pub struct RemindersResponse {
    pub success: bool,
    pub reminders: Vec<repository::AdminReminderRow>,
}

/// `GET /api/admin/reminders` — global listing, most recent first.
pub async fn list_reminders(
    State(ctx): State<ApiContext>,
) -> Result<Json<RemindersResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let reminders = repository::list_reminders_admin(&conn)?;
    Ok(Json(RemindersResponse {
        success: true,
        reminders,
    }))
}

/// `DELETE /api/admin/reminders/:id`
pub async fn delete_reminder(
    State(ctx): State<ApiContext>,
    Path(reminder_id): Path<i64>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let deleted = repository::delete_reminder(&conn, reminder_id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Reminder not found".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "Reminder deleted".into(),
    }))
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub success: bool,
    pub logs: Vec<repository::ActionLogEntry>,
}

/// `GET /api/admin/logs` — recent completed-dose actions, joined back
/// to medicine and owner.
pub async fn logs(State(ctx): State<ApiContext>) -> Result<Json<LogsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let logs = repository::list_recent_actions(&conn, LOG_LISTING_CAP)?;
    Ok(Json(LogsResponse {
        success: true,
        logs,
    }))
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: reports::AdminSummary,
}

/// `GET /api/admin/reports/summary`
pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<SummaryResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let summary = reports::admin_summary(&conn)?;
    Ok(Json(SummaryResponse {
        success: true,
        summary,
    }))
}

fn medicine_fields(req: &AdminMedicineRequest) -> Result<(&str, &str), ApiError> {
    match (
        req.name.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        req.dosage.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    ) {
        (Some(name), Some(dosage)) => Ok((name, dosage)),
        _ => Err(ApiError::BadRequest("name and dosage are required".into())),
    }
}
