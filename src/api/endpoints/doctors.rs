//! Doctor CRUD, owner-scoped.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;
use crate::db::repository;

#[derive(Serialize)]
pub struct DoctorView {
    pub id: i64,
    pub name: String,
    pub specialty: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub success: bool,
    pub doctors: Vec<DoctorView>,
}

/// `GET /api/doctors` — the acting user's doctors, name-ordered.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let doctors = repository::list_doctors(&conn, identity.user_id)?
        .into_iter()
        .map(|d| DoctorView {
            id: d.doctor_id,
            name: d.name,
            specialty: d.specialization,
            phone: d.contact,
        })
        .collect();
    Ok(Json(DoctorsResponse {
        success: true,
        doctors,
    }))
}

#[derive(Deserialize)]
pub struct DoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct CreateDoctorResponse {
    pub success: bool,
    pub message: String,
    pub doctor_id: i64,
}

/// `POST /api/doctors`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<DoctorRequest>,
) -> Result<(StatusCode, Json<CreateDoctorResponse>), ApiError> {
    let name = doctor_name(&req)?;
    let conn = ctx.core.open_db()?;
    let doctor_id = repository::insert_doctor(
        &conn,
        identity.user_id,
        name,
        req.specialty.as_deref(),
        req.phone.as_deref(),
    )?;
    Ok((
        StatusCode::CREATED,
        Json(CreateDoctorResponse {
            success: true,
            message: "Doctor added successfully".into(),
            doctor_id,
        }),
    ))
}

#[derive(Serialize)]
pub struct SimpleResponse {
    pub success: bool,
    pub message: String,
}

/// `PUT /api/doctors/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(doctor_id): Path<i64>,
    Json(req): Json<DoctorRequest>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let name = doctor_name(&req)?;
    let conn = ctx.core.open_db()?;
    let changed = repository::update_doctor(
        &conn,
        doctor_id,
        identity.user_id,
        name,
        req.specialty.as_deref(),
        req.phone.as_deref(),
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Doctor not found or access denied".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "Doctor updated successfully".into(),
    }))
}

/// `DELETE /api/doctors/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let deleted = repository::delete_doctor(&conn, doctor_id, identity.user_id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Doctor not found or access denied".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "Doctor deleted successfully".into(),
    }))
}

fn doctor_name(req: &DoctorRequest) -> Result<&str, ApiError> {
    req.name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Doctor name is required".into()))
}
