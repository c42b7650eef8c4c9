//! Medication endpoints: series creation, deletion, status toggling,
//! and the today/monthly/list/overview read shapes.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;
use crate::db::repository;
use crate::doses;
use crate::models::reminder::DATE_FORMAT;
use crate::models::{DoseAction, Frequency};
use crate::reconcile;
use crate::schedule::{self, DoseSeries};
use crate::views;

#[derive(Deserialize)]
pub struct CreateMedicationRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub time: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub frequency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct CreateMedicationResponse {
    pub success: bool,
    pub message: String,
    pub medicine_id: i64,
    pub reminders_created: usize,
}

/// `POST /api/medications` — create a medicine and expand its reminder
/// series in one transaction.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<CreateMedicationResponse>), ApiError> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(missing_fields)?;
    let dosage = req
        .dosage
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(missing_fields)?;
    let time = req.time.as_deref().ok_or_else(missing_fields)?;
    let start_date = req.start_date.as_deref().ok_or_else(missing_fields)?;

    let series = DoseSeries {
        start_date: parse_date(start_date)?,
        end_date: req.end_date.as_deref().map(parse_date).transpose()?,
        time_of_day: parse_time(time)?,
        frequency: match req.frequency.as_deref() {
            Some(f) => Frequency::from_str(f)
                .map_err(|_| ApiError::BadRequest(format!("Unknown frequency: {f}")))?,
            None => Frequency::Daily,
        },
    };

    let mut conn = ctx.core.open_db()?;
    let tx = conn.transaction()?;
    let medicine_id = repository::insert_medicine(
        &tx,
        Some(identity.user_id),
        name,
        dosage,
        req.notes.as_deref(),
    )?;
    let reminders_created = schedule::insert_series(&tx, medicine_id, &series)?;
    tx.commit()?;

    tracing::info!(medicine_id, reminders_created, "Medication series created");

    Ok((
        StatusCode::CREATED,
        Json(CreateMedicationResponse {
            success: true,
            message: format!("Medication added successfully with {reminders_created} reminders"),
            medicine_id,
            reminders_created,
        }),
    ))
}

#[derive(Serialize)]
pub struct SimpleResponse {
    pub success: bool,
    pub message: String,
}

/// `DELETE /api/medications/:id` — remove an owned medicine; its
/// occurrences cascade with it.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(medicine_id): Path<i64>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let deleted = repository::delete_medicine(&conn, medicine_id, identity.user_id)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Medication not found".into()));
    }
    Ok(Json(SimpleResponse {
        success: true,
        message: "Medication deleted successfully".into(),
    }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// `PUT /api/reminders/:id/status` — toggle one occurrence by its own id.
pub async fn set_status(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(reminder_id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let action = parse_action(&req)?;
    let conn = ctx.core.open_db()?;
    let now = Local::now().naive_local();
    doses::set_dose_status(&conn, reminder_id, action, identity.user_id, now.date(), now)?;
    Ok(Json(SimpleResponse {
        success: true,
        message: "Medication status updated successfully".into(),
    }))
}

/// `PUT /api/medications/:id/status` — toggle today's occurrence of a
/// medicine, addressed by the medicine id.
pub async fn set_status_for_medicine(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(medicine_id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<SimpleResponse>, ApiError> {
    let action = parse_action(&req)?;
    let conn = ctx.core.open_db()?;
    let now = Local::now().naive_local();

    let reminder_id =
        repository::todays_reminder_for_medicine(&conn, medicine_id, identity.user_id, now.date())?
            .ok_or_else(|| ApiError::NotFound("Medicine not found or access denied".into()))?;

    doses::set_dose_status(&conn, reminder_id, action, identity.user_id, now.date(), now)?;
    Ok(Json(SimpleResponse {
        success: true,
        message: "Medication status updated successfully".into(),
    }))
}

#[derive(Serialize)]
pub struct TodayResponse {
    pub success: bool,
    pub medications: Vec<views::DoseView>,
}

/// `GET /api/medications/today` — today's doses, reconciled first.
pub async fn today(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<TodayResponse>, ApiError> {
    reconcile::sweep_best_effort(&ctx.core);

    let conn = ctx.core.open_db()?;
    let medications = views::today_doses(&conn, identity.user_id, Local::now().date_naive())?;
    Ok(Json(TodayResponse {
        success: true,
        medications,
    }))
}

#[derive(Deserialize)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Serialize)]
pub struct MonthlyResponse {
    pub medications: BTreeMap<u32, Vec<views::CalendarEntry>>,
}

/// `GET /api/medications/monthly?year=&month=` — calendar view.
pub async fn monthly(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<MonthlyResponse>, ApiError> {
    let (Some(year), Some(month)) = (query.year, query.month) else {
        return Err(ApiError::BadRequest(
            "Year and month parameters are required".into(),
        ));
    };
    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest(format!("Invalid month: {month}")));
    }

    reconcile::sweep_best_effort(&ctx.core);

    let conn = ctx.core.open_db()?;
    let medications = views::monthly_calendar(&conn, identity.user_id, year, month)?;
    Ok(Json(MonthlyResponse { medications }))
}

#[derive(Serialize)]
pub struct MedicationListResponse {
    pub medications: Vec<views::MedicationListItem>,
}

/// `GET /api/medications` — compact per-medicine list.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MedicationListResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let medications = views::medication_list(&conn, identity.user_id)?;
    Ok(Json(MedicationListResponse { medications }))
}

#[derive(Serialize)]
pub struct OverviewResponse {
    pub medications: Vec<views::MedicationOverview>,
}

/// `GET /api/my-medications` — overview including occurrence-less medicines.
pub async fn overview(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let medications =
        views::medication_overview(&conn, identity.user_id, None, Local::now().naive_local())?;
    Ok(Json(OverviewResponse { medications }))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// `GET /api/my-medications/search?q=` — overview filtered by name.
pub async fn search(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let term = query.q.unwrap_or_default();
    let medications = views::medication_overview(
        &conn,
        identity.user_id,
        Some(&term),
        Local::now().naive_local(),
    )?;
    Ok(Json(OverviewResponse { medications }))
}

#[derive(Serialize)]
pub struct RemindersResponse {
    pub success: bool,
    pub reminders: Vec<views::ReminderListItem>,
}

/// `GET /api/medications/reminders` — every occurrence, for the calendar.
pub async fn reminders(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<RemindersResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let reminders = views::user_reminders(&conn, identity.user_id)?;
    Ok(Json(RemindersResponse {
        success: true,
        reminders,
    }))
}

fn missing_fields() -> ApiError {
    ApiError::BadRequest("Name, dosage, start date, and time are required".into())
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::BadRequest(format!("Invalid date (expected YYYY-MM-DD): {s}")))
}

fn parse_time(s: &str) -> Result<NaiveTime, ApiError> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ApiError::BadRequest(format!("Invalid time (expected HH:MM): {s}")))
}

fn parse_action(req: &StatusRequest) -> Result<DoseAction, ApiError> {
    let status = req
        .status
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Status is required".into()))?;
    DoseAction::from_str(status)
        .map_err(|_| ApiError::BadRequest(format!("Unknown status action: {status}")))
}
