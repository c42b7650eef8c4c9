//! Per-user dashboard stats.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Local;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::Identity;
use crate::reconcile;
use crate::reports::{self, DashboardStats};

#[derive(Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: DashboardStats,
}

/// `GET /api/dashboard-stats` — adherence and upcoming-dose numbers,
/// reconciled first so overdue doses read as missed.
pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DashboardResponse>, ApiError> {
    reconcile::sweep_best_effort(&ctx.core);

    let conn = ctx.core.open_db()?;
    let stats = reports::dashboard_stats(&conn, identity.user_id, Local::now().naive_local())?;
    Ok(Json(DashboardResponse {
        success: true,
        stats,
    }))
}
