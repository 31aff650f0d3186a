//! services/api/src/web/dashboard.rs

use crate::error::HttpResult;
use crate::web::state::AppState;
use axum::{extract::State, Json};
use portal_core::domain::{Bucket, DepartmentStats};
use std::sync::Arc;

/// GET /get_hod_stats - Record counts for the HOD dashboard
#[utoipa::path(
    get,
    path = "/get_hod_stats",
    responses((status = 200, description = "faculty, subjects, papers and questionbanks counts"))
)]
pub async fn get_hod_stats(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<DepartmentStats>> {
    let counts = state.db.count_records().await?;
    let questionbanks = state.files.count(Bucket::QuestionBanks, "pdf").await?;
    Ok(Json(DepartmentStats {
        faculty: counts.faculty,
        subjects: counts.subjects,
        papers: counts.papers,
        questionbanks: i64::try_from(questionbanks).unwrap_or(i64::MAX),
    }))
}
