//! services/api/src/web/regulations.rs
//!
//! Handlers for the regulation endpoints.

use crate::error::{HttpError, HttpResult};
use crate::web::payload::{json_body, message, MessageResponse};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use portal_core::domain::Regulation;
use portal_core::validation::RegulationDraft;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegulationPayload {
    pub reg_id: Option<String>,
    pub reg_name: Option<String>,
}

impl From<RegulationPayload> for RegulationDraft {
    fn from(payload: RegulationPayload) -> Self {
        RegulationDraft {
            reg_id: payload.reg_id,
            reg_name: payload.reg_name,
        }
    }
}

/// Fails with a conflict while any subject still belongs to the regulation.
async fn ensure_unreferenced(state: &AppState, reg_id: &str) -> HttpResult<()> {
    let count = state.db.count_subjects_for_regulation(reg_id).await?;
    if count > 0 {
        return Err(HttpError::conflict(format!(
            "Regulation {} is used by {} subject(s)",
            reg_id, count
        )));
    }
    Ok(())
}

/// POST /add_regulation - Create a regulation
#[utoipa::path(
    post,
    path = "/add_regulation",
    request_body = RegulationPayload,
    responses(
        (status = 201, description = "Regulation added", body = MessageResponse),
        (status = 400, description = "reg_id or reg_name missing"),
        (status = 409, description = "Regulation ID already exists")
    )
)]
pub async fn add_regulation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegulationPayload>, JsonRejection>,
) -> HttpResult<impl IntoResponse> {
    let regulation = RegulationDraft::from(json_body(body)?).validate()?;
    state.db.create_regulation(&regulation).await?;
    info!("Added regulation {}", regulation.reg_id);
    Ok((StatusCode::CREATED, message("Regulation added")))
}

/// PUT /update_regulation - Rename a regulation
#[utoipa::path(
    put,
    path = "/update_regulation",
    request_body = RegulationPayload,
    responses(
        (status = 200, description = "Regulation updated", body = MessageResponse),
        (status = 400, description = "reg_id or reg_name missing"),
        (status = 404, description = "Unknown regulation"),
        (status = 409, description = "Regulation is used by subjects")
    )
)]
pub async fn update_regulation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegulationPayload>, JsonRejection>,
) -> HttpResult<impl IntoResponse> {
    let regulation = RegulationDraft::from(json_body(body)?).validate()?;
    ensure_unreferenced(&state, &regulation.reg_id).await?;
    state.db.update_regulation(&regulation).await?;
    info!("Updated regulation {}", regulation.reg_id);
    Ok(message("Regulation updated"))
}

/// DELETE /delete_regulation/{id} - Delete a regulation
#[utoipa::path(
    delete,
    path = "/delete_regulation/{id}",
    params(("id" = String, Path, description = "Regulation ID")),
    responses(
        (status = 200, description = "Regulation deleted", body = MessageResponse),
        (status = 404, description = "Unknown regulation"),
        (status = 409, description = "Regulation is used by subjects")
    )
)]
pub async fn delete_regulation(
    State(state): State<Arc<AppState>>,
    Path(reg_id): Path<String>,
) -> HttpResult<impl IntoResponse> {
    ensure_unreferenced(&state, &reg_id).await?;
    state.db.delete_regulation(&reg_id).await?;
    info!("Deleted regulation {}", reg_id);
    Ok(message("Regulation deleted"))
}

/// GET /get_regulations - List regulations ordered by ID
#[utoipa::path(
    get,
    path = "/get_regulations",
    responses((status = 200, description = "All regulations"))
)]
pub async fn list_regulations(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<Regulation>>> {
    Ok(Json(state.db.list_regulations().await?))
}
