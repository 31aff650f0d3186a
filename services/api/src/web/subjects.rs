//! services/api/src/web/subjects.rs
//!
//! Handlers for the subject endpoints.

use crate::error::{HttpError, HttpResult};
use crate::web::payload::{json_body, message, string_or_number, MessageResponse};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use portal_core::domain::{Subject, SubjectFilter};
use portal_core::ports::PortError;
use portal_core::validation::{parse_semester, SubjectDraft};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

/// A subject as posted by the dashboard. Numeric fields may be strings.
#[derive(Deserialize, ToSchema)]
pub struct SubjectPayload {
    #[serde(default, deserialize_with = "string_or_number")]
    pub subject_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub subject_code: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub subject_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub regulation_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub credits: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub faculty_assign: Option<String>,
}

impl From<SubjectPayload> for SubjectDraft {
    fn from(p: SubjectPayload) -> Self {
        SubjectDraft {
            subject_id: p.subject_id,
            subject_code: p.subject_code,
            subject_name: p.subject_name,
            regulation_id: p.regulation_id,
            semester: p.semester,
            credits: p.credits,
            faculty_assign: p.faculty_assign,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct SubjectQuery {
    pub regulation: Option<String>,
    pub semester: Option<String>,
    pub faculty: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `None` for a blank value or `All`, otherwise a semester in range.
fn semester_filter(raw: Option<String>) -> HttpResult<Option<i32>> {
    match non_blank(raw) {
        None => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => Ok(Some(parse_semester(&s)?)),
    }
}

/// Checks that the regulation and the assigned faculty exist.
async fn ensure_references(state: &AppState, subject: &Subject) -> HttpResult<()> {
    match state.db.get_regulation(&subject.regulation_id).await {
        Ok(_) => {}
        Err(PortError::NotFound(_)) => {
            return Err(HttpError::bad_request(format!(
                "Regulation {} does not exist",
                subject.regulation_id
            )))
        }
        Err(e) => return Err(e.into()),
    }
    if let Some(faculty_id) = &subject.faculty_assign {
        match state.db.get_faculty(faculty_id).await {
            Ok(_) => {}
            Err(PortError::NotFound(_)) => {
                return Err(HttpError::bad_request(format!(
                    "Faculty {} does not exist",
                    faculty_id
                )))
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// POST /add_subject - Create a subject
#[utoipa::path(
    post,
    path = "/add_subject",
    request_body = SubjectPayload,
    responses(
        (status = 201, description = "Subject added", body = MessageResponse),
        (status = 400, description = "Missing or invalid field, or unknown regulation/faculty"),
        (status = 409, description = "Subject ID already exists")
    )
)]
pub async fn add_subject(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubjectPayload>, JsonRejection>,
) -> HttpResult<impl IntoResponse> {
    let subject = SubjectDraft::from(json_body(body)?).validate()?;
    ensure_references(&state, &subject).await?;
    state.db.create_subject(&subject).await?;
    info!("Added subject {} ({})", subject.subject_id, subject.subject_code);
    Ok((StatusCode::CREATED, message("Subject added successfully!")))
}

/// PUT /update_subject - Replace a subject's fields
#[utoipa::path(
    put,
    path = "/update_subject",
    request_body = SubjectPayload,
    responses(
        (status = 200, description = "Subject updated", body = MessageResponse),
        (status = 400, description = "Missing or invalid field, or unknown regulation/faculty"),
        (status = 404, description = "Unknown subject")
    )
)]
pub async fn update_subject(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubjectPayload>, JsonRejection>,
) -> HttpResult<impl IntoResponse> {
    let subject = SubjectDraft::from(json_body(body)?).validate()?;
    ensure_references(&state, &subject).await?;
    state.db.update_subject(&subject).await?;
    info!("Updated subject {}", subject.subject_id);
    Ok(message("Subject updated successfully!"))
}

/// DELETE /delete_subject/{id} - Delete a subject
#[utoipa::path(
    delete,
    path = "/delete_subject/{id}",
    params(("id" = String, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject deleted", body = MessageResponse),
        (status = 404, description = "Unknown subject")
    )
)]
pub async fn delete_subject(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
) -> HttpResult<impl IntoResponse> {
    state.db.delete_subject(&subject_id).await?;
    info!("Deleted subject {}", subject_id);
    Ok(message("Subject deleted successfully!"))
}

/// GET /get_subjects - List subjects, optionally filtered
#[utoipa::path(
    get,
    path = "/get_subjects",
    params(
        ("regulation" = Option<String>, Query, description = "Regulation ID"),
        ("semester" = Option<String>, Query, description = "Semester 1-8 or All"),
        ("faculty" = Option<String>, Query, description = "Assigned faculty ID")
    ),
    responses(
        (status = 200, description = "Matching subjects with their regulation name"),
        (status = 400, description = "Invalid semester")
    )
)]
pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubjectQuery>,
) -> HttpResult<Json<Vec<Subject>>> {
    let filter = SubjectFilter {
        regulation: non_blank(query.regulation),
        semester: semester_filter(query.semester)?,
        faculty: non_blank(query.faculty),
    };
    Ok(Json(state.db.list_subjects(&filter).await?))
}

/// GET /get_subjects/{semester} - List the subjects of one semester
#[utoipa::path(
    get,
    path = "/get_subjects/{semester}",
    params(("semester" = String, Path, description = "Semester 1-8 or All")),
    responses(
        (status = 200, description = "Subjects of the semester"),
        (status = 400, description = "Invalid semester")
    )
)]
pub async fn list_subjects_by_semester(
    State(state): State<Arc<AppState>>,
    Path(semester): Path<String>,
) -> HttpResult<Json<Vec<Subject>>> {
    let filter = SubjectFilter {
        semester: semester_filter(Some(semester))?,
        ..SubjectFilter::default()
    };
    Ok(Json(state.db.list_subjects(&filter).await?))
}
