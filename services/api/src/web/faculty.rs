//! services/api/src/web/faculty.rs
//!
//! Handlers for faculty records and their profile PDFs.

use crate::error::{HttpError, HttpResult};
use crate::web::auth::hash_password;
use crate::web::payload::{pdf_response, Disposition, FormData, UploadedFile};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use portal_core::domain::{Bucket, Faculty};
use portal_core::validation::{is_pdf, sanitize_filename, ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct FacultyStatus {
    pub status: String,
    pub message: String,
}

impl FacultyStatus {
    fn success(message: &str) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            message: message.to_string(),
        })
    }
}

#[derive(Serialize)]
pub struct FacultyList {
    pub status: &'static str,
    pub data: Vec<Faculty>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

/// Builds a profile from form fields; `profile_pdf` is filled in by the caller.
fn faculty_from_form(form: &FormData, faculty_id: String) -> Result<Faculty, ValidationError> {
    let date_of_joining = form
        .text("date_of_joining")
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| ValidationError::Invalid {
                field: "date_of_joining",
                reason: format!("'{}' is not a YYYY-MM-DD date", raw),
            })
        })
        .transpose()?;

    Ok(Faculty {
        faculty_id,
        name: form.text("name").ok_or(ValidationError::Missing("name"))?,
        designation: form
            .text("designation")
            .ok_or(ValidationError::Missing("designation"))?,
        date_of_joining,
        qualification: form.text("qualification"),
        nature_of_association: form.text("nature_of_association"),
        profile_pdf: None,
        email: form.text("email"),
        phone: form.text("phone"),
        experience: form.text("experience"),
        research_interests: form.text("research_interests"),
    })
}

/// Stores an uploaded profile PDF and returns its storage key.
async fn store_profile(state: &AppState, file: UploadedFile) -> HttpResult<String> {
    if !is_pdf(&file.file_name) {
        return Err(HttpError::bad_request("Profile must be a PDF file"));
    }
    let safe = sanitize_filename(&file.file_name)
        .ok_or_else(|| HttpError::bad_request("Invalid filename"))?;
    let key = format!("{}_{}", Uuid::new_v4().simple(), safe);
    state
        .files
        .put(Bucket::FacultyProfiles, &key, file.data)
        .await?;
    Ok(key)
}

async fn discard_profile(state: &AppState, key: &str) {
    if let Err(e) = state.files.delete(Bucket::FacultyProfiles, key).await {
        warn!("Failed to remove profile {}: {}", key, e);
    }
}

/// POST /add_faculty - Create a faculty record (multipart)
#[utoipa::path(
    post,
    path = "/add_faculty",
    request_body(content_type = "multipart/form-data", description = "Faculty fields, password and an optional profile_pdf file."),
    responses(
        (status = 201, description = "Faculty added", body = FacultyStatus),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Faculty ID already exists")
    )
)]
pub async fn add_faculty(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> HttpResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let faculty_id = form
        .text("faculty_id")
        .ok_or(ValidationError::Missing("faculty_id"))?;
    let mut faculty = faculty_from_form(&form, faculty_id)?;
    let password = form
        .text("password")
        .ok_or(ValidationError::Missing("password"))?;
    let password_hash = hash_password(&password)?;

    if let Some(file) = form.take_file("profile_pdf") {
        faculty.profile_pdf = Some(store_profile(&state, file).await?);
    }

    if let Err(e) = state.db.create_faculty(&faculty, &password_hash).await {
        if let Some(key) = &faculty.profile_pdf {
            discard_profile(&state, key).await;
        }
        return Err(e.into());
    }

    info!("Added faculty {}", faculty.faculty_id);
    Ok((
        StatusCode::CREATED,
        FacultyStatus::success("Faculty added successfully"),
    ))
}

/// GET /get_faculty - List faculty ordered by name
#[utoipa::path(
    get,
    path = "/get_faculty",
    responses((status = 200, description = "All faculty profiles"))
)]
pub async fn list_faculty(State(state): State<Arc<AppState>>) -> HttpResult<Json<FacultyList>> {
    Ok(Json(FacultyList {
        status: "success",
        data: state.db.list_faculty().await?,
    }))
}

/// GET /search_faculty?keyword= - Match faculty by ID or name
#[utoipa::path(
    get,
    path = "/search_faculty",
    params(("keyword" = Option<String>, Query, description = "Substring of the ID or name")),
    responses((status = 200, description = "Matching faculty profiles"))
)]
pub async fn search_faculty(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> HttpResult<Json<FacultyList>> {
    let keyword = query.keyword.unwrap_or_default();
    let data = match keyword.trim() {
        "" => state.db.list_faculty().await?,
        keyword => state.db.search_faculty(keyword).await?,
    };
    Ok(Json(FacultyList {
        status: "success",
        data,
    }))
}

/// POST /update_faculty/{id} - Update a faculty record (multipart)
///
/// A blank password keeps the stored one; no uploaded file keeps the current profile.
#[utoipa::path(
    post,
    path = "/update_faculty/{id}",
    params(("id" = String, Path, description = "Faculty ID")),
    request_body(content_type = "multipart/form-data", description = "Faculty fields, optional password and profile_pdf."),
    responses(
        (status = 200, description = "Faculty updated", body = FacultyStatus),
        (status = 400, description = "Missing or invalid field"),
        (status = 404, description = "Unknown faculty")
    )
)]
pub async fn update_faculty(
    State(state): State<Arc<AppState>>,
    Path(faculty_id): Path<String>,
    multipart: Multipart,
) -> HttpResult<impl IntoResponse> {
    let mut form = FormData::read(multipart).await?;
    let existing = state.db.get_faculty(&faculty_id).await?;
    let mut faculty = faculty_from_form(&form, existing.faculty_id.clone())?;
    faculty.profile_pdf = existing.profile_pdf.clone();

    let password_hash = match form.text("password") {
        Some(password) => Some(hash_password(&password)?),
        None => None,
    };

    let uploaded = match form.take_file("profile_pdf") {
        Some(file) => Some(store_profile(&state, file).await?),
        None => None,
    };
    if let Some(key) = &uploaded {
        faculty.profile_pdf = Some(key.clone());
    }

    if let Err(e) = state
        .db
        .update_faculty(&faculty, password_hash.as_deref())
        .await
    {
        if let Some(key) = &uploaded {
            discard_profile(&state, key).await;
        }
        return Err(e.into());
    }

    if let (Some(_), Some(old)) = (&uploaded, &existing.profile_pdf) {
        discard_profile(&state, old).await;
    }

    info!("Updated faculty {}", faculty.faculty_id);
    Ok(FacultyStatus::success("Faculty updated successfully"))
}

/// DELETE /delete_faculty/{id} - Delete a faculty record
#[utoipa::path(
    delete,
    path = "/delete_faculty/{id}",
    params(("id" = String, Path, description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty deleted", body = FacultyStatus),
        (status = 404, description = "Unknown faculty")
    )
)]
pub async fn delete_faculty(
    State(state): State<Arc<AppState>>,
    Path(faculty_id): Path<String>,
) -> HttpResult<impl IntoResponse> {
    let existing = state.db.get_faculty(&faculty_id).await?;
    state.db.delete_faculty(&faculty_id).await?;
    if let Some(key) = &existing.profile_pdf {
        discard_profile(&state, key).await;
    }
    info!("Deleted faculty {}", faculty_id);
    Ok(FacultyStatus::success("Faculty deleted successfully"))
}

/// GET /view_profile/{filename} - Show a stored profile PDF inline
#[utoipa::path(
    get,
    path = "/view_profile/{filename}",
    params(("filename" = String, Path, description = "Stored profile file name")),
    responses(
        (status = 200, description = "The profile PDF"),
        (status = 404, description = "File not found")
    )
)]
pub async fn view_profile(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> HttpResult<Response> {
    let data = state.files.get(Bucket::FacultyProfiles, &filename).await?;
    Ok(pdf_response(data, &filename, Disposition::Inline))
}
