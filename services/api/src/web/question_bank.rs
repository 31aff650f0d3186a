//! services/api/src/web/question_bank.rs
//!
//! Handlers for the per-subject question-bank PDF store.

use crate::error::{HttpError, HttpResult};
use crate::web::payload::{message, pdf_response, Disposition, FormData, MessageResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    Json,
};
use chrono::Utc;
use portal_core::domain::{Bucket, QuestionBankFile};
use portal_core::validation::{is_pdf, sanitize_filename, split_extension};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Serialize, ToSchema)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Deserialize)]
pub struct QbFileQuery {
    pub subject_id: Option<String>,
    pub filename: Option<String>,
}

impl QbFileQuery {
    /// The storage key `<subject>/<file>`, or 400 when either part is missing.
    fn key(self) -> HttpResult<String> {
        let subject_dir = self.subject_id.as_deref().and_then(sanitize_filename);
        let filename = self.filename.map(|f| f.trim().to_string());
        match (subject_dir, filename) {
            (Some(s), Some(f)) if !f.is_empty() => Ok(format!("{}/{}", s, f)),
            _ => Err(HttpError::bad_request("subject_id and filename required")),
        }
    }
}

/// `name.pdf` becomes `name_<unix seconds>.pdf`.
fn timestamped(name: &str, unix_seconds: i64) -> String {
    let (stem, ext) = split_extension(name);
    format!("{}_{}{}", stem, unix_seconds, ext)
}

/// POST /upload_qb - Store a question-bank PDF for a subject (multipart)
#[utoipa::path(
    post,
    path = "/upload_qb",
    request_body(content_type = "multipart/form-data", description = "subject_id and a PDF file."),
    responses(
        (status = 200, description = "Uploaded", body = UploadResponse),
        (status = 400, description = "Missing subject, missing file or not a PDF")
    )
)]
pub async fn upload_qb(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> HttpResult<Json<UploadResponse>> {
    let mut form = FormData::read(multipart).await?;
    let subject_id = form
        .text("subject_id")
        .ok_or_else(|| HttpError::bad_request("subject_id is required"))?;
    let subject_dir = sanitize_filename(&subject_id)
        .ok_or_else(|| HttpError::bad_request("Invalid subject_id"))?;
    let file = form
        .take_file("file")
        .ok_or_else(|| HttpError::bad_request("No file uploaded"))?;
    let safe_name =
        sanitize_filename(&file.file_name).ok_or_else(|| HttpError::bad_request("Invalid filename"))?;
    if !is_pdf(&safe_name) {
        return Err(HttpError::bad_request("Only PDF files are allowed"));
    }

    let save_name = timestamped(&safe_name, Utc::now().timestamp());
    let key = format!("{}/{}", subject_dir, save_name);
    state.files.put(Bucket::QuestionBanks, &key, file.data).await?;

    info!("Stored question bank {}", key);
    Ok(Json(UploadResponse {
        message: "Uploaded successfully".to_string(),
        filename: save_name,
    }))
}

/// GET /list_qb/{subject_id} - List a subject's question banks, newest first
#[utoipa::path(
    get,
    path = "/list_qb/{subject_id}",
    params(("subject_id" = String, Path, description = "Subject ID")),
    responses((status = 200, description = "Stored PDFs, newest first"))
)]
pub async fn list_qb(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
) -> HttpResult<Json<Vec<QuestionBankFile>>> {
    let Some(subject_dir) = sanitize_filename(&subject_id) else {
        return Ok(Json(Vec::new()));
    };
    let mut stored = state.files.list(Bucket::QuestionBanks, &subject_dir).await?;
    stored.retain(|f| is_pdf(&f.name));
    stored.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));

    let files = stored
        .into_iter()
        .map(|f| QuestionBankFile {
            subject_id: subject_id.clone(),
            filename: f.name,
            size: f.size,
            uploaded_at: f.modified,
        })
        .collect();
    Ok(Json(files))
}

/// GET /download_qb?subject_id=&filename= - Show a stored question bank inline
#[utoipa::path(
    get,
    path = "/download_qb",
    params(
        ("subject_id" = String, Query, description = "Subject ID"),
        ("filename" = String, Query, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "The PDF"),
        (status = 400, description = "subject_id and filename required"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_qb(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QbFileQuery>,
) -> HttpResult<Response> {
    let key = query.key()?;
    let data = state.files.get(Bucket::QuestionBanks, &key).await?;
    let name = key.rsplit('/').next().unwrap_or(&key);
    Ok(pdf_response(data, name, Disposition::Inline))
}

/// DELETE /delete_qb?subject_id=&filename= - Delete a stored question bank
#[utoipa::path(
    delete,
    path = "/delete_qb",
    params(
        ("subject_id" = String, Query, description = "Subject ID"),
        ("filename" = String, Query, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "subject_id and filename required"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_qb(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QbFileQuery>,
) -> HttpResult<Json<MessageResponse>> {
    let key = query.key()?;
    state.files.delete(Bucket::QuestionBanks, &key).await?;
    info!("Deleted question bank {}", key);
    Ok(message("Deleted successfully"))
}

/// GET /get_qb_count - Count every stored question-bank PDF
#[utoipa::path(
    get,
    path = "/get_qb_count",
    responses((status = 200, description = "Number of stored PDFs", body = CountResponse))
)]
pub async fn get_qb_count(State(state): State<Arc<AppState>>) -> HttpResult<Json<CountResponse>> {
    let count = state.files.count(Bucket::QuestionBanks, "pdf").await?;
    Ok(Json(CountResponse { count }))
}
