//! services/api/src/web/generator.rs
//!
//! The question-paper generator: lookups for the generator screen, question-bank
//! ingest, set generation and retrieval of the rendered papers.

use crate::error::{HttpError, HttpResult};
use crate::web::payload::{
    file_response, json_body, pdf_response, string_or_number, Disposition, FormData,
};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    response::Response,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use futures::future::try_join_all;
use portal_core::domain::{
    Bucket, GeneratedPaper, PaperMeta, ParsedQuestionBank, SubjectFilter,
};
use portal_core::generator::generate_sets;
use portal_core::ingest::{export_csv, parse_question_bank};
use portal_core::ports::PortError;
use portal_core::validation::{parse_semester, sanitize_filename};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const DEFAULT_NUM_SETS: i64 = 4;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct RegulationOption {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegulationOptions {
    pub regulations: Vec<RegulationOption>,
}

#[derive(Serialize, ToSchema)]
pub struct SemesterOptions {
    pub semesters: Vec<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct SubjectOption {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Serialize, ToSchema)]
pub struct SubjectOptions {
    pub subjects: Vec<SubjectOption>,
}

/// Returned after a question bank has been parsed.
#[derive(Serialize, ToSchema)]
pub struct ParsedBankResponse {
    pub parsed_id: String,
    pub csv_id: String,
    /// Questions found per unit number.
    pub units_count: BTreeMap<u32, usize>,
    pub questions_count: usize,
}

/// Printed on the paper as given; numbers and nulls are accepted.
#[derive(Deserialize, Default, ToSchema)]
pub struct PaperMetaPayload {
    #[serde(default, deserialize_with = "string_or_number")]
    pub subject_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub subject_code: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub regulation: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub semester: Option<String>,
}

impl From<PaperMetaPayload> for PaperMeta {
    fn from(p: PaperMetaPayload) -> Self {
        PaperMeta {
            subject_name: p.subject_name.unwrap_or_default(),
            subject_code: p.subject_code.unwrap_or_default(),
            regulation: p.regulation.unwrap_or_default(),
            semester: p.semester.unwrap_or_default(),
        }
    }
}

fn default_num_sets() -> i64 {
    DEFAULT_NUM_SETS
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub parsed_id: Option<String>,
    #[serde(default = "default_num_sets")]
    pub num_sets: i64,
    #[serde(default)]
    pub paper_meta: PaperMetaPayload,
}

#[derive(Serialize, ToSchema)]
pub struct GeneratedSet {
    pub set: String,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    pub sets: Vec<GeneratedSet>,
}

fn parsed_key(parsed_id: &Uuid) -> String {
    format!("{}.json", parsed_id)
}

fn csv_key(parsed_id: &Uuid) -> String {
    format!("{}.csv", parsed_id)
}

//=========================================================================================
// Lookups
//=========================================================================================

/// GET /generator/get_regulations - Regulations for the generator screen
#[utoipa::path(
    get,
    path = "/generator/get_regulations",
    responses((status = 200, description = "Regulations as id/name pairs", body = RegulationOptions))
)]
pub async fn regulation_options(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<RegulationOptions>> {
    let regulations = state
        .db
        .list_regulations()
        .await?
        .into_iter()
        .map(|r| RegulationOption {
            id: r.reg_id,
            name: r.reg_name,
        })
        .collect();
    Ok(Json(RegulationOptions { regulations }))
}

/// GET /generator/get_semesters/{reg_id} - Semesters that have subjects
#[utoipa::path(
    get,
    path = "/generator/get_semesters/{reg_id}",
    params(("reg_id" = String, Path, description = "Regulation ID")),
    responses((status = 200, description = "Distinct semesters, ascending", body = SemesterOptions))
)]
pub async fn semester_options(
    State(state): State<Arc<AppState>>,
    Path(reg_id): Path<String>,
) -> HttpResult<Json<SemesterOptions>> {
    let semesters = state.db.list_semesters(&reg_id).await?;
    Ok(Json(SemesterOptions { semesters }))
}

/// GET /generator/get_subjects/{reg_id}/{semester} - Subjects by name
#[utoipa::path(
    get,
    path = "/generator/get_subjects/{reg_id}/{semester}",
    params(
        ("reg_id" = String, Path, description = "Regulation ID"),
        ("semester" = i32, Path, description = "Semester 1-8")
    ),
    responses(
        (status = 200, description = "Subjects ordered by name", body = SubjectOptions),
        (status = 400, description = "Invalid semester")
    )
)]
pub async fn subject_options(
    State(state): State<Arc<AppState>>,
    Path((reg_id, semester)): Path<(String, String)>,
) -> HttpResult<Json<SubjectOptions>> {
    let filter = SubjectFilter {
        regulation: Some(reg_id),
        semester: Some(parse_semester(&semester)?),
        faculty: None,
    };
    let mut found = state.db.list_subjects(&filter).await?;
    found.sort_by(|a, b| a.subject_name.cmp(&b.subject_name));

    let subjects = found
        .into_iter()
        .map(|s| SubjectOption {
            id: s.subject_id,
            name: s.subject_name,
            code: s.subject_code,
        })
        .collect();
    Ok(Json(SubjectOptions { subjects }))
}

//=========================================================================================
// Ingest and Generation
//=========================================================================================

/// POST /generator/upload_question_bank - Parse a question-bank PDF
///
/// Accepts a multipart/form-data request with the PDF in the `file` part. The
/// parsed bank is kept server-side and referenced by the returned `parsed_id`.
#[utoipa::path(
    post,
    path = "/generator/upload_question_bank",
    request_body(content_type = "multipart/form-data", description = "The question-bank PDF under the key 'file'."),
    responses(
        (status = 200, description = "Question bank parsed", body = ParsedBankResponse),
        (status = 400, description = "File missing or unreadable as PDF"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_question_bank(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> HttpResult<Json<ParsedBankResponse>> {
    let mut form = FormData::read(multipart).await?;
    let file = form.take_file("file").ok_or_else(|| {
        HttpError::bad_request(format!(
            "file missing in request (expected key 'file', got {:?})",
            form.file_fields()
        ))
    })?;
    let source_filename =
        sanitize_filename(&file.file_name).unwrap_or_else(|| "question_bank.pdf".to_string());

    let extractor = state.extractor.clone();
    let data = file.data;
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&data))
        .await
        .map_err(|e| HttpError::internal("PDF extraction task failed", e))??;

    let parsed_id = Uuid::new_v4();
    let bank = parse_question_bank(&state.parser, parsed_id.to_string(), source_filename, &text);
    if bank.questions_count() == 0 {
        warn!(
            "No questions found in {} ({} characters of text)",
            bank.source_filename,
            text.len()
        );
    }

    let json = serde_json::to_vec(&bank)
        .map_err(|e| HttpError::internal("Failed to serialize parsed bank", e))?;
    let csv = export_csv(&bank).map_err(|e| HttpError::internal("Failed to export CSV", e))?;
    state
        .files
        .put(Bucket::ParsedBanks, &parsed_key(&parsed_id), Bytes::from(json))
        .await?;
    state
        .files
        .put(Bucket::ParsedBanks, &csv_key(&parsed_id), Bytes::from(csv))
        .await?;

    info!(
        "Parsed {} into {} questions across {} units",
        bank.source_filename,
        bank.questions_count(),
        bank.units.len()
    );
    Ok(Json(ParsedBankResponse {
        parsed_id: bank.parsed_id.clone(),
        csv_id: csv_key(&parsed_id),
        units_count: bank.units_count(),
        questions_count: bank.questions_count(),
    }))
}

async fn load_bank(state: &AppState, parsed_id: Option<&str>) -> HttpResult<ParsedQuestionBank> {
    let raw = parsed_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| HttpError::bad_request("missing parsed_id"))?;
    let id = Uuid::parse_str(raw)
        .map_err(|_| HttpError::bad_request(format!("invalid parsed_id '{}'", raw)))?;

    let data = match state.files.get(Bucket::ParsedBanks, &parsed_key(&id)).await {
        Ok(data) => data,
        Err(PortError::NotFound(_)) => {
            return Err(HttpError::not_found(format!(
                "parsed question bank {} not found",
                id
            )))
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&data).map_err(|e| HttpError::internal("Corrupt parsed question bank", e))
}

/// POST /generator/generate_sets - Generate and render distinct paper sets
#[utoipa::path(
    post,
    path = "/generator/generate_sets",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Rendered sets with download URLs", body = GenerateResponse),
        (status = 400, description = "Missing parsed_id or bad set count"),
        (status = 404, description = "Unknown parsed_id"),
        (status = 422, description = "The bank cannot supply that many distinct sets"),
        (status = 500, description = "Rendering or storage failed")
    )
)]
pub async fn generate_sets_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> HttpResult<Json<GenerateResponse>> {
    let req = json_body(body)?;
    let bank = load_bank(&state, req.parsed_id.as_deref()).await?;
    let meta = PaperMeta::from(req.paper_meta);

    // Negative counts fall through to the generator's range check.
    let num_sets = usize::try_from(req.num_sets).unwrap_or(0);
    let created_at = Utc::now();
    let timestamp = created_at.timestamp_millis();
    let sets = generate_sets(&bank.units, num_sets, timestamp.unsigned_abs())?;
    // Keeps file names unique across requests landing in the same millisecond.
    let batch = Uuid::new_v4().simple().to_string();

    let renders = sets.into_iter().map(|set| {
        let renderer = state.renderer.clone();
        let meta = meta.clone();
        let file_name = format!("Set_{}_{}_{}.pdf", set.letter, timestamp, batch);
        async move {
            let label = set.label();
            let pdf = tokio::task::spawn_blocking(move || renderer.render(&set, &meta))
                .await
                .map_err(|e| HttpError::internal("Paper rendering task failed", e))??;
            Ok::<_, HttpError>((label, file_name, pdf))
        }
    });
    let rendered = try_join_all(renders).await?;

    let mut generated = Vec::with_capacity(rendered.len());
    for (label, file_name, pdf) in rendered {
        state
            .files
            .put(Bucket::Papers, &file_name, Bytes::from(pdf))
            .await?;
        let paper = GeneratedPaper {
            file_name: file_name.clone(),
            set_label: label.clone(),
            subject_code: meta.subject_code.clone(),
            created_at,
        };
        if let Err(e) = state.db.record_generated_paper(&paper).await {
            if let Err(cleanup) = state.files.delete(Bucket::Papers, &file_name).await {
                warn!("Could not remove unrecorded paper {}: {}", file_name, cleanup);
            }
            return Err(e.into());
        }
        generated.push(GeneratedSet {
            set: label,
            url: format!("/generator/download/{}", file_name),
        });
    }

    info!(
        "Generated {} sets from {} for {}",
        generated.len(),
        bank.parsed_id,
        if meta.subject_code.is_empty() { "unnamed subject" } else { meta.subject_code.as_str() }
    );
    Ok(Json(GenerateResponse { sets: generated }))
}

//=========================================================================================
// Retrieval
//=========================================================================================

/// GET /generator/download/{file} - Download a rendered set
#[utoipa::path(
    get,
    path = "/generator/download/{file}",
    params(("file" = String, Path, description = "Rendered file name")),
    responses(
        (status = 200, description = "The PDF as an attachment"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_paper(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> HttpResult<Response> {
    let data = state.files.get(Bucket::Papers, &file).await?;
    Ok(pdf_response(data, &file, Disposition::Attachment))
}

/// GET /generator/view/{file} - View a rendered set inline
#[utoipa::path(
    get,
    path = "/generator/view/{file}",
    params(("file" = String, Path, description = "Rendered file name")),
    responses(
        (status = 200, description = "The PDF inline"),
        (status = 404, description = "File not found")
    )
)]
pub async fn view_paper(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> HttpResult<Response> {
    let data = state.files.get(Bucket::Papers, &file).await?;
    Ok(pdf_response(data, &file, Disposition::Inline))
}

/// GET /generator/download_csv/{csv_id} - Download the extracted questions as CSV
#[utoipa::path(
    get,
    path = "/generator/download_csv/{csv_id}",
    params(("csv_id" = String, Path, description = "csv_id returned by the upload")),
    responses(
        (status = 200, description = "The questions as CSV"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_csv(
    State(state): State<Arc<AppState>>,
    Path(csv_id): Path<String>,
) -> HttpResult<Response> {
    if !csv_id.ends_with(".csv") {
        return Err(HttpError::not_found(format!("File {} not found", csv_id)));
    }
    let data = state.files.get(Bucket::ParsedBanks, &csv_id).await?;
    Ok(file_response(
        data,
        "text/csv; charset=utf-8",
        &format!("questions_{}", csv_id),
        Disposition::Attachment,
    ))
}
