//! services/api/src/web/payload.rs
//!
//! Request and response plumbing shared by the handlers: multipart forms, JSON
//! bodies with `{ "error" }` rejections, message bodies and file downloads.

use crate::error::{HttpError, HttpResult};
use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// A plain `{ "message": ... }` success body.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.into(),
    })
}

/// Unwraps a JSON body, rendering malformed input as an `{ "error" }` body.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> HttpResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| HttpError::new(rejection.status(), rejection.body_text()))
}

/// Accepts a JSON string or number and keeps it as text.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or a number, got {}",
            other
        ))),
    }
}

//=========================================================================================
// Multipart Forms
//=========================================================================================

/// A file part of a multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// A fully buffered multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

fn multipart_err(e: MultipartError) -> HttpError {
    HttpError::new(e.status(), format!("Failed to read multipart data: {}", e.body_text()))
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> HttpResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await.map_err(multipart_err)?;
                    // Browsers send an empty part when no file was picked.
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.insert(name, UploadedFile { file_name, data });
                }
                None => {
                    let value = field.text().await.map_err(multipart_err)?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// The trimmed text of a field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn file_fields(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }
}

//=========================================================================================
// File Responses
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

/// Serves stored bytes with a content type and a `Content-Disposition` header.
pub fn file_response(
    data: Bytes,
    content_type: &'static str,
    file_name: &str,
    disposition: Disposition,
) -> Response {
    let kind = match disposition {
        Disposition::Inline => "inline",
        Disposition::Attachment => "attachment",
    };
    let file_name = file_name.replace('"', "");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{}\"", kind, file_name),
            ),
        ],
        data,
    )
        .into_response()
}

pub fn pdf_response(data: Bytes, file_name: &str, disposition: Disposition) -> Response {
    file_response(data, "application/pdf", file_name, disposition)
}
