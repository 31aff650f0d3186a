//! crates/portal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the portal's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the database, the file system and the PDF tooling.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    Bucket, Faculty, FacultyCredentials, GeneratedPaper, PaperMeta, PaperSet, RecordCounts,
    Regulation, StoredFile, Subject, SubjectFilter,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (database, disk, PDF libs).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Regulations ---
    async fn list_regulations(&self) -> PortResult<Vec<Regulation>>;

    async fn get_regulation(&self, reg_id: &str) -> PortResult<Regulation>;

    async fn create_regulation(&self, regulation: &Regulation) -> PortResult<()>;

    async fn update_regulation(&self, regulation: &Regulation) -> PortResult<()>;

    async fn delete_regulation(&self, reg_id: &str) -> PortResult<()>;

    async fn count_subjects_for_regulation(&self, reg_id: &str) -> PortResult<i64>;

    // --- Subjects ---
    async fn list_subjects(&self, filter: &SubjectFilter) -> PortResult<Vec<Subject>>;

    async fn create_subject(&self, subject: &Subject) -> PortResult<()>;

    async fn update_subject(&self, subject: &Subject) -> PortResult<()>;

    async fn delete_subject(&self, subject_id: &str) -> PortResult<()>;

    async fn list_semesters(&self, reg_id: &str) -> PortResult<Vec<i32>>;

    // --- Faculty ---
    async fn list_faculty(&self) -> PortResult<Vec<Faculty>>;

    async fn search_faculty(&self, keyword: &str) -> PortResult<Vec<Faculty>>;

    async fn get_faculty(&self, faculty_id: &str) -> PortResult<Faculty>;

    async fn create_faculty(&self, faculty: &Faculty, password_hash: &str) -> PortResult<()>;

    /// Updates the profile; `password_hash` of `None` keeps the stored password.
    async fn update_faculty(
        &self,
        faculty: &Faculty,
        password_hash: Option<&str>,
    ) -> PortResult<()>;

    async fn delete_faculty(&self, faculty_id: &str) -> PortResult<()>;

    async fn get_faculty_credentials(&self, faculty_id: &str) -> PortResult<FacultyCredentials>;

    // --- Papers and Stats ---
    async fn record_generated_paper(&self, paper: &GeneratedPaper) -> PortResult<()>;

    async fn count_records(&self) -> PortResult<RecordCounts>;
}

/// Blob storage for uploaded and generated documents.
///
/// Keys are relative paths inside a bucket (`"<subject>/<file>"` for question banks).
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, bucket: Bucket, key: &str, data: Bytes) -> PortResult<()>;

    async fn get(&self, bucket: Bucket, key: &str) -> PortResult<Bytes>;

    async fn delete(&self, bucket: Bucket, key: &str) -> PortResult<()>;

    /// Lists the files directly inside `dir` of a bucket. A missing directory is empty.
    async fn list(&self, bucket: Bucket, dir: &str) -> PortResult<Vec<StoredFile>>;

    /// Counts files with the given extension anywhere in the bucket.
    async fn count(&self, bucket: Bucket, extension: &str) -> PortResult<usize>;
}

/// Extracts plain text from a PDF document. CPU-bound; call off the async runtime.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, pdf: &[u8]) -> PortResult<String>;
}

/// Renders one paper set to a PDF document. CPU-bound; call off the async runtime.
pub trait PaperRenderer: Send + Sync {
    fn render(&self, set: &PaperSet, meta: &PaperMeta) -> PortResult<Vec<u8>>;
}
