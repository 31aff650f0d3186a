//! In-memory ports and request helpers for driving the router in tests.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use portal_core::domain::{
    Bucket, Faculty, FacultyCredentials, GeneratedPaper, PaperMeta, PaperSet, RecordCounts,
    Regulation, StoredFile, Subject, SubjectFilter,
};
use portal_core::ports::{
    DatabaseService, FileStore, PaperRenderer, PortError, PortResult, TextExtractor,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const BOUNDARY: &str = "portal-test-boundary";

//=========================================================================================
// In-memory Database
//=========================================================================================

#[derive(Default)]
struct Tables {
    regulations: BTreeMap<String, Regulation>,
    subjects: BTreeMap<String, Subject>,
    faculty: BTreeMap<String, (Faculty, String)>,
    papers: Vec<GeneratedPaper>,
}

#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    failing_papers: AtomicBool,
}

impl MemoryDb {
    pub fn papers(&self) -> Vec<GeneratedPaper> {
        self.tables.lock().unwrap().papers.clone()
    }

    /// Makes every following `record_generated_paper` fail like a broken connection.
    pub fn fail_paper_records(&self) {
        self.failing_papers.store(true, Ordering::SeqCst);
    }
}

fn not_found(what: &str, id: &str) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

fn by_name(list: &mut [Faculty]) {
    list.sort_by(|a, b| a.name.cmp(&b.name));
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn list_regulations(&self) -> PortResult<Vec<Regulation>> {
        Ok(self.tables.lock().unwrap().regulations.values().cloned().collect())
    }

    async fn get_regulation(&self, reg_id: &str) -> PortResult<Regulation> {
        let t = self.tables.lock().unwrap();
        t.regulations
            .get(reg_id)
            .cloned()
            .ok_or_else(|| not_found("Regulation", reg_id))
    }

    async fn create_regulation(&self, regulation: &Regulation) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.regulations.contains_key(&regulation.reg_id) {
            return Err(PortError::Conflict(format!(
                "Regulation {} already exists",
                regulation.reg_id
            )));
        }
        t.regulations
            .insert(regulation.reg_id.clone(), regulation.clone());
        Ok(())
    }

    async fn update_regulation(&self, regulation: &Regulation) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        match t.regulations.get_mut(&regulation.reg_id) {
            Some(existing) => {
                *existing = regulation.clone();
                Ok(())
            }
            None => Err(not_found("Regulation", &regulation.reg_id)),
        }
    }

    async fn delete_regulation(&self, reg_id: &str) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.subjects.values().any(|s| s.regulation_id == reg_id) {
            return Err(PortError::Conflict(format!(
                "Regulation {} is referenced by other records",
                reg_id
            )));
        }
        t.regulations
            .remove(reg_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Regulation", reg_id))
    }

    async fn count_subjects_for_regulation(&self, reg_id: &str) -> PortResult<i64> {
        let t = self.tables.lock().unwrap();
        Ok(t.subjects
            .values()
            .filter(|s| s.regulation_id == reg_id)
            .count() as i64)
    }

    async fn list_subjects(&self, filter: &SubjectFilter) -> PortResult<Vec<Subject>> {
        let t = self.tables.lock().unwrap();
        let mut found: Vec<Subject> = t
            .subjects
            .values()
            .filter(|s| filter.matches(s))
            .map(|s| Subject {
                reg_name: t.regulations.get(&s.regulation_id).map(|r| r.reg_name.clone()),
                ..s.clone()
            })
            .collect();
        found.sort_by(|a, b| {
            a.semester
                .cmp(&b.semester)
                .then_with(|| a.subject_id.cmp(&b.subject_id))
        });
        Ok(found)
    }

    async fn create_subject(&self, subject: &Subject) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.subjects.contains_key(&subject.subject_id) {
            return Err(PortError::Conflict(format!(
                "Subject {} already exists",
                subject.subject_id
            )));
        }
        t.subjects.insert(subject.subject_id.clone(), subject.clone());
        Ok(())
    }

    async fn update_subject(&self, subject: &Subject) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        match t.subjects.get_mut(&subject.subject_id) {
            Some(existing) => {
                *existing = subject.clone();
                Ok(())
            }
            None => Err(not_found("Subject", &subject.subject_id)),
        }
    }

    async fn delete_subject(&self, subject_id: &str) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        t.subjects
            .remove(subject_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Subject", subject_id))
    }

    async fn list_semesters(&self, reg_id: &str) -> PortResult<Vec<i32>> {
        let t = self.tables.lock().unwrap();
        let mut semesters: Vec<i32> = t
            .subjects
            .values()
            .filter(|s| s.regulation_id == reg_id)
            .map(|s| s.semester)
            .collect();
        semesters.sort_unstable();
        semesters.dedup();
        Ok(semesters)
    }

    async fn list_faculty(&self) -> PortResult<Vec<Faculty>> {
        let t = self.tables.lock().unwrap();
        let mut all: Vec<Faculty> = t.faculty.values().map(|(f, _)| f.clone()).collect();
        by_name(&mut all);
        Ok(all)
    }

    async fn search_faculty(&self, keyword: &str) -> PortResult<Vec<Faculty>> {
        let needle = keyword.to_lowercase();
        let t = self.tables.lock().unwrap();
        let mut found: Vec<Faculty> = t
            .faculty
            .values()
            .map(|(f, _)| f)
            .filter(|f| {
                f.faculty_id.to_lowercase().contains(&needle)
                    || f.name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        by_name(&mut found);
        Ok(found)
    }

    async fn get_faculty(&self, faculty_id: &str) -> PortResult<Faculty> {
        let t = self.tables.lock().unwrap();
        t.faculty
            .get(faculty_id)
            .map(|(f, _)| f.clone())
            .ok_or_else(|| not_found("Faculty", faculty_id))
    }

    async fn create_faculty(&self, faculty: &Faculty, password_hash: &str) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.faculty.contains_key(&faculty.faculty_id) {
            return Err(PortError::Conflict(format!(
                "Faculty {} already exists",
                faculty.faculty_id
            )));
        }
        t.faculty.insert(
            faculty.faculty_id.clone(),
            (faculty.clone(), password_hash.to_string()),
        );
        Ok(())
    }

    async fn update_faculty(
        &self,
        faculty: &Faculty,
        password_hash: Option<&str>,
    ) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        match t.faculty.get_mut(&faculty.faculty_id) {
            Some((existing, hash)) => {
                *existing = faculty.clone();
                if let Some(new_hash) = password_hash {
                    *hash = new_hash.to_string();
                }
                Ok(())
            }
            None => Err(not_found("Faculty", &faculty.faculty_id)),
        }
    }

    async fn delete_faculty(&self, faculty_id: &str) -> PortResult<()> {
        let mut t = self.tables.lock().unwrap();
        t.faculty
            .remove(faculty_id)
            .ok_or_else(|| not_found("Faculty", faculty_id))?;
        for subject in t.subjects.values_mut() {
            if subject.faculty_assign.as_deref() == Some(faculty_id) {
                subject.faculty_assign = None;
            }
        }
        Ok(())
    }

    async fn get_faculty_credentials(&self, faculty_id: &str) -> PortResult<FacultyCredentials> {
        let t = self.tables.lock().unwrap();
        t.faculty
            .get(faculty_id)
            .map(|(f, hash)| FacultyCredentials {
                faculty_id: f.faculty_id.clone(),
                name: f.name.clone(),
                password_hash: hash.clone(),
            })
            .ok_or_else(|| not_found("Faculty", faculty_id))
    }

    async fn record_generated_paper(&self, paper: &GeneratedPaper) -> PortResult<()> {
        if self.failing_papers.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("connection reset".to_string()));
        }
        let mut t = self.tables.lock().unwrap();
        if t.papers.iter().any(|p| p.file_name == paper.file_name) {
            return Err(PortError::Conflict(format!(
                "Paper {} already exists",
                paper.file_name
            )));
        }
        t.papers.push(paper.clone());
        Ok(())
    }

    async fn count_records(&self) -> PortResult<RecordCounts> {
        let t = self.tables.lock().unwrap();
        Ok(RecordCounts {
            faculty: t.faculty.len() as i64,
            subjects: t.subjects.len() as i64,
            papers: t.papers.len() as i64,
        })
    }
}

//=========================================================================================
// In-memory File Store
//=========================================================================================

#[derive(Default)]
struct Blobs {
    files: HashMap<(Bucket, String), (Bytes, DateTime<Utc>)>,
    writes: i64,
}

/// Each write is stamped one second after the previous one so ordering is stable.
#[derive(Default)]
pub struct MemoryFiles {
    blobs: Mutex<Blobs>,
}

impl MemoryFiles {
    pub fn keys(&self, bucket: Bucket) -> Vec<String> {
        let blobs = self.blobs.lock().unwrap();
        let mut keys: Vec<String> = blobs
            .files
            .keys()
            .filter(|(b, _)| *b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

fn check_key(key: &str) -> PortResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|c| c == ".." || c.is_empty()) {
        return Err(PortError::Invalid(format!("invalid storage key '{}'", key)));
    }
    Ok(())
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn put(&self, bucket: Bucket, key: &str, data: Bytes) -> PortResult<()> {
        check_key(key)?;
        let mut blobs = self.blobs.lock().unwrap();
        blobs.writes += 1;
        let stamp = Utc
            .timestamp_opt(1_700_000_000 + blobs.writes, 0)
            .unwrap();
        blobs.files.insert((bucket, key.to_string()), (data, stamp));
        Ok(())
    }

    async fn get(&self, bucket: Bucket, key: &str) -> PortResult<Bytes> {
        check_key(key)?;
        let blobs = self.blobs.lock().unwrap();
        blobs
            .files
            .get(&(bucket, key.to_string()))
            .map(|(data, _)| data.clone())
            .ok_or_else(|| PortError::NotFound(format!("File {} not found", key)))
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> PortResult<()> {
        check_key(key)?;
        let mut blobs = self.blobs.lock().unwrap();
        blobs
            .files
            .remove(&(bucket, key.to_string()))
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("File {} not found", key)))
    }

    async fn list(&self, bucket: Bucket, dir: &str) -> PortResult<Vec<StoredFile>> {
        check_key(dir)?;
        let prefix = format!("{}/", dir);
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs
            .files
            .iter()
            .filter(|((b, k), _)| *b == bucket && k.starts_with(&prefix))
            .filter_map(|((_, k), (data, stamp))| {
                let name = &k[prefix.len()..];
                (!name.contains('/')).then(|| StoredFile {
                    name: name.to_string(),
                    size: data.len() as u64,
                    modified: *stamp,
                })
            })
            .collect())
    }

    async fn count(&self, bucket: Bucket, extension: &str) -> PortResult<usize> {
        let suffix = format!(".{}", extension.to_lowercase());
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs
            .files
            .keys()
            .filter(|(b, k)| *b == bucket && k.to_lowercase().ends_with(&suffix))
            .count())
    }
}

//=========================================================================================
// PDF Stubs
//=========================================================================================

/// Treats the uploaded bytes as the document's text.
pub struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract_text(&self, pdf: &[u8]) -> PortResult<String> {
        String::from_utf8(pdf.to_vec())
            .map_err(|_| PortError::Invalid("pdf read failed: not text".to_string()))
    }
}

/// Produces a tiny document naming the set and the questions it contains.
pub struct ListingRenderer;

impl PaperRenderer for ListingRenderer {
    fn render(&self, set: &PaperSet, meta: &PaperMeta) -> PortResult<Vec<u8>> {
        let mut out = format!("%PDF-1.4\n{} {}\n", set.label(), meta.subject_code);
        for section in &set.sections {
            out.push_str(&format!("UNIT-{} {}\n", section.unit, section.primary.text));
            if let Some(alt) = &section.alternative {
                out.push_str(&format!("OR {}\n", alt.text));
            }
        }
        Ok(out.into_bytes())
    }
}

//=========================================================================================
// App and Request Helpers
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub db: Arc<MemoryDb>,
    pub files: Arc<MemoryFiles>,
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        log_level: tracing::Level::INFO,
        storage_dir: "./unused-storage".into(),
        fonts_dir: "./unused-fonts".into(),
        font_family: "LiberationSans".to_string(),
        institution_name: "SIDDHARTH INSTITUTE OF ENGINEERING & TECHNOLOGY".to_string(),
        exam_title: "Regular Examinations".to_string(),
        cors_origin: None,
        max_upload_bytes: 1024 * 1024,
    }
}

pub fn test_app() -> TestApp {
    let db = Arc::new(MemoryDb::default());
    let files = Arc::new(MemoryFiles::default());
    let state = Arc::new(AppState::new(
        Arc::new(test_config()),
        db.clone(),
        files.clone(),
        Arc::new(Utf8Extractor),
        Arc::new(ListingRenderer),
    ));
    TestApp {
        router: router(state),
        db,
        files,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn header(&self, name: header::HeaderName) -> String {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default()
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(&self, method: Method, uri: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn multipart(&self, uri: &str, form: Multipart) -> TestResponse {
        let request = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(request).await
    }
}

/// A hand-built multipart/form-data body.
#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
