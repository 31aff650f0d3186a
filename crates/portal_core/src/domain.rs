//! crates/portal_core/src/domain.rs
//!
//! Defines the core data structures of the department portal.
//! These are shared by the ingest/generation logic, the ports and the web layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

//=========================================================================================
// Department Records
//=========================================================================================

/// A versioned curriculum definition under which subjects are grouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regulation {
    pub reg_id: String,
    pub reg_name: String,
}

/// A subject taught under one regulation in one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String,
    pub subject_code: String,
    pub subject_name: String,
    pub regulation_id: String,
    pub semester: i32,
    pub credits: f64,
    pub faculty_assign: Option<String>,
    /// Joined from the regulation when listing; ignored on writes.
    #[serde(default)]
    pub reg_name: Option<String>,
}

/// Optional filters applied when listing subjects.
#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    pub regulation: Option<String>,
    pub semester: Option<i32>,
    pub faculty: Option<String>,
}

impl SubjectFilter {
    pub fn matches(&self, subject: &Subject) -> bool {
        self.regulation
            .as_ref()
            .map_or(true, |r| &subject.regulation_id == r)
            && self.semester.map_or(true, |s| subject.semester == s)
            && self
                .faculty
                .as_ref()
                .map_or(true, |f| subject.faculty_assign.as_ref() == Some(f))
    }
}

/// A faculty member's public profile. The password never lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    pub faculty_id: String,
    pub name: String,
    pub designation: String,
    pub date_of_joining: Option<NaiveDate>,
    pub qualification: Option<String>,
    pub nature_of_association: Option<String>,
    pub profile_pdf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience: Option<String>,
    pub research_interests: Option<String>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct FacultyCredentials {
    pub faculty_id: String,
    pub name: String,
    pub password_hash: String,
}

/// Row counts backing the HOD dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub faculty: i64,
    pub subjects: i64,
    pub papers: i64,
}

/// Statistics shown on the HOD dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentStats {
    pub faculty: i64,
    pub subjects: i64,
    pub papers: i64,
    pub questionbanks: i64,
}

//=========================================================================================
// Stored Files
//=========================================================================================

/// The logical areas of the file store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    QuestionBanks,
    ParsedBanks,
    Papers,
    FacultyProfiles,
}

impl Bucket {
    pub fn dir_name(self) -> &'static str {
        match self {
            Bucket::QuestionBanks => "question_banks",
            Bucket::ParsedBanks => "parsed",
            Bucket::Papers => "papers",
            Bucket::FacultyProfiles => "faculty_profiles",
        }
    }
}

/// A file listed from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// A question-bank PDF stored for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBankFile {
    pub subject_id: String,
    pub filename: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

//=========================================================================================
// Question Banks and Papers
//=========================================================================================

/// Tags printed next to a question in the source bank, e.g. `[L2][CO1][12M]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub level: Option<u32>,
    pub course_outcome: Option<u32>,
    pub marks: Option<u32>,
}

impl QuestionMeta {
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.course_outcome.is_none() && self.marks.is_none()
    }
}

/// A single question extracted from a question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub unit: u32,
    pub number: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub meta: QuestionMeta,
}

/// Questions grouped by unit number, in ascending unit order.
pub type UnitPools = BTreeMap<u32, Vec<Question>>;

/// The server-owned result of ingesting a question-bank document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestionBank {
    pub parsed_id: String,
    pub source_filename: String,
    pub units: UnitPools,
}

impl ParsedQuestionBank {
    pub fn questions_count(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    pub fn units_count(&self) -> BTreeMap<u32, usize> {
        self.units.iter().map(|(u, qs)| (*u, qs.len())).collect()
    }
}

/// Descriptive fields printed on every generated paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMeta {
    pub subject_name: String,
    pub subject_code: String,
    pub regulation: String,
    pub semester: String,
}

/// One unit block of a paper: a question and, when the pool allows, an "OR" alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperSection {
    pub unit: u32,
    pub primary: Question,
    pub alternative: Option<Question>,
}

/// One variant of a generated question paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperSet {
    pub letter: char,
    pub sections: Vec<PaperSection>,
}

impl PaperSet {
    pub fn label(&self) -> String {
        format!("Set {}", self.letter)
    }
}

/// A rendered set that has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPaper {
    pub file_name: String,
    pub set_label: String,
    pub subject_code: String,
    pub created_at: DateTime<Utc>,
}
