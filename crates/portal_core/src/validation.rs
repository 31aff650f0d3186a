//! crates/portal_core/src/validation.rs
//!
//! Input checks shared by the HTTP handlers: required fields, numeric ranges and
//! file names that are safe to use as storage keys.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::{Regulation, Subject};

pub const MIN_SEMESTER: i32 = 1;
pub const MAX_SEMESTER: i32 = 8;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::Missing(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reduces an uploaded file name to a safe single path component.
///
/// Directory parts are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9_.-]` is removed and leading dots are stripped. Returns `None`
/// when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let spaced = WHITESPACE.replace_all(base.trim(), "_");
    let cleaned = UNSAFE_CHARS.replace_all(&spaced, "");
    let cleaned = cleaned.trim_start_matches(['.', '_']).trim_end_matches('.');
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// True when the name ends in `.pdf` (any case).
pub fn is_pdf(name: &str) -> bool {
    name.rsplit_once('.')
        .map_or(false, |(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("pdf"))
}

/// Splits `name.ext` into `("name", ".ext")`.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Parses a semester number in `1..=8`.
pub fn parse_semester(raw: &str) -> Result<i32, ValidationError> {
    let semester: i32 = raw.trim().parse().map_err(|_| ValidationError::Invalid {
        field: "semester",
        reason: format!("'{}' is not a number", raw.trim()),
    })?;
    if !(MIN_SEMESTER..=MAX_SEMESTER).contains(&semester) {
        return Err(ValidationError::Invalid {
            field: "semester",
            reason: format!("must be between {MIN_SEMESTER} and {MAX_SEMESTER}"),
        });
    }
    Ok(semester)
}

/// A regulation as submitted by the dashboard, before validation.
#[derive(Debug, Clone, Default)]
pub struct RegulationDraft {
    pub reg_id: Option<String>,
    pub reg_name: Option<String>,
}

impl RegulationDraft {
    pub fn validate(self) -> Result<Regulation, ValidationError> {
        Ok(Regulation {
            reg_id: required(self.reg_id, "reg_id")?,
            reg_name: required(self.reg_name, "reg_name")?,
        })
    }
}

/// A subject as submitted by the dashboard. Numbers may arrive as JSON numbers or strings.
#[derive(Debug, Clone, Default)]
pub struct SubjectDraft {
    pub subject_id: Option<String>,
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub regulation_id: Option<String>,
    pub semester: Option<String>,
    pub credits: Option<String>,
    pub faculty_assign: Option<String>,
}

impl SubjectDraft {
    pub fn validate(self) -> Result<Subject, ValidationError> {
        let subject_id = required(self.subject_id, "subject_id")?;
        let subject_code = required(self.subject_code, "subject_code")?;
        let subject_name = required(self.subject_name, "subject_name")?;
        let regulation_id = required(self.regulation_id, "regulation_id")?;
        let semester = parse_semester(&required(self.semester, "semester")?)?;

        let credits_raw = required(self.credits, "credits")?;
        let credits: f64 = credits_raw.parse().map_err(|_| ValidationError::Invalid {
            field: "credits",
            reason: format!("'{credits_raw}' is not a number"),
        })?;
        if !credits.is_finite() || credits < 0.0 {
            return Err(ValidationError::Invalid {
                field: "credits",
                reason: "must not be negative".to_string(),
            });
        }

        Ok(Subject {
            subject_id,
            subject_code,
            subject_name,
            regulation_id,
            semester,
            credits,
            faculty_assign: optional(self.faculty_assign),
            reg_name: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SubjectDraft {
        SubjectDraft {
            subject_id: Some("S1".into()),
            subject_code: Some("20CS0501".into()),
            subject_name: Some("Data Structures".into()),
            regulation_id: Some("R20".into()),
            semester: Some("3".into()),
            credits: Some("4".into()),
            faculty_assign: Some("  ".into()),
        }
    }

    #[test]
    fn sanitize_strips_paths_and_unsafe_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd"), Some("passwd".into()));
        assert_eq!(
            sanitize_filename(r"C:\Users\hod\My QB (final).pdf"),
            Some("My_QB_final.pdf".into())
        );
        assert_eq!(sanitize_filename(".hidden.pdf"), Some("hidden.pdf".into()));
        assert_eq!(sanitize_filename("../.."), None);
        assert_eq!(sanitize_filename("  "), None);
    }

    #[test]
    fn pdf_detection_is_case_insensitive() {
        assert!(is_pdf("qb.PDF"));
        assert!(!is_pdf("qb.docx"));
        assert!(!is_pdf("pdf"));
        assert!(!is_pdf(".pdf"));
    }

    #[test]
    fn extension_split() {
        assert_eq!(split_extension("unit_1.pdf"), ("unit_1", ".pdf"));
        assert_eq!(split_extension("noext"), ("noext", ""));
    }

    #[test]
    fn valid_subject_passes() {
        let subject = draft().validate().unwrap();
        assert_eq!(subject.semester, 3);
        assert_eq!(subject.credits, 4.0);
        assert_eq!(subject.faculty_assign, None);
    }

    #[test]
    fn missing_credits_is_reported() {
        let mut d = draft();
        d.credits = None;
        assert_eq!(d.validate(), Err(ValidationError::Missing("credits")));
    }

    #[test]
    fn semester_out_of_range_is_rejected() {
        let mut d = draft();
        d.semester = Some("9".into());
        assert!(matches!(
            d.validate(),
            Err(ValidationError::Invalid { field: "semester", .. })
        ));
        assert!(parse_semester("x").is_err());
    }

    #[test]
    fn negative_credits_are_rejected() {
        let mut d = draft();
        d.credits = Some("-1".into());
        assert!(matches!(
            d.validate(),
            Err(ValidationError::Invalid { field: "credits", .. })
        ));
    }

    #[test]
    fn regulation_requires_both_fields() {
        let d = RegulationDraft {
            reg_id: Some("R23".into()),
            reg_name: None,
        };
        assert_eq!(d.validate(), Err(ValidationError::Missing("reg_name")));
    }
}
