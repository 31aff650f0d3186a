//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::NaiveDate;
use portal_core::domain::{
    Faculty, FacultyCredentials, GeneratedPaper, RecordCounts, Regulation, Subject,
    SubjectFilter,
};
use portal_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps driver errors onto port errors, naming the record involved.
fn map_db_err(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", what))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::Conflict(format!("{} is referenced by other records", what))
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn expect_one(rows_affected: u64, what: &str) -> PortResult<()> {
    if rows_affected == 0 {
        return Err(PortError::NotFound(format!("{} not found", what)));
    }
    Ok(())
}

/// Escapes `%` and `_` so a keyword matches literally inside `ILIKE`.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RegulationRecord {
    reg_id: String,
    reg_name: String,
}
impl RegulationRecord {
    fn to_domain(self) -> Regulation {
        Regulation {
            reg_id: self.reg_id,
            reg_name: self.reg_name,
        }
    }
}

#[derive(FromRow)]
struct SubjectRecord {
    subject_id: String,
    subject_code: String,
    subject_name: String,
    regulation_id: String,
    semester: i32,
    credits: f64,
    faculty_assign: Option<String>,
    reg_name: Option<String>,
}
impl SubjectRecord {
    fn to_domain(self) -> Subject {
        Subject {
            subject_id: self.subject_id,
            subject_code: self.subject_code,
            subject_name: self.subject_name,
            regulation_id: self.regulation_id,
            semester: self.semester,
            credits: self.credits,
            faculty_assign: self.faculty_assign,
            reg_name: self.reg_name,
        }
    }
}

#[derive(FromRow)]
struct FacultyRecord {
    faculty_id: String,
    name: String,
    designation: String,
    date_of_joining: Option<NaiveDate>,
    qualification: Option<String>,
    nature_of_association: Option<String>,
    profile_pdf: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    experience: Option<String>,
    research_interests: Option<String>,
}
impl FacultyRecord {
    fn to_domain(self) -> Faculty {
        Faculty {
            faculty_id: self.faculty_id,
            name: self.name,
            designation: self.designation,
            date_of_joining: self.date_of_joining,
            qualification: self.qualification,
            nature_of_association: self.nature_of_association,
            profile_pdf: self.profile_pdf,
            email: self.email,
            phone: self.phone,
            experience: self.experience,
            research_interests: self.research_interests,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    faculty_id: String,
    name: String,
    password_hash: String,
}

#[derive(FromRow)]
struct CountsRecord {
    faculty: i64,
    subjects: i64,
    papers: i64,
}

const SUBJECT_COLUMNS: &str = "s.subject_id, s.subject_code, s.subject_name, s.regulation_id, \
     s.semester, s.credits, s.faculty_assign, r.reg_name";

const FACULTY_COLUMNS: &str = "faculty_id, name, designation, date_of_joining, qualification, \
     nature_of_association, profile_pdf, email, phone, experience, research_interests";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Regulations ---

    async fn list_regulations(&self) -> PortResult<Vec<Regulation>> {
        let records = sqlx::query_as::<_, RegulationRecord>(
            "SELECT reg_id, reg_name FROM regulations ORDER BY reg_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Regulation"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_regulation(&self, reg_id: &str) -> PortResult<Regulation> {
        let record = sqlx::query_as::<_, RegulationRecord>(
            "SELECT reg_id, reg_name FROM regulations WHERE reg_id = $1",
        )
        .bind(reg_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Regulation {}", reg_id)))?;
        Ok(record.to_domain())
    }

    async fn create_regulation(&self, regulation: &Regulation) -> PortResult<()> {
        sqlx::query("INSERT INTO regulations (reg_id, reg_name) VALUES ($1, $2)")
            .bind(&regulation.reg_id)
            .bind(&regulation.reg_name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &format!("Regulation {}", regulation.reg_id)))?;
        Ok(())
    }

    async fn update_regulation(&self, regulation: &Regulation) -> PortResult<()> {
        let what = format!("Regulation {}", regulation.reg_id);
        let result = sqlx::query("UPDATE regulations SET reg_name = $1 WHERE reg_id = $2")
            .bind(&regulation.reg_name)
            .bind(&regulation.reg_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &what))?;
        expect_one(result.rows_affected(), &what)
    }

    async fn delete_regulation(&self, reg_id: &str) -> PortResult<()> {
        let what = format!("Regulation {}", reg_id);
        let result = sqlx::query("DELETE FROM regulations WHERE reg_id = $1")
            .bind(reg_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &what))?;
        expect_one(result.rows_affected(), &what)
    }

    async fn count_subjects_for_regulation(&self, reg_id: &str) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subjects WHERE regulation_id = $1")
            .bind(reg_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "Subject count"))
    }

    // --- Subjects ---

    async fn list_subjects(&self, filter: &SubjectFilter) -> PortResult<Vec<Subject>> {
        let sql = format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects s \
             LEFT JOIN regulations r ON s.regulation_id = r.reg_id \
             WHERE ($1::text IS NULL OR s.regulation_id = $1) \
               AND ($2::int IS NULL OR s.semester = $2) \
               AND ($3::text IS NULL OR s.faculty_assign = $3) \
             ORDER BY s.semester ASC, s.subject_id ASC"
        );
        let records = sqlx::query_as::<_, SubjectRecord>(&sql)
            .bind(filter.regulation.as_deref())
            .bind(filter.semester)
            .bind(filter.faculty.as_deref())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "Subject"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_subject(&self, subject: &Subject) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO subjects \
             (subject_id, subject_code, subject_name, regulation_id, semester, credits, faculty_assign) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&subject.subject_id)
        .bind(&subject.subject_code)
        .bind(&subject.subject_name)
        .bind(&subject.regulation_id)
        .bind(subject.semester)
        .bind(subject.credits)
        .bind(subject.faculty_assign.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Subject {}", subject.subject_id)))?;
        Ok(())
    }

    async fn update_subject(&self, subject: &Subject) -> PortResult<()> {
        let what = format!("Subject {}", subject.subject_id);
        let result = sqlx::query(
            "UPDATE subjects SET subject_code = $1, subject_name = $2, regulation_id = $3, \
             semester = $4, credits = $5, faculty_assign = $6 WHERE subject_id = $7",
        )
        .bind(&subject.subject_code)
        .bind(&subject.subject_name)
        .bind(&subject.regulation_id)
        .bind(subject.semester)
        .bind(subject.credits)
        .bind(subject.faculty_assign.as_deref())
        .bind(&subject.subject_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &what))?;
        expect_one(result.rows_affected(), &what)
    }

    async fn delete_subject(&self, subject_id: &str) -> PortResult<()> {
        let what = format!("Subject {}", subject_id);
        let result = sqlx::query("DELETE FROM subjects WHERE subject_id = $1")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &what))?;
        expect_one(result.rows_affected(), &what)
    }

    async fn list_semesters(&self, reg_id: &str) -> PortResult<Vec<i32>> {
        sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT semester FROM subjects WHERE regulation_id = $1 ORDER BY semester",
        )
        .bind(reg_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Semester"))
    }

    // --- Faculty ---

    async fn list_faculty(&self) -> PortResult<Vec<Faculty>> {
        let sql = format!("SELECT {FACULTY_COLUMNS} FROM faculty ORDER BY name ASC");
        let records = sqlx::query_as::<_, FacultyRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "Faculty"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn search_faculty(&self, keyword: &str) -> PortResult<Vec<Faculty>> {
        let sql = format!(
            "SELECT {FACULTY_COLUMNS} FROM faculty \
             WHERE faculty_id ILIKE $1 OR name ILIKE $1 ORDER BY name ASC"
        );
        let records = sqlx::query_as::<_, FacultyRecord>(&sql)
            .bind(like_pattern(keyword))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "Faculty"))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_faculty(&self, faculty_id: &str) -> PortResult<Faculty> {
        let sql = format!("SELECT {FACULTY_COLUMNS} FROM faculty WHERE faculty_id = $1");
        let record = sqlx::query_as::<_, FacultyRecord>(&sql)
            .bind(faculty_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &format!("Faculty {}", faculty_id)))?;
        Ok(record.to_domain())
    }

    async fn create_faculty(&self, faculty: &Faculty, password_hash: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO faculty \
             (faculty_id, name, designation, date_of_joining, qualification, nature_of_association, \
              profile_pdf, password_hash, email, phone, experience, research_interests) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&faculty.faculty_id)
        .bind(&faculty.name)
        .bind(&faculty.designation)
        .bind(faculty.date_of_joining)
        .bind(faculty.qualification.as_deref())
        .bind(faculty.nature_of_association.as_deref())
        .bind(faculty.profile_pdf.as_deref())
        .bind(password_hash)
        .bind(faculty.email.as_deref())
        .bind(faculty.phone.as_deref())
        .bind(faculty.experience.as_deref())
        .bind(faculty.research_interests.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Faculty {}", faculty.faculty_id)))?;
        Ok(())
    }

    async fn update_faculty(
        &self,
        faculty: &Faculty,
        password_hash: Option<&str>,
    ) -> PortResult<()> {
        let what = format!("Faculty {}", faculty.faculty_id);
        let result = sqlx::query(
            "UPDATE faculty SET name = $1, designation = $2, date_of_joining = $3, \
             qualification = $4, nature_of_association = $5, profile_pdf = $6, \
             password_hash = COALESCE($7, password_hash), email = $8, phone = $9, \
             experience = $10, research_interests = $11 WHERE faculty_id = $12",
        )
        .bind(&faculty.name)
        .bind(&faculty.designation)
        .bind(faculty.date_of_joining)
        .bind(faculty.qualification.as_deref())
        .bind(faculty.nature_of_association.as_deref())
        .bind(faculty.profile_pdf.as_deref())
        .bind(password_hash)
        .bind(faculty.email.as_deref())
        .bind(faculty.phone.as_deref())
        .bind(faculty.experience.as_deref())
        .bind(faculty.research_interests.as_deref())
        .bind(&faculty.faculty_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &what))?;
        expect_one(result.rows_affected(), &what)
    }

    async fn delete_faculty(&self, faculty_id: &str) -> PortResult<()> {
        let what = format!("Faculty {}", faculty_id);
        let result = sqlx::query("DELETE FROM faculty WHERE faculty_id = $1")
            .bind(faculty_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err(e, &what))?;
        expect_one(result.rows_affected(), &what)
    }

    async fn get_faculty_credentials(&self, faculty_id: &str) -> PortResult<FacultyCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT faculty_id, name, password_hash FROM faculty WHERE faculty_id = $1",
        )
        .bind(faculty_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Faculty {}", faculty_id)))?;
        Ok(FacultyCredentials {
            faculty_id: record.faculty_id,
            name: record.name,
            password_hash: record.password_hash,
        })
    }

    // --- Papers and Stats ---

    async fn record_generated_paper(&self, paper: &GeneratedPaper) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO generated_papers (file_name, set_label, subject_code, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&paper.file_name)
        .bind(&paper.set_label)
        .bind(&paper.subject_code)
        .bind(paper.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, &format!("Paper {}", paper.file_name)))?;
        Ok(())
    }

    async fn count_records(&self) -> PortResult<RecordCounts> {
        let record = sqlx::query_as::<_, CountsRecord>(
            "SELECT (SELECT COUNT(*) FROM faculty) AS faculty, \
                    (SELECT COUNT(*) FROM subjects) AS subjects, \
                    (SELECT COUNT(*) FROM generated_papers) AS papers",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "Record counts"))?;
        Ok(RecordCounts {
            faculty: record.faculty,
            subjects: record.subjects,
            papers: record.papers,
        })
    }
}
