//! services/api/src/web/rest.rs
//!
//! The master definition of the OpenAPI document served next to Swagger UI.

use crate::web::{
    auth, dashboard, faculty, generator, payload::MessageResponse, question_bank, regulations,
    subjects,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        faculty::add_faculty,
        faculty::list_faculty,
        faculty::search_faculty,
        faculty::update_faculty,
        faculty::delete_faculty,
        faculty::view_profile,
        auth::login_handler,
        regulations::add_regulation,
        regulations::update_regulation,
        regulations::delete_regulation,
        regulations::list_regulations,
        subjects::add_subject,
        subjects::update_subject,
        subjects::delete_subject,
        subjects::list_subjects,
        subjects::list_subjects_by_semester,
        question_bank::upload_qb,
        question_bank::list_qb,
        question_bank::download_qb,
        question_bank::delete_qb,
        question_bank::get_qb_count,
        dashboard::get_hod_stats,
        generator::regulation_options,
        generator::semester_options,
        generator::subject_options,
        generator::upload_question_bank,
        generator::generate_sets_handler,
        generator::download_paper,
        generator::view_paper,
        generator::download_csv,
    ),
    components(
        schemas(
            MessageResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LoginUser,
            faculty::FacultyStatus,
            regulations::RegulationPayload,
            subjects::SubjectPayload,
            question_bank::UploadResponse,
            question_bank::CountResponse,
            generator::RegulationOptions,
            generator::RegulationOption,
            generator::SemesterOptions,
            generator::SubjectOptions,
            generator::SubjectOption,
            generator::ParsedBankResponse,
            generator::GenerateRequest,
            generator::PaperMetaPayload,
            generator::GenerateResponse,
            generator::GeneratedSet,
        )
    ),
    tags(
        (name = "Department Portal API", description = "Faculty, regulation, subject and question-bank records, plus the question-paper generator.")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_generator_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/generator/generate_sets"));
        assert!(doc.paths.paths.contains_key("/delete_regulation/{id}"));
    }
}
