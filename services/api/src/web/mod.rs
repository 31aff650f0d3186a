pub mod auth;
pub mod dashboard;
pub mod faculty;
pub mod generator;
pub mod payload;
pub mod question_bank;
pub mod regulations;
pub mod rest;
pub mod state;
pub mod subjects;

use crate::web::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

/// CORS for the dashboards: one origin when configured, otherwise any.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]),
        Err(_) => {
            warn!("Ignoring unparsable CORS_ORIGIN '{}'", origin);
            CorsLayer::permissive()
        }
    }
}

fn generator_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get_regulations", get(generator::regulation_options))
        .route("/get_semesters/{reg_id}", get(generator::semester_options))
        .route(
            "/get_subjects/{reg_id}/{semester}",
            get(generator::subject_options),
        )
        .route(
            "/upload_question_bank",
            post(generator::upload_question_bank),
        )
        .route("/generate_sets", post(generator::generate_sets_handler))
        .route("/download/{file}", get(generator::download_paper))
        .route("/view/{file}", get(generator::view_paper))
        .route("/download_csv/{csv_id}", get(generator::download_csv))
}

/// Builds the complete API router with its middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        // Faculty
        .route("/add_faculty", post(faculty::add_faculty))
        .route("/get_faculty", get(faculty::list_faculty))
        .route("/search_faculty", get(faculty::search_faculty))
        .route("/update_faculty/{id}", post(faculty::update_faculty))
        .route("/delete_faculty/{id}", delete(faculty::delete_faculty))
        .route("/view_profile/{filename}", get(faculty::view_profile))
        .route("/login", post(auth::login_handler))
        // Regulations
        .route("/add_regulation", post(regulations::add_regulation))
        .route("/update_regulation", put(regulations::update_regulation))
        .route("/delete_regulation/{id}", delete(regulations::delete_regulation))
        .route("/get_regulations", get(regulations::list_regulations))
        // Subjects
        .route("/add_subject", post(subjects::add_subject))
        .route("/update_subject", put(subjects::update_subject))
        .route("/delete_subject/{id}", delete(subjects::delete_subject))
        .route("/get_subjects", get(subjects::list_subjects))
        .route(
            "/get_subjects/{semester}",
            get(subjects::list_subjects_by_semester),
        )
        // Question banks
        .route("/upload_qb", post(question_bank::upload_qb))
        .route("/list_qb/{subject_id}", get(question_bank::list_qb))
        .route("/download_qb", get(question_bank::download_qb))
        .route("/delete_qb", delete(question_bank::delete_qb))
        .route("/get_qb_count", get(question_bank::get_qb_count))
        // Dashboard
        .route("/get_hod_stats", get(dashboard::get_hod_stats))
        .nest("/generator", generator_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
