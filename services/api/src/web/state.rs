//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use portal_core::ingest::QuestionBankParser;
use portal_core::ports::{DatabaseService, FileStore, PaperRenderer, TextExtractor};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub files: Arc<dyn FileStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub renderer: Arc<dyn PaperRenderer>,
    pub parser: QuestionBankParser,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        files: Arc<dyn FileStore>,
        extractor: Arc<dyn TextExtractor>,
        renderer: Arc<dyn PaperRenderer>,
    ) -> Self {
        let parser = QuestionBankParser::with_banner(&config.institution_name);
        Self {
            db,
            files,
            extractor,
            renderer,
            parser,
            config,
        }
    }
}
