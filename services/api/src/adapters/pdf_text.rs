//! services/api/src/adapters/pdf_text.rs
//!
//! Implements the `TextExtractor` port with the `pdf-extract` crate.

use portal_core::ports::{PortError, PortResult, TextExtractor};

#[derive(Clone, Copy, Debug, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf: &[u8]) -> PortResult<String> {
        pdf_extract::extract_text_from_mem(pdf)
            .map_err(|e| PortError::Invalid(format!("pdf read failed: {}", e)))
    }
}
