pub mod db;
pub mod file_store;
pub mod pdf_render;
pub mod pdf_text;

pub use db::DbAdapter;
pub use file_store::LocalFileStore;
pub use pdf_render::GenPdfRenderer;
pub use pdf_text::PdfTextExtractor;
