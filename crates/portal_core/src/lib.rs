pub mod domain;
pub mod generator;
pub mod ingest;
pub mod ports;
pub mod validation;

pub use domain::{
    Bucket, DepartmentStats, Faculty, FacultyCredentials, GeneratedPaper, PaperMeta,
    PaperSection, PaperSet, ParsedQuestionBank, Question, QuestionBankFile, QuestionMeta,
    RecordCounts, Regulation, StoredFile, Subject, SubjectFilter, UnitPools,
};
pub use generator::{generate_sets, GenerationError};
pub use ingest::QuestionBankParser;
pub use ports::{
    DatabaseService, FileStore, PaperRenderer, PortError, PortResult, TextExtractor,
};
pub use validation::ValidationError;
