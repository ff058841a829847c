pub mod answer_map;
pub mod document;
pub mod report;

pub use answer_map::AnswerMap;
pub use document::UploadedDocument;
pub use report::{QuestionResult, QuestionStatus, ReconciliationReport};
