use crate::models::{QuestionResult, ReconciliationReport};
use serde::{Deserialize, Serialize};

/// Wire shape of a graded evaluation. `error` is populated on the
/// fail-soft paths (zero-score grading, missing answer key) while the
/// report fields stay present so clients can always render a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub total_questions: usize,
    pub attempted: usize,
    pub correct: usize,
    pub wrong: usize,
    pub score: usize,
    pub details: Vec<QuestionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResponse {
    /// Zero-valued response with no details, used when no answer key
    /// could be acquired at all.
    pub fn empty_with_error(error: impl Into<String>) -> Self {
        Self {
            total_questions: 0,
            attempted: 0,
            correct: 0,
            wrong: 0,
            score: 0,
            details: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl From<ReconciliationReport> for EvaluationResponse {
    fn from(report: ReconciliationReport) -> Self {
        Self {
            total_questions: report.total_questions,
            attempted: report.attempted,
            correct: report.correct,
            wrong: report.wrong,
            score: report.score,
            details: report.details,
            error: None,
        }
    }
}

/// Evaluation result as returned to the client. Request-level failures
/// (bad uploads, unreadable key file) are plain `{"error": ...}` bodies
/// served with a 2xx status; clients key on the body shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationOutcome {
    Report(EvaluationResponse),
    Rejected { error: String },
}

impl EvaluationOutcome {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self::Rejected {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSheetResponse {
    pub filename: String,
    pub message: String,
    pub path: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}
