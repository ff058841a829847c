use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionStatus {
    Correct,
    Wrong,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    pub student_answer: String,
    pub correct_answer: String,
    pub result: QuestionStatus,
}

/// Outcome of reconciling a detected answer map against the reference map.
///
/// `wrong` counts every non-correct question (unanswered included) so that
/// `correct + wrong == total_questions`; the per-question `result` keeps
/// the unanswered distinction. `score` equals `correct` — one mark per
/// question, no partial credit, no negative marking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub total_questions: usize,
    pub attempted: usize,
    pub correct: usize,
    pub wrong: usize,
    pub score: usize,
    pub details: Vec<QuestionResult>,
}
