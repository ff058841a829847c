use crate::models::{AnswerMap, QuestionResult, QuestionStatus, ReconciliationReport};

pub struct GradingService;

impl GradingService {
    /// Compares a detected answer map against the reference map.
    ///
    /// The reference map defines the universe of questions and the
    /// iteration order; detected questions outside it are ignored.
    /// A missing or empty detected value counts as unanswered, which
    /// still lands in the aggregate `wrong` bucket.
    pub fn reconcile(reference: &AnswerMap, detected: &AnswerMap) -> ReconciliationReport {
        let mut details = Vec::with_capacity(reference.len());
        let mut correct = 0;
        let mut attempted = 0;

        for (question, reference_answer) in reference.iter() {
            let correct_answer = reference_answer.trim().to_uppercase();
            let student_answer = detected
                .get(question)
                .map(|a| a.trim().to_uppercase())
                .unwrap_or_default();

            let result = if student_answer.is_empty() {
                QuestionStatus::Unanswered
            } else {
                attempted += 1;
                if student_answer == correct_answer {
                    correct += 1;
                    QuestionStatus::Correct
                } else {
                    QuestionStatus::Wrong
                }
            };

            details.push(QuestionResult {
                question: question.to_string(),
                student_answer,
                correct_answer,
                result,
            });
        }

        let total_questions = reference.len();
        ReconciliationReport {
            total_questions,
            attempted,
            correct,
            wrong: total_questions - correct,
            score: correct,
            details,
        }
    }

    /// Report for the "could not read any answers" fail-soft path:
    /// every reference question marked wrong with an empty detected
    /// answer, so the submission still grades to zero instead of
    /// failing the request.
    pub fn zero_score(reference: &AnswerMap) -> ReconciliationReport {
        let details: Vec<QuestionResult> = reference
            .iter()
            .map(|(question, answer)| QuestionResult {
                question: question.to_string(),
                student_answer: String::new(),
                correct_answer: answer.trim().to_uppercase(),
                result: QuestionStatus::Wrong,
            })
            .collect();

        let total_questions = details.len();
        ReconciliationReport {
            total_questions,
            attempted: 0,
            correct: 0,
            wrong: total_questions,
            score: 0,
            details,
        }
    }
}
