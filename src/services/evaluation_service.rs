use crate::dto::mcq_dto::{EvaluationOutcome, EvaluationResponse};
use crate::models::document::MIN_SCRIPT_BYTES;
use crate::models::{AnswerMap, UploadedDocument};
use crate::services::extraction_service::ExtractionService;
use crate::services::grading_service::GradingService;
use crate::services::key_service::KeyService;

const KEY_PROMPT: &str = r#"Extract the MCQ Answer Key from this document.
Format: {"answers": {"1": "A", "2": "B", ...}}
Rules: Map i->A, ii->B, iii->C, iv->D. Output STRICT JSON.
"#;

const STUDENT_PROMPT: &str = r#"You are an MCQ answer extractor.
Extract ONLY the selected option per question.
Rules: Map i->A, ii->B, iii->C, iv->D. Output STRICT JSON.
FORMAT: {"answers": {"1": "A", "2": "B"}}
"#;

/// Everything one evaluation request carries: the student scripts plus
/// an answer key as typed text, an uploaded document, or both (the
/// document takes precedence).
#[derive(Debug, Default)]
pub struct EvaluationInput {
    pub answer_key_text: Option<String>,
    pub answer_key_file: Option<UploadedDocument>,
    pub student_scripts: Vec<UploadedDocument>,
}

/// Sequences one grading request: acquire the answer key, validate the
/// student scripts, extract their answers in a single joint pass, then
/// reconcile. Unreadable student scripts grade to zero; an unusable
/// answer key fails the request, since nothing can be graded without it.
#[derive(Clone)]
pub struct EvaluationService {
    extraction: ExtractionService,
}

impl EvaluationService {
    pub fn new(extraction: ExtractionService) -> Self {
        Self { extraction }
    }

    pub async fn evaluate(&self, input: EvaluationInput) -> EvaluationOutcome {
        if input.student_scripts.is_empty() {
            return EvaluationOutcome::rejected(
                "No student answer scripts were uploaded. Please attach at least one image or PDF.",
            );
        }

        // ---------- 1. Get answer key ----------
        let mut answer_map = AnswerMap::new();

        if let Some(key_file) = &input.answer_key_file {
            if !key_file.is_supported_media_type() {
                return EvaluationOutcome::rejected(
                    "The answer key file format is not supported. Please upload a PDF or Image (JPG/PNG).",
                );
            }
            answer_map = self
                .extraction
                .extract(std::slice::from_ref(key_file), KEY_PROMPT)
                .await;
        }

        if answer_map.is_empty() {
            if let Some(text) = &input.answer_key_text {
                answer_map = KeyService::normalize(text);
            }
        }

        if answer_map.is_empty() {
            return if input.answer_key_file.is_some() {
                EvaluationOutcome::rejected(
                    "We couldn't read the answers from your uploaded answer key file. Please ensure it is clear and contains a list of answers.",
                )
            } else {
                EvaluationOutcome::Report(EvaluationResponse::empty_with_error(
                    "Answer key missing. Please either type the answers in the text box or upload an answer key file.",
                ))
            };
        }

        // ---------- 2. Validate student scripts ----------
        // Fail fast: one bad file rejects the whole batch before any
        // extraction is attempted.
        for script in &input.student_scripts {
            if !script.is_supported_media_type() {
                return EvaluationOutcome::rejected(format!(
                    "The file '{}' is not supported. Only PDF, JPG, and PNG are allowed.",
                    script.filename
                ));
            }
            if script.bytes.len() < MIN_SCRIPT_BYTES {
                return EvaluationOutcome::rejected(format!(
                    "The file '{}' appears to be empty or corrupted. Please upload a valid image or PDF.",
                    script.filename
                ));
            }
        }

        // ---------- 3. Extract student answers ----------
        let detected = self
            .extraction
            .extract(&input.student_scripts, STUDENT_PROMPT)
            .await;

        // ---------- 4. Score ----------
        if detected.is_empty() {
            tracing::warn!("No student answers detected, grading as zero");
            let report = GradingService::zero_score(&answer_map);
            return EvaluationOutcome::Report(EvaluationResponse::from(report).with_error(
                "We couldn't detect any student answers on the uploaded scripts. Please check if the images are clear or if the student has marked their choices.",
            ));
        }

        let report = GradingService::reconcile(&answer_map, &detected);
        EvaluationOutcome::Report(report.into())
    }
}
