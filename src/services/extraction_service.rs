use crate::config::Config;
use crate::error::Result;
use crate::models::{AnswerMap, UploadedDocument};
use crate::utils::pdf;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const GEMINI_MODELS: [&str; 4] = [
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-pro",
];
const AZURE_API_VERSION: &str = "2024-02-15-preview";
const COHERE_MODEL: &str = "command-r-plus-08-2024";

/// One extraction capability: turn documents plus an instruction into an
/// answer map. Implementations own their internal retries (e.g. trying
/// several model variants); the gateway only sees success or failure.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(
        &self,
        documents: &[UploadedDocument],
        instruction: &str,
    ) -> Result<AnswerMap>;
}

/// Priority chain over the configured extraction backends. The first
/// backend that returns a non-empty, well-formed answer map wins; a
/// backend that errors or comes back empty is skipped and the chain
/// moves on. Backends with missing credentials are never constructed,
/// so misconfiguration costs nothing at request time.
#[derive(Clone)]
pub struct ExtractionService {
    backends: Arc<Vec<Box<dyn ExtractionBackend>>>,
}

impl ExtractionService {
    pub fn from_config(config: &Config, client: Client) -> Self {
        let mut backends: Vec<Box<dyn ExtractionBackend>> = Vec::new();

        if let Some(key) = &config.gemini_api_key {
            backends.push(Box::new(GeminiBackend::new(key.clone(), client.clone())));
        }
        if let (Some(key), Some(endpoint), Some(deployment)) = (
            &config.azure_openai_key,
            &config.azure_openai_endpoint,
            &config.azure_openai_deployment,
        ) {
            backends.push(Box::new(AzureOpenAiBackend::new(
                key.clone(),
                endpoint.clone(),
                deployment.clone(),
                client.clone(),
            )));
        }
        if let Some(key) = &config.cohere_api_key {
            backends.push(Box::new(CohereBackend::new(key.clone(), client)));
        }

        tracing::info!(
            "Extraction chain: [{}]",
            backends
                .iter()
                .map(|b| b.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self::with_backends(backends)
    }

    pub fn with_backends(backends: Vec<Box<dyn ExtractionBackend>>) -> Self {
        Self {
            backends: Arc::new(backends),
        }
    }

    /// Extracts an answer map from the given documents, or returns an
    /// empty map when no backend could produce one. Never errors: total
    /// extraction failure is an expected outcome the caller grades
    /// around, not an exception.
    pub async fn extract(&self, documents: &[UploadedDocument], instruction: &str) -> AnswerMap {
        let usable: Vec<UploadedDocument> = documents
            .iter()
            .filter(|doc| {
                if !doc.is_supported_media_type() {
                    tracing::warn!(
                        "Dropping '{}': unsupported media type '{}'",
                        doc.filename,
                        doc.media_type
                    );
                    false
                } else if doc.is_near_empty() {
                    tracing::warn!("Dropping '{}': file is empty", doc.filename);
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        if usable.is_empty() {
            tracing::warn!("No usable documents after filtering, skipping extraction");
            return AnswerMap::new();
        }

        for backend in self.backends.iter() {
            match backend.extract(&usable, instruction).await {
                Ok(map) if !map.is_empty() => {
                    tracing::info!("Backend '{}' extracted {} answers", backend.name(), map.len());
                    return map;
                }
                Ok(_) => {
                    tracing::warn!("Backend '{}' returned no answers, trying next", backend.name());
                }
                Err(e) => {
                    tracing::warn!("Backend '{}' failed: {}, trying next", backend.name(), e);
                }
            }
        }

        AnswerMap::new()
    }
}

/// Coerces a backend's raw text into an answer map: strips code-fence
/// wrappers, parses JSON, accepts both `{"answers": {...}}` and a flat
/// object. String values are trimmed and upper-cased, numbers and bools
/// are stringified, anything else is skipped.
fn parse_answer_payload(raw: &str) -> Result<AnswerMap> {
    let cleaned = raw.trim().replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let value: JsonValue = serde_json::from_str(cleaned)?;
    let answers = match value.get("answers") {
        Some(nested) if nested.is_object() => nested,
        _ => &value,
    };
    let object = answers
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("Expected a JSON object of answers"))?;

    let mut map = AnswerMap::new();
    for (question, answer) in object {
        match answer {
            JsonValue::String(s) => {
                let s = s.trim();
                if !s.is_empty() {
                    map.insert(question.as_str(), s.to_uppercase());
                }
            }
            JsonValue::Number(_) | JsonValue::Bool(_) => {
                map.insert(question.as_str(), answer.to_string().to_uppercase());
            }
            _ => {}
        }
    }
    Ok(map)
}

/// Gemini REST backend. Documents ride along as inline base64 parts and
/// the response is forced to JSON. Several model variants are tried in
/// order, newest first, to ride out per-model outages and quota errors.
pub struct GeminiBackend {
    api_key: String,
    client: Client,
}

impl GeminiBackend {
    pub fn new(api_key: String, client: Client) -> Self {
        Self { api_key, client }
    }
}

#[async_trait]
impl ExtractionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn extract(
        &self,
        documents: &[UploadedDocument],
        instruction: &str,
    ) -> Result<AnswerMap> {
        let mut parts: Vec<JsonValue> = documents
            .iter()
            .map(|doc| {
                json!({
                    "inline_data": {
                        "mime_type": doc.media_type,
                        "data": BASE64.encode(&doc.bytes),
                    }
                })
            })
            .collect();
        parts.push(json!({ "text": instruction }));

        let payload = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "response_mime_type": "application/json" }
        });

        for model in GEMINI_MODELS {
            let url = format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                model
            );

            let response = match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&payload)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => resp,
                Ok(resp) => {
                    tracing::warn!("Gemini model {} returned {}", model, resp.status());
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Gemini model {} request failed: {}", model, e);
                    continue;
                }
            };

            let body: JsonValue = match response.json().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Gemini model {} body read failed: {}", model, e);
                    continue;
                }
            };

            let text = body
                .get("candidates")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("content"))
                .and_then(|c| c.get("parts"))
                .and_then(|p| p.get(0))
                .and_then(|p| p.get("text"))
                .and_then(|t| t.as_str());

            match text.map(parse_answer_payload) {
                Some(Ok(map)) => return Ok(map),
                Some(Err(e)) => {
                    tracing::warn!("Gemini model {} payload unparseable: {}", model, e);
                }
                None => {
                    tracing::warn!("Gemini model {} response had no text part", model);
                }
            }
        }

        Err(anyhow::anyhow!("All Gemini model variants failed").into())
    }
}

/// Azure OpenAI chat-completions backend. Images go in as data URLs;
/// PDF pages are rasterized to PNG first because the endpoint only
/// accepts images.
pub struct AzureOpenAiBackend {
    api_key: String,
    endpoint: String,
    deployment: String,
    client: Client,
}

impl AzureOpenAiBackend {
    pub fn new(api_key: String, endpoint: String, deployment: String, client: Client) -> Self {
        Self {
            api_key,
            endpoint,
            deployment,
            client,
        }
    }
}

#[async_trait]
impl ExtractionBackend for AzureOpenAiBackend {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn extract(
        &self,
        documents: &[UploadedDocument],
        instruction: &str,
    ) -> Result<AnswerMap> {
        let mut content: Vec<JsonValue> = vec![json!({ "type": "text", "text": instruction })];

        for doc in documents {
            if doc.is_pdf() {
                let pages = pdf::pdf_to_images(&doc.bytes).await?;
                for page in pages {
                    content.push(json!({
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{}", page) }
                    }));
                }
            } else {
                content.push(json!({
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{};base64,{}", doc.media_type, BASE64.encode(&doc.bytes))
                    }
                }));
            }
        }

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            AZURE_API_VERSION
        );

        let payload = json!({
            "messages": [
                { "role": "system", "content": "Extract MCQ answers. JSON only." },
                { "role": "user", "content": content }
            ],
            "response_format": { "type": "json_object" }
        });

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Azure OpenAI error {}: {}", status, text).into());
        }

        let body: JsonValue = response.json().await?;
        let text = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid Azure OpenAI response format"))?;

        parse_answer_payload(text)
    }
}

/// Cohere text-only backend, the last resort in the chain. It can only
/// work with the text layer of PDF documents; pure image uploads make
/// it report failure so the chain ends cleanly.
pub struct CohereBackend {
    api_key: String,
    client: Client,
}

impl CohereBackend {
    pub fn new(api_key: String, client: Client) -> Self {
        Self { api_key, client }
    }
}

#[async_trait]
impl ExtractionBackend for CohereBackend {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn extract(
        &self,
        documents: &[UploadedDocument],
        instruction: &str,
    ) -> Result<AnswerMap> {
        let mut text_content = String::new();
        for doc in documents {
            if doc.is_pdf() {
                match pdf::pdf_to_text(&doc.bytes).await {
                    Ok(text) => text_content.push_str(&text),
                    Err(e) => tracing::warn!("Text extraction failed for '{}': {}", doc.filename, e),
                }
            }
        }

        if text_content.trim().is_empty() {
            return Err(anyhow::anyhow!("No text content available for Cohere").into());
        }

        let payload = json!({
            "model": COHERE_MODEL,
            "message": format!("{}\n\nTEXT:\n{}", instruction, text_content),
            "response_format": { "type": "json_object" }
        });

        let response = self
            .client
            .post("https://api.cohere.com/v1/chat")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Cohere error {}: {}", status, text).into());
        }

        let body: JsonValue = response.json().await?;
        let text = body
            .get("text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid Cohere response format"))?;

        parse_answer_payload(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(filename: &str, media_type: &str, len: usize) -> UploadedDocument {
        UploadedDocument::new(filename, media_type, Bytes::from(vec![0u8; len]))
    }

    fn answers(pairs: &[(&str, &str)]) -> AnswerMap {
        pairs
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect()
    }

    /// Scripted backend for chain tests: `Some(map)` is a successful
    /// extraction, `None` an error.
    struct StubBackend {
        label: &'static str,
        outcome: Option<AnswerMap>,
        calls: Arc<AtomicUsize>,
    }

    impl StubBackend {
        fn boxed(
            label: &'static str,
            outcome: Option<AnswerMap>,
            calls: Arc<AtomicUsize>,
        ) -> Box<dyn ExtractionBackend> {
            Box::new(Self {
                label,
                outcome,
                calls,
            })
        }
    }

    #[async_trait]
    impl ExtractionBackend for StubBackend {
        fn name(&self) -> &str {
            self.label
        }

        async fn extract(&self, _: &[UploadedDocument], _: &str) -> Result<AnswerMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Some(map) => Ok(map.clone()),
                None => Err(anyhow::anyhow!("stub backend down").into()),
            }
        }
    }

    #[test]
    fn payload_flat_object() {
        let map = parse_answer_payload(r#"{"1": "A", "2": "b"}"#).unwrap();
        assert_eq!(map.get("1"), Some("A"));
        assert_eq!(map.get("2"), Some("B"));
    }

    #[test]
    fn payload_nested_answers_object() {
        let map = parse_answer_payload(r#"{"answers": {"1": "A"}}"#).unwrap();
        assert_eq!(map.get("1"), Some("A"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn payload_strips_code_fences() {
        let map = parse_answer_payload("```json\n{\"1\": \"A\"}\n```").unwrap();
        assert_eq!(map.get("1"), Some("A"));
    }

    #[test]
    fn payload_coerces_non_string_values() {
        let map = parse_answer_payload(r#"{"1": 3, "2": true, "3": null, "4": ["A"]}"#).unwrap();
        assert_eq!(map.get("1"), Some("3"));
        assert_eq!(map.get("2"), Some("TRUE"));
        assert_eq!(map.get("3"), None);
        assert_eq!(map.get("4"), None);
    }

    #[test]
    fn payload_skips_empty_string_values() {
        let map = parse_answer_payload(r#"{"1": "  ", "2": "B"}"#).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("2"), Some("B"));
    }

    #[test]
    fn payload_preserves_document_order() {
        let map = parse_answer_payload(r#"{"2": "B", "1": "A", "10": "D"}"#).unwrap();
        let order: Vec<&str> = map.iter().map(|(q, _)| q).collect();
        assert_eq!(order, vec!["2", "1", "10"]);
    }

    #[test]
    fn payload_rejects_malformed_json() {
        assert!(parse_answer_payload("not json at all").is_err());
        assert!(parse_answer_payload(r#"["A", "B"]"#).is_err());
    }

    #[tokio::test]
    async fn first_nonempty_backend_wins() {
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));
        let service = ExtractionService::with_backends(vec![
            StubBackend::boxed("first", Some(answers(&[("1", "A")])), first_calls.clone()),
            StubBackend::boxed("second", Some(answers(&[("1", "B")])), second_calls.clone()),
        ]);

        let docs = [doc("sheet.png", "image/png", 500)];
        let map = service.extract(&docs, "extract").await;

        assert_eq!(map.get("1"), Some("A"));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_backend_advances_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ExtractionService::with_backends(vec![
            StubBackend::boxed("down", None, calls.clone()),
            StubBackend::boxed("up", Some(answers(&[("1", "C")])), calls.clone()),
        ]);

        let docs = [doc("sheet.pdf", "application/pdf", 500)];
        let map = service.extract(&docs, "extract").await;

        assert_eq!(map.get("1"), Some("C"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_result_advances_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ExtractionService::with_backends(vec![
            StubBackend::boxed("empty", Some(AnswerMap::new()), calls.clone()),
            StubBackend::boxed("full", Some(answers(&[("1", "D")])), calls.clone()),
        ]);

        let docs = [doc("sheet.png", "image/png", 500)];
        let map = service.extract(&docs, "extract").await;

        assert_eq!(map.get("1"), Some("D"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_chain_returns_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ExtractionService::with_backends(vec![
            StubBackend::boxed("a", None, calls.clone()),
            StubBackend::boxed("b", Some(AnswerMap::new()), calls.clone()),
        ]);

        let docs = [doc("sheet.png", "image/png", 500)];
        let map = service.extract(&docs, "extract").await;

        assert!(map.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unusable_documents_short_circuit_without_backend_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ExtractionService::with_backends(vec![StubBackend::boxed(
            "never",
            Some(answers(&[("1", "A")])),
            calls.clone(),
        )]);

        let docs = [
            doc("notes.txt", "text/plain", 500),
            doc("tiny.png", "image/png", 3),
        ];
        let map = service.extract(&docs, "extract").await;

        assert!(map.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_backends_configured_returns_empty() {
        let service = ExtractionService::with_backends(Vec::new());
        let docs = [doc("sheet.png", "image/png", 500)];
        assert!(service.extract(&docs, "extract").await.is_empty());
    }
}
