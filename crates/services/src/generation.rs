//! Client for the language-model completion endpoint that turns source text
//! into a summary plus a multiple-choice quiz.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use study_core::model::{MAX_OPTIONS, Question, QuestionId};

/// Source text beyond this many characters is truncated before prompting.
pub const MAX_SOURCE_CHARS: usize = 30_000;
/// A generated quiz holds at most this many questions.
pub const MAX_QUESTIONS: usize = 10;

const SYSTEM_INSTRUCTION: &str = "\
You are an educational tutor. From the provided material alone, produce a \
detailed markdown summary (### headings, no bold asterisks) and a quiz of \
exactly 10 multiple-choice questions with 4 options each, with an \
explanation for every correct answer. Stay strictly faithful to the \
material and answer in its language. Return ONLY a JSON object of the \
shape {\"summary\": string, \"questions\": [{\"text\": string, \
\"options\": [string], \"correctAnswerIndex\": number, \
\"explanation\": string}]} with no markdown code fences.";

/// Generated study material: a summary and a validated question sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedContent {
    pub summary: String,
    pub questions: Vec<Question>,
}

/// Seam for the content-generation collaborator so the library service and
/// tests can inject their own producer.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a summary and quiz from source text.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the service is unconfigured, the
    /// provider fails, or the response cannot be parsed.
    async fn generate(&self, source_text: &str) -> Result<GeneratedContent, GenerationError>;
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GenerationConfig {
    /// Reads configuration from the environment; `None` when no usable API
    /// key is present.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("STUDY_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("STUDY_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("STUDY_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// HTTP client for the chat-completions endpoint.
#[derive(Clone)]
pub struct GenerationService {
    client: Client,
    config: Option<GenerationConfig>,
}

impl GenerationService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GenerationConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GenerationConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// True when an API key is configured.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl ContentGenerator for GenerationService {
    async fn generate(&self, source_text: &str) -> Result<GeneratedContent, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::MissingApiKey)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let truncated: String = source_text.chars().take(MAX_SOURCE_CHARS).collect();
        let prompt = format!(
            "Analyse the following material and generate the structured study \
             content (summary + quiz) as JSON per the instructions.\n\n\
             MATERIAL:\n{truncated}"
        );

        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)?;

        parse_generated(&content)
    }
}

/// Extracts a human-readable message from a provider error envelope, with a
/// truncated raw-body fallback.
fn provider_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: Option<EnvelopeError>,
        message: Option<String>,
    }
    #[derive(Deserialize)]
    struct EnvelopeError {
        message: Option<String>,
    }

    if let Ok(envelope) = serde_json::from_str::<Envelope>(body) {
        if let Some(message) = envelope.error.and_then(|e| e.message).or(envelope.message) {
            return message;
        }
    }
    let mut fallback: String = body.chars().take(100).collect();
    if fallback.is_empty() {
        fallback = "provider returned an unreadable error".to_string();
    }
    fallback
}

/// Parses the model's reply into validated study content.
///
/// Strips markdown code fences, enforces the question and option caps, and
/// mints a fresh id for every question since the provider guarantees none.
fn parse_generated(content: &str) -> Result<GeneratedContent, GenerationError> {
    let json = content.replace("```json", "").replace("```", "");
    let raw: RawContent =
        serde_json::from_str(json.trim()).map_err(|_| GenerationError::MalformedResponse)?;

    let questions = raw
        .questions
        .unwrap_or_default()
        .into_iter()
        .take(MAX_QUESTIONS)
        .filter_map(|q| {
            let mut options: Vec<String> = q
                .options
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
            options.truncate(MAX_OPTIONS);
            // Questions that still fail validation are dropped rather than
            // failing the whole batch.
            Question::new(
                QuestionId::generate(),
                q.text,
                options,
                q.correct_answer_index,
                q.explanation.unwrap_or_default(),
            )
            .ok()
        })
        .collect();

    Ok(GeneratedContent {
        summary: raw
            .summary
            .unwrap_or_else(|| "No summary generated.".to_string()),
        questions,
    })
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    summary: Option<String>,
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    text: String,
    #[serde(default)]
    options: Vec<serde_json::Value>,
    #[serde(default)]
    correct_answer_index: usize,
    explanation: Option<String>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_question(n: usize) -> String {
        format!(
            r#"{{"text": "question {n}", "options": ["a", "b", "c", "d"],
                "correctAnswerIndex": 1, "explanation": "because"}}"#
        )
    }

    fn payload(question_count: usize) -> String {
        let questions: Vec<String> = (0..question_count).map(raw_question).collect();
        // Four hashes: the embedded `"###` would close a shorter delimiter.
        format!(
            r####"{{"summary": "### Summary", "questions": [{}]}}"####,
            questions.join(",")
        )
    }

    #[test]
    fn parses_a_clean_payload() {
        let content = parse_generated(&payload(10)).unwrap();
        assert_eq!(content.summary, "### Summary");
        assert_eq!(content.questions.len(), 10);
        assert_eq!(content.questions[0].correct_answer_index(), 1);
    }

    #[test]
    fn strips_code_fences_before_parsing() {
        let fenced = format!("```json\n{}\n```", payload(2));
        let content = parse_generated(&fenced).unwrap();
        assert_eq!(content.questions.len(), 2);
    }

    #[test]
    fn caps_questions_at_ten() {
        let content = parse_generated(&payload(13)).unwrap();
        assert_eq!(content.questions.len(), MAX_QUESTIONS);
    }

    #[test]
    fn truncates_excess_options_and_drops_non_strings() {
        let raw = r#"{"summary": "s", "questions": [
            {"text": "q", "options": ["a", 7, "b", "c", "d", "e"],
             "correctAnswerIndex": 0, "explanation": "x"}
        ]}"#;
        let content = parse_generated(raw).unwrap();
        assert_eq!(content.questions.len(), 1);
        assert_eq!(content.questions[0].options(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn drops_questions_that_fail_validation() {
        let raw = r#"{"summary": "s", "questions": [
            {"text": "unanswerable", "options": ["only"],
             "correctAnswerIndex": 0, "explanation": ""},
            {"text": "bad index", "options": ["a", "b"],
             "correctAnswerIndex": 5, "explanation": ""},
            {"text": "fine", "options": ["a", "b"],
             "correctAnswerIndex": 1, "explanation": ""}
        ]}"#;
        let content = parse_generated(raw).unwrap();
        assert_eq!(content.questions.len(), 1);
        assert_eq!(content.questions[0].text(), "fine");
    }

    #[test]
    fn questions_get_fresh_ids() {
        let content = parse_generated(&payload(2)).unwrap();
        assert_ne!(content.questions[0].id(), content.questions[1].id());
    }

    #[test]
    fn garbage_is_a_malformed_response() {
        let err = parse_generated("The model apologises and refuses.").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse));
    }

    #[test]
    fn missing_summary_falls_back() {
        let raw = r#"{"questions": []}"#;
        let content = parse_generated(raw).unwrap();
        assert_eq!(content.summary, "No summary generated.");
        assert!(content.questions.is_empty());
    }

    #[test]
    fn provider_message_prefers_error_envelope() {
        let body = r#"{"error": {"message": "quota exceeded"}}"#;
        assert_eq!(provider_message(body), "quota exceeded");

        let body = r#"{"message": "bad request"}"#;
        assert_eq!(provider_message(body), "bad request");

        assert_eq!(provider_message("<html>nope</html>"), "<html>nope</html>");
        assert_eq!(
            provider_message(""),
            "provider returned an unreadable error"
        );
    }

    #[tokio::test]
    async fn unconfigured_service_reports_missing_key() {
        let service = GenerationService::new(None);
        assert!(!service.enabled());
        let err = service.generate("text").await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}
