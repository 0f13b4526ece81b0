//! Completion payload model and the response normalizer.
//!
//! The completion service can answer in several shapes depending on API version, so the
//! payload is an explicit tagged union and [`normalize`] walks a fixed fallback chain
//! over it instead of probing attributes dynamically.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Absolute last resort when nothing, not even a serialization, can be recovered.
pub const NO_TEXT_FALLBACK: &str = "Sorry — the model returned no text.";

/// Candidate fields probed by the normalizer, in priority order.
pub const CANDIDATE_FIELDS: [&str; 4] = ["content", "text", "output", "parts"];

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion payload could not be decoded: {0}")]
    Decode(String),
}

/// Raw completion payload, one variant per known shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionResult {
    /// Payload exposing a direct text field.
    Text(String),
    /// Payload exposing a candidate list.
    Candidates(Vec<Candidate>),
    /// Anything else; only recoverable by serialization.
    Opaque(Value),
}

/// One completion candidate. Each field holds whatever the service put there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Value>,
}

impl Candidate {
    fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "content" => self.content.as_ref(),
            "text" => self.text.as_ref(),
            "output" => self.output.as_ref(),
            "parts" => self.parts.as_ref(),
            _ => None,
        }
    }
}

impl CompletionResult {
    /// Decodes a `generateContent` response body.
    ///
    /// Text parts of the first candidate become [`CompletionResult::Text`]; a candidate list
    /// without text parts becomes [`CompletionResult::Candidates`] (the Gemini `content`
    /// container is unwrapped into `parts`); everything else is [`CompletionResult::Opaque`].
    pub fn from_gemini(body: Value) -> Self {
        if let Some(text) = gemini_text(&body) {
            return Self::Text(text);
        }

        match body.get("candidates").and_then(Value::as_array) {
            Some(raw) if !raw.is_empty() => {
                Self::Candidates(raw.iter().map(decode_gemini_candidate).collect())
            }
            _ => Self::Opaque(body),
        }
    }

    /// Finish reason of the first candidate, when the payload carries one.
    pub fn finish_reason(body: &Value) -> Option<&str> {
        body.pointer("/candidates/0/finishReason")
            .or_else(|| body.pointer("/candidates/0/finish_reason"))
            .and_then(Value::as_str)
    }
}

fn gemini_text(body: &Value) -> Option<String> {
    let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

fn decode_gemini_candidate(raw: &Value) -> Candidate {
    let mut candidate = Candidate {
        text: raw.get("text").cloned(),
        output: raw.get("output").cloned(),
        parts: raw.get("parts").cloned(),
        ..Candidate::default()
    };
    match raw.get("content") {
        Some(Value::Object(container)) => {
            if candidate.parts.is_none() {
                candidate.parts = container.get("parts").cloned();
            }
        }
        Some(other) => candidate.content = Some(other.clone()),
        None => {}
    }
    candidate
}

/// Extracts a plain-text answer from any payload shape. Never fails.
pub fn normalize(result: &CompletionResult) -> String {
    if let CompletionResult::Text(text) = result {
        if !text.is_empty() {
            return text.clone();
        }
    }

    if let CompletionResult::Candidates(candidates) = result {
        if let Some(text) = candidates.first().and_then(candidate_text) {
            return text;
        }
    }

    let serialized = match result {
        CompletionResult::Opaque(value) => value.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };
    if serialized.trim().is_empty() {
        NO_TEXT_FALLBACK.to_string()
    } else {
        serialized
    }
}

/// First non-blank field wins, even when it only yields a serialization.
fn candidate_text(candidate: &Candidate) -> Option<String> {
    CANDIDATE_FIELDS
        .iter()
        .filter_map(|name| candidate.field(name))
        .find(|value| !is_blank(value))
        .map(value_text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => match items.first() {
            Some(Value::String(s)) => s.clone(),
            Some(first) => first
                .get("text")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| first.to_string()),
            None => String::new(),
        },
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

/// Sends a composed prompt to the remote completion service.
#[async_trait::async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionResult, GatewayError>;
}
