//! Answer classifier: catches replies that are not real answers (raw SDK payloads,
//! near-empty text) and natural-language declines the model did not turn into a tool
//! call. Both end with the question recorded for human follow-up.

use super::tools::ToolRegistry;
use std::sync::Arc;

/// Reply that replaces a malformed completion.
pub const APOLOGY: &str = "I'm sorry — I couldn't answer that. I've recorded the question for follow-up.";

/// Fewer ASCII letters/digits than this means the text is not an answer.
pub const MIN_ALNUM_CHARS: usize = 20;

/// Substrings of SDK diagnostic payloads, checked only when the text opens with `{`.
pub const SDK_MARKERS: &[&str] = &[
    "\"candidates\"",
    "\"model_version\"",
    "\"usage_metadata\"",
    "\"token_count\"",
    "candidates",
    "model_version",
];

/// Lowercase phrases meaning the model meant to record something or declined the topic.
pub const IMPLICIT_RECORD_PHRASES: &[&str] = &[
    // recording intent
    "i will record",
    "i'll record",
    "i've recorded",
    "i have recorded",
    "i can record",
    "i could record",
    "i will make a note",
    "i'll make a note",
    "i have made a note",
    "i'll note",
    "i will note",
    "i've noted",
    "i have noted",
    "i will record that",
    "recorded your question",
    "i've recorded your",
    "record that",
    "record that question",
    "i can help record",
    "i'll help record",
    // scope declines
    "outside the scope",
    "outside my scope",
    "outside of my scope",
    "not related to my professional",
    "not related to my background",
    "not my area of expertise",
    "outside of my expertise",
    "that question is outside",
    "that's outside the scope",
    "i'm afraid that's",
    "i'm sorry, that question is outside",
    "outside of my knowledge",
    "not something i can",
    "not something i'm able to",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationVerdict {
    GenuineAnswer,
    MalformedArtifact,
    ImplicitRecordRequest,
}

pub fn alnum_count(text: &str) -> usize {
    text.chars().filter(char::is_ascii_alphanumeric).count()
}

pub fn looks_like_sdk_payload(text: &str) -> bool {
    text.starts_with('{') && SDK_MARKERS.iter().any(|m| text.contains(m))
}

pub fn matches_implicit_record_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    IMPLICIT_RECORD_PHRASES.iter().any(|p| lower.contains(p))
}

/// Pure verdict for one normalized, trimmed reply. The malformed check runs first.
pub fn classify(text: &str) -> ClassificationVerdict {
    if looks_like_sdk_payload(text) || alnum_count(text) < MIN_ALNUM_CHARS {
        ClassificationVerdict::MalformedArtifact
    } else if matches_implicit_record_phrase(text) {
        ClassificationVerdict::ImplicitRecordRequest
    } else {
        ClassificationVerdict::GenuineAnswer
    }
}

/// Applies the verdict: records the visitor's question when needed and decides whether
/// the reply is replaced.
pub struct AnswerClassifier {
    tools: Arc<ToolRegistry>,
}

impl AnswerClassifier {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Returns the replacement reply, or `None` when `text` stands as is.
    pub async fn review(&self, text: &str, message: &str) -> Option<String> {
        let verdict = classify(text);
        match verdict {
            ClassificationVerdict::GenuineAnswer => None,
            ClassificationVerdict::MalformedArtifact => {
                tracing::warn!(
                    target: "folio::classifier",
                    looks_like_sdk = looks_like_sdk_payload(text),
                    alnum_chars = alnum_count(text),
                    "Detected SDK-like or malformed response"
                );
                self.record(message, verdict).await;
                Some(APOLOGY.to_string())
            }
            ClassificationVerdict::ImplicitRecordRequest => {
                tracing::info!(
                    target: "folio::classifier",
                    "Detected fallback phrase in response, recording question"
                );
                self.record(message, verdict).await;
                None
            }
        }
    }

    async fn record(&self, message: &str, verdict: ClassificationVerdict) {
        match self.tools.record_unknown_question(message).await {
            Ok(result) => tracing::info!(
                target: "folio::classifier",
                ?verdict,
                notification_sent = result.notification_sent,
                "Recorded unknown question"
            ),
            Err(e) => tracing::error!(
                target: "folio::classifier",
                ?verdict,
                error = %e,
                "Automatic record of unknown question failed"
            ),
        }
    }
}
