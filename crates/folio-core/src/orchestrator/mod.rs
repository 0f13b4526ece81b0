//! Dialogue orchestrator: one chat turn from visitor message to displayed reply.

mod classifier;
#[cfg(test)]
pub(crate) mod test_support;
mod tools;

pub use classifier::{
    alnum_count, classify, looks_like_sdk_payload, matches_implicit_record_phrase, AnswerClassifier,
    ClassificationVerdict, APOLOGY, IMPLICIT_RECORD_PHRASES, MIN_ALNUM_CHARS, SDK_MARKERS,
};
pub use tools::{
    extract_tool_call, parse_args, strip_tool_markup, AgentTool, ToolCall, ToolError, ToolRegistry,
    ToolResult, ALLOWED_TOOLS, RECORD_UNKNOWN_QUESTION, RECORD_USER_DETAILS,
};

use crate::completion::{normalize, CompletionGateway, CompletionResult};
use crate::knowledge::KnowledgeContext;
use serde_json::Value;
use std::sync::Arc;

/// Case-insensitive substrings that route a message to the résumé fast path.
pub const RESUME_KEYWORDS: &[&str] = &[
    "resume",
    "cv",
    "curriculum vitae",
    "my resume",
    "my cv",
    "download resume",
    "send resume",
];

/// Deterministic reply for résumé requests; no completion call is made.
pub const RESUME_REPLY: &str = "📄 **Here's my resume!**

I've made it easy for you to download my complete resume. Just click the **📥 download button** in the chat header (top-right corner) to get my resume PDF instantly!

---

### 🎯 What's in my resume:
- **Professional Experience** - My journey so far and the roles I've held
- **Technical Skills** - The languages, tools and domains I work in
- **Projects** - Real-world applications and solutions I've built
- **Education & Certifications** - Relevant qualifications and achievements

---

### 💬 After reviewing, I'm here to:
- **Discuss my experience** - Ask about specific projects or skills
- **Answer technical questions** - Deep dive into my expertise
- **Discuss opportunities** - Share your email if interested in collaborating
- **Clarify anything** - I'm happy to explain any part of my background

Feel free to ask any questions! 😊";

/// Sequences prompt composition, completion, normalization, tool dispatch and
/// classification for a turn. Holds only read-only shared state.
pub struct Dialogue {
    knowledge: Arc<KnowledgeContext>,
    gateway: Arc<dyn CompletionGateway>,
    tools: Arc<ToolRegistry>,
    classifier: AnswerClassifier,
}

impl Dialogue {
    pub fn new(
        knowledge: Arc<KnowledgeContext>,
        gateway: Arc<dyn CompletionGateway>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            knowledge,
            gateway,
            classifier: AnswerClassifier::new(Arc::clone(&tools)),
            tools,
        }
    }

    pub fn is_resume_request(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.knowledge.resume_available && RESUME_KEYWORDS.iter().any(|k| lower.contains(k))
    }

    /// Persona system prompt, then the message. The caller-supplied history is an addition
    /// rendered between the two so follow-up questions keep their context; with an empty
    /// history the prompt is exactly system prompt plus message.
    pub fn build_prompt(&self, message: &str, history: &[Value]) -> String {
        let mut prompt = self.knowledge.system_prompt();
        let transcript = render_history(history, &self.knowledge.persona_name);
        if !transcript.is_empty() {
            prompt.push_str("\n\n## Conversation so far:\n");
            prompt.push_str(&transcript);
        }
        prompt.push('\n');
        prompt.push_str(message);
        prompt
    }

    /// Produces the visitor-facing reply for one message. Never fails.
    pub async fn handle_turn(&self, message: &str, history: &[Value]) -> String {
        if self.is_resume_request(message) {
            tracing::info!(target: "folio::chat", "Resume request detected, skipping completion");
            return RESUME_REPLY.to_string();
        }

        let prompt = self.build_prompt(message, history);
        let completion = match self.gateway.complete(&prompt).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(target: "folio::chat", error = %e, "Completion call failed");
                CompletionResult::Opaque(Value::Null)
            }
        };

        let text = normalize(&completion);

        if let Some(cleaned) = self.tools.dispatch_embedded(&text).await {
            return cleaned;
        }

        // A call that did not run still never reaches the visitor.
        let text = if tools::has_tool_markup(&text) {
            strip_tool_markup(&text)
        } else {
            text.trim().to_string()
        };
        if let Some(replacement) = self.classifier.review(&text, message).await {
            return replacement;
        }
        text
    }
}

/// Renders `{role, content}` objects, `[user, assistant]` pairs or bare strings as a
/// transcript. Unrecognized entries are skipped.
fn render_history(history: &[Value], persona_name: &str) -> String {
    let mut lines = Vec::new();
    for entry in history {
        match entry {
            Value::Object(turn) => {
                let content = turn.get("content").and_then(Value::as_str).unwrap_or("").trim();
                if content.is_empty() {
                    continue;
                }
                let speaker = match turn.get("role").and_then(Value::as_str) {
                    Some("assistant" | "model" | "bot") => persona_name,
                    _ => "User",
                };
                lines.push(format!("{speaker}: {content}"));
            }
            Value::Array(pair) => {
                if let Some(user) = pair.first().and_then(Value::as_str) {
                    lines.push(format!("User: {user}"));
                }
                if let Some(reply) = pair.get(1).and_then(Value::as_str) {
                    lines.push(format!("{persona_name}: {reply}"));
                }
            }
            Value::String(user) => lines.push(format!("User: {user}")),
            _ => {}
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::test_support::{recording_registry, ScriptedGateway};
    use super::*;
    use crate::completion::Candidate;
    use serde::Deserialize;
    use serde_json::{json, Map};
    use std::path::PathBuf;

    fn knowledge(resume_available: bool) -> Arc<KnowledgeContext> {
        Arc::new(KnowledgeContext {
            persona_name: "Ada Example".to_string(),
            summary: "Systems engineer.".to_string(),
            profile_text: String::new(),
            resume_available,
            resume_path: PathBuf::from("me/resume.pdf"),
        })
    }

    #[tokio::test]
    async fn resume_request_skips_the_gateway() {
        let gateway = ScriptedGateway::text("should not be used");
        let (registry, _, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway.clone(), registry);

        let reply = dialogue.handle_turn("Can I see your RESUME please?", &[]).await;

        assert_eq!(reply, RESUME_REPLY);
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(unknown.call_count(), 0);
    }

    #[tokio::test]
    async fn resume_keywords_need_an_available_resume() {
        let answer = "My resume is not online yet, but I have ten years of backend experience.";
        let gateway = ScriptedGateway::text(answer);
        let (registry, _, _) = recording_registry();
        let dialogue = Dialogue::new(knowledge(false), gateway.clone(), registry);

        assert_eq!(dialogue.handle_turn("send resume", &[]).await, answer);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn genuine_answer_is_returned_trimmed() {
        let gateway = ScriptedGateway::text("  I mostly write Rust and Python these days.  \n");
        let (registry, details, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway.clone(), registry);

        let reply = dialogue.handle_turn("What languages do you use?", &[]).await;

        assert_eq!(reply, "I mostly write Rust and Python these days.");
        assert_eq!(details.call_count(), 0);
        assert_eq!(unknown.call_count(), 0);
        let prompt = gateway.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("You are acting as Ada Example."));
        assert!(prompt.ends_with("\nWhat languages do you use?"));
    }

    #[tokio::test]
    async fn structured_tool_call_wins_and_is_hidden() {
        let gateway = ScriptedGateway::text(
            "Lovely, I'll be in touch soon. {\"tool\": \"record_user_details\", \"args\": {\"email\": \"a@b.com\", \"name\": \"Sam\"}}",
        );
        let (registry, details, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway, registry);

        let reply = dialogue.handle_turn("My email is a@b.com", &[]).await;

        assert_eq!(reply, "Lovely, I'll be in touch soon.");
        assert_eq!(details.call_count(), 1);
        assert_eq!(details.last_arg("email"), Some(json!("a@b.com")));
        assert_eq!(unknown.call_count(), 0);
    }

    #[tokio::test]
    async fn tool_call_takes_precedence_over_decline_phrases() {
        let gateway = ScriptedGateway::text(
            "That's outside the scope of my work. {\"tool\": \"record_unknown_question\", \"args\": {\"question\": \"chai?\"}}",
        );
        let (registry, _, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway, registry);

        let reply = dialogue.handle_turn("How to make chai?", &[]).await;

        assert_eq!(reply, "That's outside the scope of my work.");
        assert_eq!(unknown.call_count(), 1);
        assert_eq!(unknown.last_arg("question"), Some(json!("chai?")));
    }

    #[derive(Deserialize)]
    struct EmailArgs {
        #[allow(dead_code)]
        email: String,
    }

    /// `record_user_details` that insists on an email, like the real tool.
    struct EmailRequired;

    #[async_trait::async_trait]
    impl AgentTool for EmailRequired {
        fn name(&self) -> &str {
            RECORD_USER_DETAILS
        }

        async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, ToolError> {
            let _: EmailArgs = parse_args(RECORD_USER_DETAILS, args)?;
            Ok(ToolResult::recorded(true))
        }
    }

    #[tokio::test]
    async fn failed_tool_call_is_still_hidden() {
        let gateway = ScriptedGateway::text(
            "Great, I'd love to stay in touch with you! {\"tool\": \"record_user_details\", \"args\": {\"name\": \"Sam\"}}",
        );
        let (registry, _, unknown) = recording_registry();
        let mut registry = Arc::try_unwrap(registry).ok().unwrap();
        registry.register(Arc::new(EmailRequired)).unwrap();
        let dialogue = Dialogue::new(knowledge(false), gateway, Arc::new(registry));

        let reply = dialogue.handle_turn("I'm Sam, let's keep in touch", &[]).await;

        assert_eq!(reply, "Great, I'd love to stay in touch with you!");
        assert_eq!(unknown.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_tool_falls_through_to_classifier() {
        let gateway = ScriptedGateway::text("{\"tool\": \"unknown_tool\", \"args\": {}}");
        let (registry, details, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway, registry);

        let reply = dialogue.handle_turn("Do you like sports?", &[]).await;

        assert_eq!(reply, APOLOGY);
        assert_eq!(details.call_count(), 0);
        assert_eq!(unknown.last_arg("question"), Some(json!("Do you like sports?")));
    }

    #[tokio::test]
    async fn sdk_shaped_candidates_become_apology() {
        let gateway = ScriptedGateway::replying(CompletionResult::Candidates(vec![Candidate::default()]));
        let (registry, _, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway, registry);

        assert_eq!(dialogue.handle_turn("Tell me a joke", &[]).await, APOLOGY);
        assert_eq!(unknown.last_arg("question"), Some(json!("Tell me a joke")));
    }

    #[tokio::test]
    async fn decline_is_shown_but_recorded() {
        let text = "I'm afraid that's outside the scope of my expertise, but ask me about my projects!";
        let gateway = ScriptedGateway::text(text);
        let (registry, _, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway, registry);

        assert_eq!(dialogue.handle_turn("What's the largest planet?", &[]).await, text);
        assert_eq!(unknown.call_count(), 1);
    }

    #[tokio::test]
    async fn gateway_failure_degrades_to_apology() {
        let gateway = ScriptedGateway::failing("connection reset");
        let (registry, _, unknown) = recording_registry();
        let dialogue = Dialogue::new(knowledge(true), gateway, registry);

        assert_eq!(dialogue.handle_turn("What are your skills?", &[]).await, APOLOGY);
        assert_eq!(unknown.call_count(), 1);
    }

    #[test]
    fn history_is_rendered_between_persona_and_message() {
        let gateway = ScriptedGateway::text("unused");
        let (registry, _, _) = recording_registry();
        let dialogue = Dialogue::new(knowledge(false), gateway, registry);
        let history = vec![
            json!({ "role": "user", "content": "Hi" }),
            json!({ "role": "assistant", "content": "Hello! How can I help?" }),
            json!(["Where do you work?", "At Example Corp."]),
            json!(42),
        ];

        let prompt = dialogue.build_prompt("Thanks", &history);

        assert!(prompt.contains(
            "## Conversation so far:\nUser: Hi\nAda Example: Hello! How can I help?\nUser: Where do you work?\nAda Example: At Example Corp.\nThanks"
        ));
    }
}
