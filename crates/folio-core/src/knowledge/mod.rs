//! Persona knowledge context: the fixed biography that grounds every prompt.
//!
//! | Source          | File (inside the knowledge dir)          | Failure behavior                    |
//! |-----------------|------------------------------------------|-------------------------------------|
//! | Résumé          | `resume.pdf` (configurable)              | existence check only                |
//! | Profile         | `linkedin.txt`, else `linkedin.pdf`      | empty profile, warning              |
//! | Summary         | `summary.txt`                            | "No summary available.", warning    |
//!
//! The context is built once at startup and shared read-only (`Arc`) by every turn.

mod loader;

pub use loader::{strip_urls, KnowledgeError};

use std::path::PathBuf;

/// Summary used when `summary.txt` is missing or unreadable.
pub const DEFAULT_SUMMARY: &str = "No summary available.";

/// Immutable persona material loaded at process start.
#[derive(Debug, Clone)]
pub struct KnowledgeContext {
    pub persona_name: String,
    pub summary: String,
    /// Profile text with URLs removed.
    pub profile_text: String,
    pub resume_available: bool,
    pub resume_path: PathBuf,
}

impl KnowledgeContext {
    /// Persona system prompt: role, tool contract, e-mail steering and the biography.
    pub fn system_prompt(&self) -> String {
        let name = &self.persona_name;
        let mut prompt = format!(
            "You are acting as {name}. You are answering questions on {name}'s website, \
particularly questions related to {name}'s career, background, skills and experience. \
Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
You are given a summary of {name}'s background and LinkedIn profile which you can use to answer questions. \
Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
If you don't know the answer to any question, use your record_unknown_question tool to record the question that you couldn't answer, \
even if it's about something trivial or unrelated to career. \
If the user is engaging in discussion, try to steer them towards getting in touch via email; \
ask for their email and record it using your record_user_details tool."
        );

        prompt.push_str(
            "\n\n## Tools:\n\
To use a tool, include exactly one JSON object in your reply, on its own, in this form:\n\
{\"tool\": \"<name>\", \"args\": {...}}\n\
- record_user_details: args {\"email\": string (required), \"name\": string, \"notes\": string}\n\
- record_unknown_question: args {\"question\": string (required)}\n\
The JSON is removed before the visitor sees your reply, so also write a short friendly sentence.",
        );

        prompt.push_str(&format!(
            "\n\n## Summary:\n{}\n\n## LinkedIn Profile:\n{}\n\n",
            self.summary, self.profile_text
        ));

        if self.resume_available {
            prompt.push_str(
                "**IMPORTANT: You have a resume PDF available.**\n\
When someone asks for your resume, CV, or professional profile, tell them it can be \
downloaded with the download button in the chat header.\n\n",
            );
        }

        prompt.push_str(&format!(
            "With this context, please chat with the user, always staying in character as {name}."
        ));
        prompt
    }
}
