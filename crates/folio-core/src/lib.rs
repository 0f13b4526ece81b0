//! folio-core: persona chat core (shared config, knowledge context, completion payloads,
//! tool protocol, answer classifier and the dialogue orchestrator).
//!
//! Network collaborators (completion service, notification channels) are traits here and
//! implemented in `folio-skills`.

mod completion;
mod knowledge;
mod notify;
mod orchestrator;
mod shared;

pub use shared::{ConfigError, CoreConfig, DEFAULT_API_PORT, DEFAULT_LOCAL_UI_PORT};

pub use knowledge::{strip_urls, KnowledgeContext, KnowledgeError, DEFAULT_SUMMARY};

pub use completion::{
    normalize, Candidate, CompletionGateway, CompletionResult, GatewayError, CANDIDATE_FIELDS,
    NO_TEXT_FALLBACK,
};

pub use notify::NotificationSink;

pub use orchestrator::{
    alnum_count, classify, extract_tool_call, looks_like_sdk_payload, matches_implicit_record_phrase,
    parse_args, strip_tool_markup, AgentTool, AnswerClassifier, ClassificationVerdict, Dialogue,
    ToolCall, ToolError, ToolRegistry, ToolResult, ALLOWED_TOOLS, APOLOGY, IMPLICIT_RECORD_PHRASES,
    MIN_ALNUM_CHARS, RECORD_UNKNOWN_QUESTION, RECORD_USER_DETAILS, RESUME_KEYWORDS, RESUME_REPLY,
    SDK_MARKERS,
};
