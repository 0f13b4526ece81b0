//! Tool protocol: the inline `{"tool": ..., "args": {...}}` contract a model may embed in
//! its reply, the allow-listed registry of typed handlers, and markup cleanup.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Range;
use std::sync::{Arc, LazyLock};

pub const RECORD_USER_DETAILS: &str = "record_user_details";
pub const RECORD_UNKNOWN_QUESTION: &str = "record_unknown_question";

/// The only tool names a model reply may invoke.
pub const ALLOWED_TOOLS: [&str; 2] = [RECORD_USER_DETAILS, RECORD_UNKNOWN_QUESTION];

static TOOL_OBJECT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{\s*"tool""#).expect("valid tool object regex"));
static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```json\s*(\{[\s\S]*?\})\s*```").expect("valid json fence regex")
});
static JSON_FENCE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json[\s\S]*?```").expect("valid json fence block regex"));

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool not in allow-list: {0}")]
    NotAllowed(String),
    #[error("unknown tool: {0}")]
    Unknown(String),
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArgs {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A validated tool invocation parsed out of model text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    pub args: Map<String, Value>,
}

/// Outcome of one tool execution; lives for a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub recorded: String,
    pub notification_sent: bool,
}

impl ToolResult {
    pub fn recorded(notification_sent: bool) -> Self {
        Self {
            recorded: "ok".to_string(),
            notification_sent,
        }
    }
}

/// Trait implemented by every tool a model reply can trigger.
#[async_trait::async_trait]
pub trait AgentTool: Send + Sync {
    /// Allow-listed tool name for routing.
    fn name(&self) -> &str;

    /// Executes the tool with the model-supplied arguments.
    async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, ToolError>;
}

/// Deserializes a tool's typed argument struct from the raw `args` mapping.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|source| ToolError::InvalidArgs {
        tool: tool.to_string(),
        source,
    })
}

/// Name → handler mapping. Registration is checked against [`ALLOWED_TOOLS`].
pub struct ToolRegistry {
    tools: Vec<Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn AgentTool>) -> Result<(), ToolError> {
        if !ALLOWED_TOOLS.contains(&tool.name()) {
            return Err(ToolError::NotAllowed(tool.name().to_string()));
        }
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentTool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Returns the names of all registered tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(&call.tool)
            .ok_or_else(|| ToolError::Unknown(call.tool.clone()))?;
        tracing::info!(target: "folio::tools", tool = %call.tool, "Tool called");
        tool.execute(call.args.clone()).await
    }

    /// Records a question the assistant could not answer.
    pub async fn record_unknown_question(&self, question: &str) -> Result<ToolResult, ToolError> {
        let mut args = Map::new();
        args.insert("question".to_string(), Value::String(question.to_string()));
        self.execute(&ToolCall {
            tool: RECORD_UNKNOWN_QUESTION.to_string(),
            args,
        })
        .await
    }

    /// Runs the tool call embedded in `text`, if any. Returns the cleaned reply when a
    /// call fired; `None` when there was no valid call or it failed to execute.
    pub async fn dispatch_embedded(&self, text: &str) -> Option<String> {
        let call = extract_tool_call(text)?;
        match self.execute(&call).await {
            Ok(result) => {
                tracing::info!(
                    target: "folio::tools",
                    tool = %call.tool,
                    notification_sent = result.notification_sent,
                    "Embedded tool call executed"
                );
                Some(strip_tool_markup(text))
            }
            Err(e) => {
                tracing::warn!(target: "folio::tools", tool = %call.tool, error = %e, "Embedded tool call failed");
                None
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the first tool call in `text`: an inline object opening with `"tool"`, else a
/// `json`-fenced block. Unparsable or non-allow-listed calls count as absent.
pub fn extract_tool_call(text: &str) -> Option<ToolCall> {
    let raw = inline_tool_objects(text)
        .into_iter()
        .next()
        .map(|(_, value)| value)
        .or_else(|| fenced_json_object(text))?;
    let call = validate(raw);
    if call.is_none() {
        tracing::debug!(target: "folio::tools", "Ignoring embedded JSON that is not an allowed tool call");
    }
    call
}

/// Removes every `json`-fenced block and every inline tool object, then trims.
pub fn strip_tool_markup(text: &str) -> String {
    let without_fences = JSON_FENCE_BLOCK.replace_all(text, "").into_owned();
    let mut cleaned = String::with_capacity(without_fences.len());
    let mut cursor = 0;
    for (range, _) in inline_tool_objects(&without_fences) {
        cleaned.push_str(&without_fences[cursor..range.start]);
        cursor = range.end;
    }
    cleaned.push_str(&without_fences[cursor..]);
    cleaned.trim().to_string()
}

/// True when `text` carries tool-call markup, valid or not: an inline `{"tool"` opener or
/// a fenced object with a `tool` key.
pub(crate) fn has_tool_markup(text: &str) -> bool {
    TOOL_OBJECT_START.is_match(text)
        || fenced_json_object(text).is_some_and(|v| v.get("tool").is_some())
}

/// Every inline `{"tool" ...}` object that parses as JSON, with its byte range.
/// The object ends at the first closing brace that completes a JSON value.
fn inline_tool_objects(text: &str) -> Vec<(Range<usize>, Value)> {
    let mut found = Vec::new();
    let mut resume_at = 0;
    for m in TOOL_OBJECT_START.find_iter(text) {
        if m.start() < resume_at {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&text[m.start()..]).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            let end = m.start() + stream.byte_offset();
            found.push((m.start()..end, value));
            resume_at = end;
        }
    }
    found
}

fn fenced_json_object(text: &str) -> Option<Value> {
    JSON_FENCE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
}

fn validate(raw: Value) -> Option<ToolCall> {
    let Value::Object(mut object) = raw else {
        return None;
    };
    let tool = object.get("tool")?.as_str()?.to_string();
    if !ALLOWED_TOOLS.contains(&tool.as_str()) {
        return None;
    }
    let args = match object.remove("args") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args,
        Some(_) => return None,
    };
    Some(ToolCall { tool, args })
}
