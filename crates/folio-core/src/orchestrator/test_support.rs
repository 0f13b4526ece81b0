//! Fakes shared by the orchestrator tests.

use super::tools::{AgentTool, ToolError, ToolRegistry, ToolResult, RECORD_UNKNOWN_QUESTION, RECORD_USER_DETAILS};
use crate::completion::{CompletionGateway, CompletionResult, GatewayError};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records every invocation so tests can assert on the side effect.
pub(crate) struct RecordingTool {
    name: &'static str,
    pub(crate) calls: Mutex<Vec<Map<String, Value>>>,
}

impl RecordingTool {
    pub(crate) fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn last_arg(&self, key: &str) -> Option<Value> {
        self.calls.lock().unwrap().last().and_then(|args| args.get(key).cloned())
    }
}

#[async_trait::async_trait]
impl AgentTool for RecordingTool {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, ToolError> {
        self.calls.lock().unwrap().push(args);
        Ok(ToolResult::recorded(true))
    }
}

/// Registry with both recording tools; returns (registry, user_details, unknown_question).
pub(crate) fn recording_registry() -> (Arc<ToolRegistry>, Arc<RecordingTool>, Arc<RecordingTool>) {
    let details = RecordingTool::new(RECORD_USER_DETAILS);
    let unknown = RecordingTool::new(RECORD_UNKNOWN_QUESTION);
    let mut registry = ToolRegistry::new();
    registry.register(details.clone()).unwrap();
    registry.register(unknown.clone()).unwrap();
    (Arc::new(registry), details, unknown)
}

/// Gateway returning a canned payload and counting calls.
pub(crate) struct ScriptedGateway {
    reply: Result<CompletionResult, String>,
    calls: AtomicUsize,
    pub(crate) last_prompt: Mutex<Option<String>>,
}

impl ScriptedGateway {
    pub(crate) fn replying(result: CompletionResult) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(result),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub(crate) fn text(text: &str) -> Arc<Self> {
        Self::replying(CompletionResult::Text(text.to_string()))
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<CompletionResult, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone().map_err(GatewayError::Transport)
    }
}
