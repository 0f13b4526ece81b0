//! RecordUnknownQuestion: flags a question the assistant could not answer.

use folio_core::{parse_args, AgentTool, NotificationSink, ToolError, ToolResult, RECORD_UNKNOWN_QUESTION};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct UnknownQuestionArgs {
    question: String,
}

pub struct RecordUnknownQuestion {
    sink: Arc<dyn NotificationSink>,
}

impl RecordUnknownQuestion {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait::async_trait]
impl AgentTool for RecordUnknownQuestion {
    fn name(&self) -> &str {
        RECORD_UNKNOWN_QUESTION
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, ToolError> {
        let args: UnknownQuestionArgs = parse_args(RECORD_UNKNOWN_QUESTION, args)?;
        let sent = self
            .sink
            .push(&format!("Recording unknown question: {}", args.question))
            .await;
        Ok(ToolResult::recorded(sent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CapturingSink;
    use serde_json::json;

    #[tokio::test]
    async fn pushes_the_question() {
        let sink = CapturingSink::accepting();
        let tool = RecordUnknownQuestion::new(sink.clone());
        let Value::Object(args) = json!({ "question": "How do I make biryani?" }) else {
            unreachable!()
        };

        let result = tool.execute(args).await.unwrap();

        assert_eq!(result, ToolResult::recorded(true));
        assert_eq!(sink.messages(), vec!["Recording unknown question: How do I make biryani?"]);
    }

    #[tokio::test]
    async fn question_is_required() {
        let tool = RecordUnknownQuestion::new(CapturingSink::accepting());
        assert!(matches!(
            tool.execute(Map::new()).await,
            Err(ToolError::InvalidArgs { .. })
        ));
    }
}
