//! RecordUserDetails: forwards a visitor's contact details to the site owner.

use folio_core::{parse_args, AgentTool, NotificationSink, ToolError, ToolResult, RECORD_USER_DETAILS};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

const NAME_NOT_PROVIDED: &str = "Name not provided";
const NOTES_NOT_PROVIDED: &str = "not provided";

#[derive(Debug, Deserialize)]
struct UserDetailsArgs {
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub struct RecordUserDetails {
    sink: Arc<dyn NotificationSink>,
}

impl RecordUserDetails {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    fn message(args: &UserDetailsArgs) -> String {
        let name = args.name.as_deref().unwrap_or(NAME_NOT_PROVIDED);
        let notes = args.notes.as_deref().unwrap_or(NOTES_NOT_PROVIDED);
        format!("Recording {} with email {} and notes {}", name, args.email, notes)
    }
}

#[async_trait::async_trait]
impl AgentTool for RecordUserDetails {
    fn name(&self) -> &str {
        RECORD_USER_DETAILS
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<ToolResult, ToolError> {
        let args: UserDetailsArgs = parse_args(RECORD_USER_DETAILS, args)?;
        let sent = self.sink.push(&Self::message(&args)).await;
        Ok(ToolResult::recorded(sent))
    }
}
