//! Concrete collaborators for the dialogue: the Gemini model router, the operator
//! notifier and the two recording tools.

pub use folio_core::{AgentTool, ToolRegistry};

mod model_router;
mod notify;
mod record_unknown_question;
mod record_user_details;

pub use model_router::ModelRouter;
pub use notify::{Notifier, NotifierConfig};
pub use record_unknown_question::RecordUnknownQuestion;
pub use record_user_details::RecordUserDetails;

use folio_core::{NotificationSink, ToolError};
use std::sync::Arc;

/// Registry holding both recording tools, each pushing through `sink`.
pub fn recording_tools(sink: Arc<dyn NotificationSink>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RecordUserDetails::new(Arc::clone(&sink))))?;
    registry.register(Arc::new(RecordUnknownQuestion::new(sink)))?;
    Ok(registry)
}
