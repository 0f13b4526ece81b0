//! Notification sink contract: best-effort delivery of an operator alert.

/// Delivers a text message to a human operator. Implementations never fail loudly;
/// `false` means no channel accepted the message.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn push(&self, text: &str) -> bool;
}
