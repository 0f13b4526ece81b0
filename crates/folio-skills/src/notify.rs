//! Operator notifications: Telegram bot (primary) with Pushover as the fallback channel.

use folio_core::{CoreConfig, NotificationSink};
use serde_json::json;
use std::time::Duration;

/// Per-request timeout for both channels.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on response bodies copied into logs.
const LOGGED_BODY_CHARS: usize = 500;

/// Channel credentials and endpoints. A channel counts as configured only when both of
/// its credentials are present and non-empty.
#[derive(Debug, Clone, Default)]
pub struct NotifierConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_base: String,
    pub pushover_token: Option<String>,
    pub pushover_user: Option<String>,
    pub pushover_api_url: String,
}

impl NotifierConfig {
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            telegram_bot_token: config.telegram_bot_token.clone(),
            telegram_chat_id: config.telegram_chat_id.clone(),
            telegram_api_base: config.telegram_api_base.clone(),
            pushover_token: config.pushover_token.clone(),
            pushover_user: config.pushover_user.clone(),
            pushover_api_url: config.pushover_api_url.clone(),
        }
    }

    fn telegram(&self) -> Option<(&str, &str)> {
        Some((
            non_empty(&self.telegram_bot_token)?,
            non_empty(&self.telegram_chat_id)?,
        ))
    }

    fn pushover(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.pushover_token)?, non_empty(&self.pushover_user)?))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "<masked>".to_string()
    }
}

fn truncated(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}

/// Best-effort notifier. `push` never fails; it reports whether any channel accepted.
pub struct Notifier {
    client: reqwest::Client,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(config: NotifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "folio::notify", error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client, config }
    }

    /// Logs which channels are configured. Called once at startup.
    pub fn log_configuration(&self) {
        match self.config.telegram() {
            Some((token, chat_id)) => tracing::info!(
                target: "folio::notify",
                bot_token = %mask(token),
                chat_id = %chat_id,
                "Telegram configured"
            ),
            None => tracing::warn!(target: "folio::notify", "Telegram NOT configured"),
        }
        if self.config.pushover().is_some() {
            tracing::info!(target: "folio::notify", "Pushover configured (fallback)");
        } else {
            tracing::warn!(target: "folio::notify", "Pushover NOT configured");
        }
    }

    /// JSON first, one form-encoded retry on a non-200 answer. Transport errors skip the retry.
    async fn send_telegram(&self, token: &str, chat_id: &str, text: &str) -> bool {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.telegram_api_base.trim_end_matches('/'),
            token
        );
        tracing::info!(target: "folio::notify", chat_id = %chat_id, "Attempting Telegram send");

        match self
            .client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
        {
            Ok(r) if r.status() == reqwest::StatusCode::OK => {
                tracing::info!(target: "folio::notify", "Telegram sent");
                return true;
            }
            Ok(r) => {
                let status = r.status().as_u16();
                let body = r.text().await.unwrap_or_default();
                tracing::error!(
                    target: "folio::notify",
                    status,
                    response = %truncated(&body),
                    "Telegram API error, retrying form-encoded"
                );
            }
            Err(e) => {
                tracing::error!(target: "folio::notify", error = %e, "Telegram request failed");
                return false;
            }
        }

        match self
            .client
            .post(&url)
            .form(&[("chat_id", chat_id), ("text", text)])
            .send()
            .await
        {
            Ok(r) if r.status() == reqwest::StatusCode::OK => {
                tracing::info!(target: "folio::notify", "Telegram sent (form-encoded)");
                true
            }
            Ok(r) => {
                let status = r.status().as_u16();
                let body = r.text().await.unwrap_or_default();
                tracing::error!(
                    target: "folio::notify",
                    status,
                    response = %truncated(&body),
                    "Telegram form-encoded send also failed"
                );
                false
            }
            Err(e) => {
                tracing::error!(target: "folio::notify", error = %e, "Telegram form-encoded request failed");
                false
            }
        }
    }

    async fn send_pushover(&self, token: &str, user: &str, text: &str) -> bool {
        tracing::info!(
            target: "folio::notify",
            token = %mask(token),
            user = %user,
            "Attempting Pushover send"
        );
        let result = self
            .client
            .post(&self.config.pushover_api_url)
            .json(&json!({ "token": token, "user": user, "message": text }))
            .send()
            .await;
        match result {
            Ok(r) => {
                let status = r.status();
                let body = r.text().await.unwrap_or_default();
                if status == reqwest::StatusCode::OK {
                    tracing::info!(target: "folio::notify", response = %truncated(&body), "Pushover sent");
                    true
                } else {
                    tracing::error!(
                        target: "folio::notify",
                        status = status.as_u16(),
                        response = %truncated(&body),
                        "Pushover API error"
                    );
                    false
                }
            }
            Err(e) => {
                tracing::error!(target: "folio::notify", error = %e, "Pushover request failed");
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl NotificationSink for Notifier {
    async fn push(&self, text: &str) -> bool {
        if let Some((token, chat_id)) = self.config.telegram() {
            if self.send_telegram(token, chat_id, text).await {
                return true;
            }
            tracing::warn!(target: "folio::notify", "Telegram failed, falling back to Pushover");
        }

        match self.config.pushover() {
            Some((token, user)) => self.send_pushover(token, user, text).await,
            None => {
                tracing::warn!(target: "folio::notify", "No notification channel delivered the message");
                false
            }
        }
    }
}
