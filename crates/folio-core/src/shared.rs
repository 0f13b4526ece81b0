//! Shared configuration used across the folio crates.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Port used by the API server when no `PORT` is given.
pub const DEFAULT_API_PORT: u16 = 8000;
/// Port used by the local UI mode when no `PORT` is given.
pub const DEFAULT_LOCAL_UI_PORT: u16 = 7860;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config load failed: {0}")]
    Load(#[from] config::ConfigError),
    #[error("{0} is not set or empty in this environment")]
    MissingCredential(&'static str),
}

/// Global application configuration (gateway + persona + notification channels).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Name the assistant speaks as.
    pub persona_name: String,
    /// Local UI listen port (`PORT`). Ignored in API mode (see [`CoreConfig::listen_addr`]).
    #[serde(default)]
    pub port: Option<u16>,
    /// Alternate local UI mode: binds the `PORT` / 7860 address instead of the API port.
    #[serde(default)]
    pub local_ui: bool,
    /// Directory holding `summary.txt`, the LinkedIn export and the résumé PDF.
    pub knowledge_dir: String,
    /// File name of the résumé inside `knowledge_dir`.
    pub resume_file: String,
    /// Directory of the static front end (`index.html`).
    pub frontend_dir: String,

    /// Completion API credential. Required.
    #[serde(default)]
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,

    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    pub telegram_api_base: String,
    #[serde(default)]
    pub pushover_token: Option<String>,
    #[serde(default)]
    pub pushover_user: Option<String>,
    pub pushover_api_url: String,
}

impl CoreConfig {
    /// Load config from file and environment.
    /// Precedence: well-known env vars (`GEMINI_API_KEY`, `PORT`, ...) > `FOLIO__*` env >
    /// file at `FOLIO_CONFIG` (default `config/folio[.toml]`) > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("FOLIO_CONFIG").unwrap_or_else(|_| "config/folio".to_string());
        let builder = config::Config::builder()
            .set_default("persona_name", "Priyanshu Sharma")?
            .set_default("local_ui", false)?
            .set_default("knowledge_dir", "me")?
            .set_default("resume_file", "resume.pdf")?
            .set_default("frontend_dir", "frontend")?
            .set_default("gemini_model", "gemini-2.5-flash")?
            .set_default("gemini_api_base", "https://generativelanguage.googleapis.com/v1beta")?
            .set_default("telegram_api_base", "https://api.telegram.org")?
            .set_default("pushover_api_url", "https://api.pushover.net/1/messages.json")?;

        let built = builder
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .set_override_option("gemini_api_key", env_non_empty("GEMINI_API_KEY"))?
            .set_override_option("gemini_model", env_non_empty("GEMINI_MODEL"))?
            .set_override_option("telegram_bot_token", env_non_empty("TELEGRAM_BOT_TOKEN"))?
            .set_override_option("telegram_chat_id", env_non_empty("TELEGRAM_CHAT_ID"))?
            .set_override_option("pushover_token", env_non_empty("PUSHOVER_TOKEN"))?
            .set_override_option("pushover_user", env_non_empty("PUSHOVER_USER"))?
            .set_override_option("local_ui", env_non_empty("LOCAL_UI"))?
            .set_override_option("port", env_non_empty("PORT"))?
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Fails when the completion credential is missing; the gateway must not serve traffic then.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("GEMINI_API_KEY"));
        }
        Ok(())
    }

    /// API mode always binds 8000; `port` only applies in local UI mode.
    pub fn listen_addr(&self) -> SocketAddr {
        let port = if self.local_ui {
            self.port.unwrap_or(DEFAULT_LOCAL_UI_PORT)
        } else {
            DEFAULT_API_PORT
        };
        SocketAddr::from(([0, 0, 0, 0], port))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> CoreConfig {
    CoreConfig {
        persona_name: "Test Persona".to_string(),
        port: None,
        local_ui: false,
        knowledge_dir: "me".to_string(),
        resume_file: "resume.pdf".to_string(),
        frontend_dir: "frontend".to_string(),
        gemini_api_key: "test-key".to_string(),
        gemini_model: "gemini-2.5-flash".to_string(),
        gemini_api_base: "http://127.0.0.1:9".to_string(),
        telegram_bot_token: None,
        telegram_chat_id: None,
        telegram_api_base: "http://127.0.0.1:9".to_string(),
        pushover_token: None,
        pushover_user: None,
        pushover_api_url: "http://127.0.0.1:9".to_string(),
    }
}
