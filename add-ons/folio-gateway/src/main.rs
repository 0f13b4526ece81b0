//! folio-gateway: HTTP front for the portfolio persona assistant.

mod handlers;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use folio_core::{CompletionGateway, CoreConfig, Dialogue, KnowledgeContext, NotificationSink};
use folio_skills::{recording_tools, ModelRouter, Notifier, NotifierConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[folio-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("[folio-gateway] configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let knowledge = Arc::new(KnowledgeContext::load(
        Path::new(&config.knowledge_dir),
        &config.persona_name,
        &config.resume_file,
    ));

    let notifier = Notifier::new(NotifierConfig::from_core(&config));
    notifier.log_configuration();
    let sink: Arc<dyn NotificationSink> = Arc::new(notifier);

    let tools = match recording_tools(sink) {
        Ok(tools) => Arc::new(tools),
        Err(e) => {
            eprintln!("[folio-gateway] tool registration failed: {}", e);
            std::process::exit(1);
        }
    };

    let model_router = ModelRouter::from_config(&config);
    tracing::info!(target: "folio::gateway", model = %model_router.model(), "Completion model selected");
    let gateway: Arc<dyn CompletionGateway> = Arc::new(model_router);

    let dialogue = Arc::new(Dialogue::new(Arc::clone(&knowledge), gateway, tools));
    let app = build_app(AppState {
        config: Arc::clone(&config),
        knowledge,
        dialogue,
    });

    let addr = config.listen_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("[folio-gateway] cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        target: "folio::gateway",
        local_ui = config.local_ui,
        "{} assistant listening on {}",
        config.persona_name,
        addr
    );
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(target: "folio::gateway", error = %e, "Server stopped");
    }
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let frontend_dir = PathBuf::from(&state.config.frontend_dir);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/chat", post(handlers::chat::chat))
        .route("/resume", get(resume_info))
        .route("/resume/download", get(resume_download))
        .nest_service("/frontend", ServeDir::new(frontend_dir))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) knowledge: Arc<KnowledgeContext>,
    pub(crate) dialogue: Arc<Dialogue>,
}

/// GET /health – liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /resume – whether a résumé can be downloaded.
async fn resume_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    if state.knowledge.resume_available {
        Json(serde_json::json!({
            "available": true,
            "path": state.knowledge.resume_path.display().to_string(),
        }))
    } else {
        Json(serde_json::json!({ "available": false }))
    }
}

/// GET /resume/download – the résumé PDF as an attachment.
async fn resume_download(State(state): State<AppState>) -> Response {
    let path = &state.knowledge.resume_path;
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("resume.pdf")
                .to_string();
            (
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(target: "folio::gateway", path = %path.display(), error = %e, "Resume not available for download");
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Resume not found" })),
            )
                .into_response()
        }
    }
}

/// GET / – the chat front end.
async fn index(State(state): State<AppState>) -> Response {
    let index_file = Path::new(&state.config.frontend_dir).join("index.html");
    match tokio::fs::read_to_string(&index_file).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => Json(serde_json::json!({ "error": "Frontend not found" })).into_response(),
    }
}
