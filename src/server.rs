use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::backend::HttpBackend;
use crate::config::AppConfig;
use crate::controller::ChatController;
use crate::transcript::{Role, TranscriptDump};
use crate::ui;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat UI controller owning the transcript.
    pub controller: Arc<ChatController>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

/// Build the widget router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/widget/send", post(send_handler))
        .route("/widget/reset", post(reset_handler))
        .route("/widget/demo", post(demo_handler))
        .route("/widget/messages", get(messages_handler))
        .route("/widget/transcript", get(transcript_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "chat.config.loaded",
        endpoint = %config.chat.endpoint,
        assistant_name = %config.chat.assistant_name,
        "Chat configuration loaded"
    );

    let backend = Arc::new(HttpBackend::new(&config.chat.endpoint));
    let controller = Arc::new(ChatController::new(backend, &config.chat.assistant_name));

    let state = AppState {
        controller: Arc::clone(&controller),
        config: Arc::clone(&config),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(controller))
        .await?;
    Ok(())
}

/// Wait for ctrl-c, then stop any in-flight demo replay before shutdown.
async fn shutdown_signal(controller: Arc<ChatController>) {
    let _ = tokio::signal::ctrl_c().await;
    controller.cancel_demo();
    info!(name: "server.shutdown", "Shutdown requested");
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body for the send route.
#[derive(Debug, Deserialize)]
struct SendForm {
    /// User message content.
    message: String,
}

/// GET / - Widget page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(ui::widget_page(
        &state.config.chat,
        state.controller.greeting(),
    ))
}

/// POST /widget/send - Send a message, return the rendered exchange.
async fn send_handler(
    State(state): State<AppState>,
    Form(form): Form<SendForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let message = form.message.trim().to_string();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message is required.".to_string()));
    }

    let user_bubble = ui::message_bubble(Role::User, &message);

    match state.controller.send(&message).await {
        Ok(outcome) => {
            let reply_bubble = ui::message_bubble(Role::Assistant, outcome.display_text());
            Ok(Html(format!("{user_bubble}{reply_bubble}")))
        }
        Err(e) => {
            tracing::error!(name: "chat.send_failed", error = %e, "Send failed");
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

/// POST /widget/reset - Clear the transcript, return the greeting bubble.
async fn reset_handler(State(state): State<AppState>) -> Html<String> {
    let greeting = state.controller.reset();
    Html(ui::message_bubble(Role::Assistant, greeting))
}

/// POST /widget/demo - Start the scripted replay.
async fn demo_handler(State(state): State<AppState>) -> impl IntoResponse {
    if Arc::clone(&state.controller).run_demo() {
        Html(ui::demo_started_fragment(state.controller.greeting())).into_response()
    } else {
        (StatusCode::CONFLICT, "Demo already running.").into_response()
    }
}

/// GET /widget/messages - Rendered message list (HTMX polling fragment).
///
/// Answers 286 once no demo is running so the client stops polling.
async fn messages_handler(State(state): State<AppState>) -> impl IntoResponse {
    let html = ui::messages_fragment(
        state.controller.greeting(),
        &state.controller.transcript().snapshot(),
    );
    let status = if state.controller.demo_running() {
        StatusCode::OK
    } else {
        stop_polling_status()
    };
    (status, Html(html))
}

/// GET /widget/transcript - JSON dump of the transcript.
async fn transcript_handler(State(state): State<AppState>) -> Json<TranscriptDump> {
    Json(state.controller.transcript().dump())
}

/// GET /health - Liveness probe.
async fn health_handler() -> &'static str {
    "ok"
}

/// HTMX "stop polling" response code.
fn stop_polling_status() -> StatusCode {
    StatusCode::from_u16(286).unwrap()
}
