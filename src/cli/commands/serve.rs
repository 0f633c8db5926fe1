//! Single-page web UI for asking questions about the episode.

use crate::citations::TimestampLink;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SporError;
use crate::pipeline::Pipeline;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// The page template compiled into the binary.
const PAGE_TEMPLATE: &str = include_str!("../../../assets/index.html");

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
    page: String,
}

/// Run the web UI server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.user_message());
        Output::info("Run 'spor doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    // Build the pipeline up front so the first question does not pay for
    // index construction.
    let spinner = Output::spinner("Preparing the transcript index...");
    let pipeline = match Pipeline::new(settings).await {
        Ok(p) => p,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.user_message());
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    let page = render_page(pipeline.settings());
    let state = Arc::new(AppState { pipeline, page });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(page_handler))
        .route("/ask", post(ask))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Spor");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Fill the page template from the settings.
fn render_page(settings: &Settings) -> String {
    PAGE_TEMPLATE
        .replace("{{title}}", &settings.episode.title)
        .replace("{{primary_color}}", &settings.ui.primary_color)
        .replace("{{default_question}}", &settings.ui.default_question)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    links: Vec<TimestampLink>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn page_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(state.page.clone())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    match state.pipeline.ask(req.question.trim()).await {
        Ok(outcome) => Json(AskResponse {
            answer: outcome.answer,
            links: outcome.links,
        })
        .into_response(),
        Err(e) => {
            let status = match &e {
                SporError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                SporError::Credentials(_) | SporError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ErrorResponse {
                    error: e.user_message(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_template_placeholders_are_filled() {
        let mut settings = Settings::default();
        settings.episode.title = "Test Show".to_string();
        settings.ui.primary_color = "#ff00ff".to_string();

        let page = render_page(&settings);
        assert!(page.contains("Test Show"));
        assert!(page.contains("#ff00ff"));
        assert!(!page.contains("{{"));
    }
}
