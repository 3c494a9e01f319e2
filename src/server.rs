use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tokio::task;
use tower_http::trace::TraceLayer;

use crate::{
    config::AppConfig,
    error::ServiceError,
    logger::InteractionLogger,
    model::{GenerationResponse, PromptRequest, SystemStatus, TextGenerator},
    status,
};

pub const FALLBACK_TEXT: &str = "I'm a local AI model, running offline!";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generator: Arc<dyn TextGenerator>,
    pub logger: Arc<InteractionLogger>,
}

pub fn build_router(
    config: Arc<AppConfig>,
    generator: Arc<dyn TextGenerator>,
    logger: Arc<InteractionLogger>,
) -> Router {
    let state = AppState {
        config,
        generator,
        logger,
    };

    Router::new()
        .route("/", get(root))
        .route("/generate", post(generate))
        .route("/status", get(get_status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the Local LLM API" }))
}

/// Pipeline failures are recovered here: the caller always gets HTTP 200 with
/// `error=true` and the fallback text. A logging failure, by contrast, does
/// propagate as a server error (see DESIGN.md).
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<GenerationResponse>, ServiceError> {
    let prompt = request.prompt;
    let generator = state.generator.clone();

    let outcome = {
        let prompt = prompt.clone();
        task::spawn_blocking(move || generator.generate(&prompt))
            .await
            .map_err(|err| ServiceError::Pipeline(format!("inference task failed: {err}")))
            .and_then(|result| result)
    };

    let (response, error) = match outcome {
        Ok(text) => (text, false),
        Err(err) => {
            tracing::error!(%err, "generation failed, substituting fallback text");
            (FALLBACK_TEXT.to_string(), true)
        }
    };

    state.logger.append(&prompt, &response)?;

    Ok(Json(GenerationResponse { response, error }))
}

async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let device = state.generator.device_report();
    let model = state.generator.model_report();
    Json(status::collect(&state.config, &device, &model))
}
