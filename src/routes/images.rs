use axum::{extract::State, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::models::{AppState, ImageRequest, ImageResponse};
use crate::types::{AppError, AppResult, ImageGenerationRequest};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate-image", post(generate_image))
        .with_state(state)
}

async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    request.validate()?;
    let llm = state.llm.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("Servicio de generación de imágenes no disponible.".to_string())
    })?;
    info!(n = request.n, size = %request.size, "Image generation request");

    let images = llm
        .generate_images(&ImageGenerationRequest {
            prompt: request.prompt,
            n: request.n,
            size: request.size,
        })
        .await
        .map_err(|e| match e {
            AppError::LLMApi(message) => AppError::Upstream(format!("Error generando imagen: {message}")),
            other => other,
        })?;

    Ok(Json(ImageResponse { images }))
}
