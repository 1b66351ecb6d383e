use axum::{extract::State, routing::post, Json, Router};
use validator::Validate;

use crate::indexing::DocumentIndexer;
use crate::models::{AppState, ProcessDocumentsRequest, ProcessDocumentsResponse};
use crate::storage::PhpBridgeClient;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/documents/process", post(process_documents))
        .with_state(state)
}

async fn process_documents(
    State(state): State<AppState>,
    Json(request): Json<ProcessDocumentsRequest>,
) -> AppResult<Json<ProcessDocumentsResponse>> {
    request.validate()?;

    let unavailable = || AppError::ServiceUnavailable("Indexado de documentos no disponible.".to_string());
    let pool = state.pool.as_ref().ok_or_else(unavailable)?;
    let bridge = PhpBridgeClient::from_config(state.http.clone(), &state.config.bridge).ok_or_else(unavailable)?;

    let tenant_id = request.tenant_id.unwrap_or(state.config.assistant.default_tenant_id);
    let summary = DocumentIndexer::new(pool, &bridge)
        .process_pending(request.user_id, tenant_id, request.limit)
        .await
        .map_err(|e| AppError::Internal(format!("Error indexando documentos: {e}")))?;

    Ok(Json(summary))
}
