//! API Routes
//!
//! - `POST /consulta` - Consultation with user context and web fallback
//! - `POST /analizar-documento` - HTML report from an uploaded file
//! - `POST /agenteiademo/search-chat` - Web-grounded chat
//! - `POST /generate-image` - Image generation
//! - `POST /documents/process` - Index pending user documents
//! - `GET /health` - Health check

pub mod analysis;
pub mod consulta;
pub mod documents;
pub mod health;
pub mod images;
pub mod search_chat;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(consulta::router(state.clone()))
        .merge(analysis::router(state.clone()))
        .merge(search_chat::router(state.clone()))
        .merge(images::router(state.clone()))
        .merge(documents::router(state.clone()))
        .merge(health::router(state));

    apply_cors(router, &allowed_origins).layer(TraceLayer::new_for_http())
}
