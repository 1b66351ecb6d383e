// Asistente IA - LLM assistant API with web search and document context

pub mod agents;
pub mod config;
pub mod db;
pub mod extraction; // PDF / DOCX / text / HTML text extraction
pub mod indexing;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod prompts;
pub mod rag;
pub mod routes;
pub mod search; // Google CSE and Google News RSS
pub mod storage; // PHP file bridge
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
