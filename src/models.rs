use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::config::Config;
use crate::llm::LLMAdapter;
use crate::types::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    /// `None` when the database is not configured.
    pub pool: Option<PgPool>,
    pub config: Config,
    /// `None` when no OpenAI key is configured.
    pub llm: Option<Arc<dyn LLMAdapter>>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn llm(&self) -> AppResult<Arc<dyn LLMAdapter>> {
        self.llm
            .clone()
            .ok_or_else(|| AppError::ServiceUnavailable("Servicio IA no configurado.".to_string()))
    }
}

// Database rows
// Note: FromRow is needed for runtime query_as (without DATABASE_URL at compile time)

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDocument {
    pub id: i32,
    pub original_filename: String,
    pub file_type: Option<String>,
    pub uploaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl UserDocument {
    /// Lowercased extension of the original file name, without the dot.
    pub fn extension(&self) -> String {
        file_extension(&self.original_filename)
    }
}

/// Ranked full-text search hit over a processed document.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentHit {
    pub id: i32,
    pub original_filename: String,
    pub extracted_text: String,
    pub rank: f32,
}

pub fn file_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

// API Request/Response types
// Field names on the wire are those the existing web clients send.

#[derive(Debug, Deserialize)]
pub struct ConsultaRequest {
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "especializacion", default = "default_specialization")]
    pub specialization: String,
    #[serde(rename = "buscar_web", default)]
    pub force_web_search: bool,
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub tenant_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsultaResponse {
    #[serde(rename = "respuesta")]
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(rename = "informe")]
    pub report: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchChatRequest {
    pub message: String,
    #[serde(default = "default_num_results")]
    #[validate(range(min = 1, max = 5))]
    pub num_results: usize,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_blocks: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImageRequest {
    #[validate(length(min = 1))]
    pub prompt: String,
    #[serde(default = "default_image_count")]
    #[validate(range(min = 1, max = 10))]
    pub n: u32,
    #[serde(default = "default_image_size")]
    pub size: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProcessDocumentsRequest {
    pub user_id: i32,
    #[serde(default)]
    pub tenant_id: Option<i32>,
    #[serde(default = "default_process_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessDocumentsResponse {
    pub processed: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}

fn default_specialization() -> String {
    "general".to_string()
}

fn default_num_results() -> usize {
    2
}

fn default_image_count() -> u32 {
    1
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_process_limit() -> i64 {
    10
}
