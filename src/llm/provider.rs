use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, ImageGenerationRequest, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;

    /// Returns the URLs of the generated images.
    async fn generate_images(&self, _request: &ImageGenerationRequest) -> AppResult<Vec<String>> {
        Err(AppError::LLMApi("Image generation not supported by this adapter".to_string()))
    }
}

/// Builds the configured adapter, or `None` when no API key is available.
pub fn adapter_from_config(config: &LLMConfig) -> Option<Arc<dyn LLMAdapter>> {
    if !config.is_configured() {
        return None;
    }
    Some(Arc::new(crate::llm::openai::OpenAIAdapter::new_with_api_base(
        &config.openai_api_key,
        &config.openai_base_url,
    )))
}
