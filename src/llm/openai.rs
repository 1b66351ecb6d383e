// OpenAI adapter over the REST API
// Chat completions (text and vision) and image generation share one client.

use crate::llm::provider::LLMAdapter;
use crate::types::{
    AppError, AppResult, ContentPart, ImageGenerationRequest, LLMMessage, LLMRequest, LLMResponse,
    MessageContent, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAIAdapter {
    client: Client,
    api_key: String,
    api_base: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: OpenAIMessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OpenAIMessageContent {
    Text(String),
    Multimodal(Vec<OpenAIContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum OpenAIContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Serialize)]
struct OpenAIImageUrl {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
struct OpenAIImageRequest<'a> {
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct OpenAIImageResponse {
    data: Vec<OpenAIImageData>,
}

#[derive(Deserialize)]
struct OpenAIImageData {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Deserialize)]
struct OpenAIError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

impl OpenAIAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::new_with_api_base(api_key, OPENAI_API_BASE)
    }

    /// Adapter against any OpenAI-compatible endpoint
    pub fn new_with_api_base(api_key: &str, api_base: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn convert_message(msg: &LLMMessage) -> OpenAIMessage {
        let content = match &msg.content {
            MessageContent::Text(text) => OpenAIMessageContent::Text(text.clone()),
            MessageContent::Multimodal(parts) => OpenAIMessageContent::Multimodal(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => OpenAIContentPart::Text { text: text.clone() },
                        ContentPart::ImageBase64 { base64, media_type, detail } => {
                            OpenAIContentPart::ImageUrl {
                                image_url: OpenAIImageUrl {
                                    url: format!("data:{};base64,{}", media_type, base64),
                                    detail: detail.clone(),
                                },
                            }
                        }
                    })
                    .collect(),
            ),
        };

        OpenAIMessage {
            role: msg.role.clone(),
            content,
        }
    }

    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();

        if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
            return AppError::LLMApi(format!(
                "{} ({}, {})",
                error_response.error.message,
                status,
                error_response.error.error_type.unwrap_or_else(|| "unknown".to_string())
            ));
        }

        AppError::LLMApi(format!("OpenAI API error ({}): {}", status, error_text))
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = format!("{}/chat/completions", self.api_base);

        let body = OpenAIChatRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse OpenAI response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLMApi("OpenAI returned no choices".to_string()))?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            model = %request.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "OpenAI completion received"
        );

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default().trim().to_string(),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }

    async fn generate_images(&self, request: &ImageGenerationRequest) -> AppResult<Vec<String>> {
        let url = format!("{}/images/generations", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&OpenAIImageRequest {
                prompt: &request.prompt,
                n: request.n,
                size: &request.size,
            })
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: OpenAIImageResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse OpenAI response: {}", e)))?;

        Ok(parsed.data.into_iter().filter_map(|d| d.url).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request() -> LLMRequest {
        LLMRequest {
            model: "gpt-4o".to_string(),
            messages: vec![LLMMessage::system("sys"), LLMMessage::user("hola")],
            max_tokens: Some(100),
            temperature: Some(0.5),
        }
    }

    #[test]
    fn test_base64_image_becomes_data_url() {
        let msg = LLMMessage::user_with_base64_image("ocr", "AAAA", "image/png");
        let converted = serde_json::to_value(OpenAIAdapter::convert_message(&msg)).unwrap();
        assert_eq!(converted["content"][0]["type"], "text");
        assert_eq!(converted["content"][1]["type"], "image_url");
        assert_eq!(converted["content"][1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_chat_completion_trims_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({"model": "gpt-4o"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"content":"  <p>Hola</p>\n"},"finish_reason":"stop"}],
                    "usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
            )
            .create_async()
            .await;

        let adapter = OpenAIAdapter::new_with_api_base("test-key", &server.url());
        let response = adapter.create_chat_completion(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "<p>Hola</p>");
        assert_eq!(response.usage.total_tokens, 5);
    }

    #[tokio::test]
    async fn test_chat_completion_surfaces_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#)
            .create_async()
            .await;

        let adapter = OpenAIAdapter::new_with_api_base("test-key", &server.url());
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();

        match err {
            AppError::LLMApi(message) => assert!(message.contains("Rate limit reached")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_images_returns_urls() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/images/generations")
            .with_status(200)
            .with_body(r#"{"data":[{"url":"https://img/1.png"},{"url":"https://img/2.png"}]}"#)
            .create_async()
            .await;

        let adapter = OpenAIAdapter::new_with_api_base("test-key", &server.url());
        let urls = adapter
            .generate_images(&ImageGenerationRequest {
                prompt: "un hotel".to_string(),
                n: 2,
                size: "1024x1024".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(urls, vec!["https://img/1.png", "https://img/2.png"]);
    }
}
