// Report generation from an uploaded image or document

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::info;

use crate::extraction::html::body_inner_html;
use crate::extraction::{extract_document_text, DocumentKind};
use crate::llm::LLMAdapter;
use crate::models::file_extension;
use crate::prompts::{analysis_base_prompt, text_report_prompt, Specialization, SystemPromptBuilder, IMAGE_REPORT_PROMPT};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

pub const IMAGE_MIME_TYPES: [&str; 5] = ["image/png", "image/jpeg", "image/jpg", "image/webp", "image/gif"];

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    /// Sent to the vision model for OCR.
    Image { base64: String, media_type: String },
    Text(String),
}

impl AnalysisInput {
    /// Classifies an upload by MIME type (images) or extension (documents).
    pub async fn from_upload(filename: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<Self> {
        if IMAGE_MIME_TYPES.contains(&content_type) {
            info!(filename, content_type, "Processing image upload");
            return Ok(Self::Image {
                base64: STANDARD.encode(&bytes),
                media_type: content_type.to_string(),
            });
        }

        let ext = file_extension(filename);
        if DocumentKind::from_extension(&ext).is_none() {
            let shown = if content_type.is_empty() { ext } else { content_type.to_string() };
            return Err(AppError::UnsupportedMediaType(shown));
        }

        info!(filename, %ext, "Processing document upload");
        let text = extract_document_text(bytes, ext.clone())
            .await
            .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
        if text.is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "No se extrajo texto del archivo {}.",
                ext.to_uppercase()
            )));
        }
        Ok(Self::Text(text))
    }

    fn into_message(self) -> LLMMessage {
        match self {
            Self::Image { base64, media_type } => {
                LLMMessage::user_with_base64_image(IMAGE_REPORT_PROMPT, base64, media_type)
            }
            Self::Text(text) => LLMMessage::user(text_report_prompt(&text)),
        }
    }
}

pub struct DocumentAnalysisAgent<'a> {
    pub llm: &'a dyn LLMAdapter,
    pub model: &'a str,
    pub org_name: &'a str,
}

impl DocumentAnalysisAgent<'_> {
    /// HTML report body for the input.
    pub async fn analyze(
        &self,
        input: AnalysisInput,
        specialization: Specialization,
        custom_prompt: Option<String>,
    ) -> AppResult<String> {
        let system_prompt = SystemPromptBuilder::new(analysis_base_prompt(self.org_name), specialization)
            .user_instructions(custom_prompt)
            .build();

        let request = LLMRequest {
            model: self.model.to_string(),
            messages: vec![LLMMessage::system(system_prompt), input.into_message()],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
        };

        let report = self.llm.create_chat_completion(&request).await?.content;
        info!(report_len = report.len(), "Report generated");
        Ok(body_inner_html(&report))
    }
}
