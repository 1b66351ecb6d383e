use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::agents::context::load_custom_prompt;
use crate::agents::{AnalysisInput, DocumentAnalysisAgent};
use crate::models::{AnalysisResponse, AppState};
use crate::prompts::Specialization;
use crate::types::{AppError, AppResult};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analizar-documento", post(analizar_documento))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

struct Upload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct AnalysisForm {
    upload: Option<Upload>,
    specialization: Option<String>,
    user_id: Option<i32>,
}

fn parse_optional_id(name: &str, value: &str) -> AppResult<Option<i32>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{name} debe ser un número entero")))
}

async fn read_form(mut multipart: Multipart) -> AppResult<AnalysisForm> {
    let mut form = AnalysisForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| mime_guess::from_path(&filename).first_raw().map(str::to_string))
                    .unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
                form.upload = Some(Upload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "especializacion" | "user_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
                if name == "user_id" {
                    form.user_id = parse_optional_id("user_id", &value)?;
                } else {
                    form.specialization = Some(value);
                }
            }
            // Accepted for compatibility; reports only use the user's prompt
            _ => {}
        }
    }

    Ok(form)
}

async fn analizar_documento(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResponse>> {
    let llm = state.llm()?;
    let form = read_form(multipart).await?;
    let upload = form
        .upload
        .ok_or_else(|| AppError::Validation("Falta el archivo (campo 'file').".to_string()))?;
    let specialization = Specialization::parse(form.specialization.as_deref().unwrap_or("general"));

    info!(
        user_id = ?form.user_id,
        filename = %upload.filename,
        content_type = %upload.content_type,
        ?specialization,
        "Document analysis request"
    );

    let custom_prompt = load_custom_prompt(&state, form.user_id).await;
    let input = AnalysisInput::from_upload(&upload.filename, &upload.content_type, upload.bytes).await?;

    let agent = DocumentAnalysisAgent {
        llm: llm.as_ref(),
        model: &state.config.llm.consult_model,
        org_name: &state.config.assistant.org_name,
    };
    let report = agent.analyze(input, specialization, custom_prompt).await?;

    Ok(Json(AnalysisResponse { report }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_id() {
        assert_eq!(parse_optional_id("user_id", " 42 ").unwrap(), Some(42));
        assert_eq!(parse_optional_id("user_id", "").unwrap(), None);
        assert!(matches!(parse_optional_id("user_id", "abc"), Err(AppError::Validation(_))));
    }
}
