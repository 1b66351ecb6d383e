use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::agents::{ConsultationAgent, UserContext};
use crate::models::{AppState, ConsultaRequest, ConsultaResponse};
use crate::prompts::Specialization;
use crate::search::GoogleSearchClient;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/consulta", post(consultar))
        .with_state(state)
}

async fn consultar(
    State(state): State<AppState>,
    Json(request): Json<ConsultaRequest>,
) -> AppResult<Json<ConsultaResponse>> {
    let llm = state.llm()?;
    let specialization = Specialization::parse(&request.specialization);
    info!(
        user_id = ?request.user_id,
        ?specialization,
        force_web_search = request.force_web_search,
        "Consultation request"
    );

    let context = UserContext::load(&state, request.user_id, request.tenant_id, &request.message).await;
    let google = GoogleSearchClient::from_config(state.http.clone(), &state.config.search);

    let agent = ConsultationAgent {
        llm: llm.as_ref(),
        search: google.as_ref(),
        model: &state.config.llm.consult_model,
        org_name: &state.config.assistant.org_name,
    };
    let answer = agent
        .answer(&request.message, specialization, request.force_web_search, &context)
        .await?;

    Ok(Json(ConsultaResponse { answer }))
}
