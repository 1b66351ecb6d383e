use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;
use validator::Validate;

use crate::agents::SearchChatAgent;
use crate::extraction::WebExtractor;
use crate::models::{AppState, SearchChatRequest, SearchChatResponse};
use crate::search::{GoogleSearchClient, NewsRssClient};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/agenteiademo/search-chat", post(search_chat))
        .with_state(state)
}

async fn search_chat(
    State(state): State<AppState>,
    Json(request): Json<SearchChatRequest>,
) -> AppResult<Json<SearchChatResponse>> {
    request.validate()?;
    let llm = state.llm()?;
    info!(num_results = request.num_results, debug = request.debug, "Search chat request");

    let google = GoogleSearchClient::from_config(state.http.clone(), &state.config.search);
    let news = NewsRssClient::new(state.http.clone(), state.config.search.news_rss_url.clone());
    let extractor = WebExtractor::new(state.http.clone());

    let agent = SearchChatAgent {
        llm: llm.as_ref(),
        model: &state.config.llm.default_model,
        google: google.as_ref(),
        news: &news,
        extractor: &extractor,
        extraction_timeout: Duration::from_secs(state.config.assistant.extraction_timeout_secs),
    };
    let outcome = agent.run(&request.message, request.num_results).await?;

    let context_blocks = (request.debug && !outcome.context_blocks.is_empty()).then_some(outcome.context_blocks);
    Ok(Json(SearchChatResponse {
        response: outcome.answer,
        context_blocks,
    }))
}
