//! Search Chat Flow
//!
//! Web-grounded answers: the question is rewritten as a news query, Google
//! CSE and Google News RSS supply sources, their pages are read concurrently
//! and the answer is generated over the collected context blocks.

use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::extraction::{WebExtractor, DEFAULT_MAX_CHARS};
use crate::llm::LLMAdapter;
use crate::prompts::{seo_refinement_prompt, web_context_system_prompt, SEARCH_CHAT_FALLBACK_PROMPT};
use crate::search::{merge_results, GoogleSearchClient, NewsRssClient, SearchHit};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

pub struct SearchChatAgent<'a> {
    pub llm: &'a dyn LLMAdapter,
    pub model: &'a str,
    pub google: Option<&'a GoogleSearchClient>,
    pub news: &'a NewsRssClient,
    pub extractor: &'a WebExtractor,
    pub extraction_timeout: Duration,
}

#[derive(Debug)]
pub struct SearchChatOutcome {
    pub answer: String,
    /// Empty when no web source was found.
    pub context_blocks: Vec<String>,
}

impl SearchChatAgent<'_> {
    async fn complete(&self, system: String, user: &str) -> AppResult<String> {
        let request = LLMRequest {
            model: self.model.to_string(),
            messages: vec![LLMMessage::system(system), LLMMessage::user(user)],
            max_tokens: None,
            temperature: None,
        };
        Ok(self.llm.create_chat_completion(&request).await?.content)
    }

    /// SEO rewrite of the question, stripped of surrounding quotes.
    pub async fn refine_query(&self, message: &str) -> AppResult<String> {
        let refined = self.complete(seo_refinement_prompt(message), message).await?;
        let refined = refined.trim_matches(&['"', '\'', ' '][..]).to_string();
        info!(%refined, "Refined query");
        Ok(refined)
    }

    async fn sources(&self, query: &str, num_results: usize) -> AppResult<Vec<SearchHit>> {
        let primary = match self.google {
            Some(google) => google
                .search(query, num_results)
                .await
                .map_err(|e| AppError::Upstream(e.to_string()))?,
            None => {
                warn!("Google CSE not configured, using News RSS only");
                Vec::new()
            }
        };
        let secondary = self.news.search(query, num_results).await;
        Ok(merge_results(primary, secondary, num_results))
    }

    /// Page texts for every source; snippets when the extraction deadline passes.
    async fn source_texts(&self, sources: &[SearchHit]) -> Vec<String> {
        let extractions = join_all(
            sources
                .iter()
                .map(|hit| self.extractor.extract_text(&hit.url, DEFAULT_MAX_CHARS)),
        );

        let texts = match tokio::time::timeout(self.extraction_timeout, extractions).await {
            Ok(texts) => texts,
            Err(_) => {
                warn!(timeout = ?self.extraction_timeout, "Extraction timed out, using snippets");
                vec![String::new(); sources.len()]
            }
        };

        texts
            .into_iter()
            .zip(sources)
            .map(|(text, hit)| if text.is_empty() { hit.snippet.clone() } else { text })
            .collect()
    }

    pub async fn run(&self, message: &str, num_results: usize) -> AppResult<SearchChatOutcome> {
        let refined = self.refine_query(message).await?;
        let sources = self.sources(&refined, num_results).await?;

        if sources.is_empty() {
            warn!("No web sources, answering without context");
            let answer = self.complete(SEARCH_CHAT_FALLBACK_PROMPT.to_string(), message).await?;
            return Ok(SearchChatOutcome {
                answer,
                context_blocks: Vec::new(),
            });
        }

        let texts = self.source_texts(&sources).await;
        let context_blocks: Vec<String> = sources
            .iter()
            .zip(texts)
            .enumerate()
            .map(|(i, (hit, text))| context_block(i + 1, hit, &text))
            .collect();

        let answer = self.complete(web_context_system_prompt(&context_blocks), message).await?;
        info!(sources = context_blocks.len(), answer_len = answer.len(), "Search chat answered");
        Ok(SearchChatOutcome { answer, context_blocks })
    }
}

pub fn context_block(index: usize, hit: &SearchHit, text: &str) -> String {
    format!("### Resultado {index}: {}\n\n{text}\n\nURL: {}", hit.title, hit.url)
}
