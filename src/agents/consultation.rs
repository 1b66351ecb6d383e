//! Consultation Flow
//!
//! Answers a free-text question as the organization's assistant. The first
//! answer is kept unless a web search is forced or the model admits it lacks
//! the information, in which case Google results are fed into a second call.

use tracing::{info, warn};

use crate::agents::context::UserContext;
use crate::llm::LLMAdapter;
use crate::prompts::{
    consultation_base_prompt, needs_web_search, web_context_prompt, Specialization, SystemPromptBuilder,
};
use crate::search::google::SEARCH_UNAVAILABLE_HTML;
use crate::search::{GoogleSearchClient, WebResults};
use crate::types::{AppResult, LLMMessage, LLMRequest};

const TEMPERATURE: f32 = 0.5;
const MAX_TOKENS: u32 = 1500;

pub struct ConsultationAgent<'a> {
    pub llm: &'a dyn LLMAdapter,
    pub search: Option<&'a GoogleSearchClient>,
    pub model: &'a str,
    pub org_name: &'a str,
}

impl ConsultationAgent<'_> {
    pub fn system_prompt(&self, specialization: Specialization, context: &UserContext) -> String {
        SystemPromptBuilder::new(consultation_base_prompt(self.org_name), specialization)
            .user_instructions(context.custom_prompt.clone())
            .user_memory(context.memory_text())
            .document_context(context.document_context.clone())
            .build()
    }

    async fn complete(&self, system_prompt: &str, user_content: String) -> AppResult<String> {
        let request = LLMRequest {
            model: self.model.to_string(),
            messages: vec![LLMMessage::system(system_prompt), LLMMessage::user(user_content)],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
        };
        Ok(self.llm.create_chat_completion(&request).await?.content)
    }

    async fn web_results(&self, query: &str) -> WebResults {
        match self.search {
            Some(client) => client.results_html(query).await,
            None => WebResults::Html(SEARCH_UNAVAILABLE_HTML.to_string()),
        }
    }

    pub async fn answer(
        &self,
        message: &str,
        specialization: Specialization,
        force_web_search: bool,
        context: &UserContext,
    ) -> AppResult<String> {
        let system_prompt = self.system_prompt(specialization, context);

        info!(?specialization, force_web_search, "Consultation call 1");
        let first = self.complete(&system_prompt, message.to_string()).await?;

        let search = force_web_search || needs_web_search(&first);
        if !search {
            return Ok(first);
        }
        if !force_web_search {
            info!("Answer lacks information, activating web search");
        }

        match self.web_results(message).await {
            WebResults::Html(results) => {
                info!("Consultation call 2 with web context");
                self.complete(&system_prompt, web_context_prompt(message, &results)).await
            }
            WebResults::Failed(notice) => {
                warn!("Web search failed, returning first answer with notice");
                Ok(format!("{first}\n{notice}"))
            }
        }
    }
}
