// Per-user prompt context loaded from the database

use tracing::{debug, warn};

use crate::db::DatabaseOperations;
use crate::models::AppState;
use crate::rag::DocumentContextProvider;
use crate::storage::PhpBridgeClient;

/// Optional prompt layers for a known user. Every lookup degrades to
/// "nothing" on failure.
#[derive(Debug, Default, Clone)]
pub struct UserContext {
    pub custom_prompt: Option<String>,
    pub memory: Vec<String>,
    pub document_context: Option<String>,
}

impl UserContext {
    /// Loads all layers; without a user id or a database this is empty.
    pub async fn load(state: &AppState, user_id: Option<i32>, tenant_id: Option<i32>, message: &str) -> Self {
        let (Some(user_id), Some(pool)) = (user_id, state.pool.as_ref()) else {
            return Self::default();
        };
        let tenant_id = tenant_id.unwrap_or(state.config.assistant.default_tenant_id);

        let custom_prompt = load_custom_prompt(state, Some(user_id)).await;

        let memory = DatabaseOperations::get_user_memory(pool, user_id, tenant_id)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id, error = %e, "Loading user memory failed");
                Vec::new()
            });

        let bridge = PhpBridgeClient::from_config(state.http.clone(), &state.config.bridge);
        let provider = DocumentContextProvider {
            pool,
            bridge: bridge.as_ref(),
            token_budget: state.config.assistant.rag_token_budget,
            max_documents: state.config.assistant.rag_max_documents,
        };
        let document_context = provider.context_for(user_id, tenant_id, message).await;

        debug!(
            user_id,
            has_custom_prompt = custom_prompt.is_some(),
            memory_entries = memory.len(),
            has_documents = document_context.is_some(),
            "User context loaded"
        );

        Self {
            custom_prompt,
            memory,
            document_context,
        }
    }

    /// Memory entries as a bullet list, or `None` when there are none.
    pub fn memory_text(&self) -> Option<String> {
        if self.memory.is_empty() {
            return None;
        }
        Some(
            self.memory
                .iter()
                .map(|entry| format!("- {}", entry.trim()))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// The user's custom instructions; `None` without user, database or prompt.
pub async fn load_custom_prompt(state: &AppState, user_id: Option<i32>) -> Option<String> {
    let (Some(user_id), Some(pool)) = (user_id, state.pool.as_ref()) else {
        return None;
    };
    match DatabaseOperations::get_custom_prompt(pool, user_id).await {
        Ok(prompt) => prompt,
        Err(e) => {
            warn!(user_id, error = %e, "Loading custom prompt failed");
            None
        }
    }
}
