//! Document Indexing
//!
//! Pulls pending user documents through the PHP bridge, extracts their text
//! and stores it on the row. The full-text index itself is maintained by a
//! database trigger on `extracted_text`.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::DatabaseOperations;
use crate::extraction::{extract_document_text, ExtractError};
use crate::models::{ProcessDocumentsResponse, UserDocument};
use crate::storage::{BridgeError, PhpBridgeClient};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("No se pudo extraer texto del documento")]
    EmptyText,
}

/// Where indexing outcomes are written.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn mark_processed(&self, document_id: i32, text: &str) -> anyhow::Result<()>;
    async fn mark_failed(&self, document_id: i32, reason: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl IndexStore for PgPool {
    async fn mark_processed(&self, document_id: i32, text: &str) -> anyhow::Result<()> {
        DatabaseOperations::mark_document_processed(self, document_id, text).await
    }

    async fn mark_failed(&self, document_id: i32, reason: &str) -> anyhow::Result<()> {
        DatabaseOperations::mark_document_failed(self, document_id, reason).await
    }
}

pub struct DocumentIndexer<'a> {
    pool: &'a PgPool,
    bridge: &'a PhpBridgeClient,
}

impl<'a> DocumentIndexer<'a> {
    pub fn new(pool: &'a PgPool, bridge: &'a PhpBridgeClient) -> Self {
        Self { pool, bridge }
    }

    /// Processes up to `limit` pending documents. Per-document failures are
    /// recorded on the row and counted; only the initial listing can fail.
    pub async fn process_pending(
        &self,
        user_id: i32,
        tenant_id: i32,
        limit: i64,
    ) -> anyhow::Result<ProcessDocumentsResponse> {
        let pending = DatabaseOperations::list_unprocessed_documents(self.pool, user_id, tenant_id, limit).await?;
        info!(user_id, tenant_id, pending = pending.len(), "Indexing pending documents");

        let mut summary = ProcessDocumentsResponse::default();
        for document in &pending {
            let outcome = fetch_and_extract(self.bridge, document, user_id).await;
            if record_outcome(self.pool, document.id, outcome).await {
                summary.processed += 1;
            } else {
                summary.failed += 1;
            }
        }

        info!(processed = summary.processed, failed = summary.failed, "Indexing finished");
        Ok(summary)
    }
}

/// Writes one document's outcome and returns whether it was indexed. A
/// failure to store the text is itself recorded as the row's error so the
/// document is not picked up again.
pub async fn record_outcome(store: &dyn IndexStore, document_id: i32, outcome: Result<String, IndexError>) -> bool {
    let reason = match outcome {
        Ok(text) => match store.mark_processed(document_id, &storable_text(&text)).await {
            Ok(()) => return true,
            Err(e) => {
                warn!(document_id, error = %e, "Could not store extracted text");
                format!("Error guardando texto: {e}")
            }
        },
        Err(e) => {
            warn!(document_id, reason = %e, "Document indexing failed");
            e.to_string()
        }
    };

    if let Err(e) = store.mark_failed(document_id, &reason).await {
        warn!(document_id, error = %e, "Could not record indexing failure");
    }
    false
}

/// Postgres text columns reject NUL, which Latin-1 or UTF-16 decoding can produce.
fn storable_text(text: &str) -> String {
    text.replace('\0', "")
}

/// Downloads and extracts one document.
pub async fn fetch_and_extract(
    bridge: &PhpBridgeClient,
    document: &UserDocument,
    user_id: i32,
) -> Result<String, IndexError> {
    let bytes = bridge.fetch_document(document.id, user_id).await?;
    let text = extract_document_text(bytes, document.extension()).await?;
    if text.is_empty() {
        return Err(IndexError::EmptyText);
    }
    Ok(text)
}
