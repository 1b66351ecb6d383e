use sqlx::PgPool;
use crate::models::{DocumentHit, UserDocument};
use anyhow::Result;

/// Text search configuration used for both the FTS trigger and the queries.
pub const FTS_CONFIG: &str = "spanish";

const MEMORY_LIMIT: i64 = 20;

pub struct DatabaseOperations;

impl DatabaseOperations {
    // User settings
    pub async fn get_custom_prompt(pool: &PgPool, user_id: i32) -> Result<Option<String>> {
        let prompt = sqlx::query_scalar::<_, Option<String>>(
            "SELECT custom_prompt FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(prompt
            .flatten()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()))
    }

    /// Most recent memory entries first.
    pub async fn get_user_memory(pool: &PgPool, user_id: i32, tenant_id: i32) -> Result<Vec<String>> {
        let entries = sqlx::query_scalar::<_, String>(
            r#"
            SELECT content FROM user_memories
            WHERE user_id = $1 AND tenant_id = $2
            ORDER BY updated_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(MEMORY_LIMIT)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    // Document operations
    pub async fn search_documents(
        pool: &PgPool,
        user_id: i32,
        tenant_id: i32,
        query: &str,
        limit: i64,
    ) -> Result<Vec<DocumentHit>> {
        let hits = sqlx::query_as::<_, DocumentHit>(
            r#"
            SELECT id, original_filename,
                   COALESCE(extracted_text, '') AS extracted_text,
                   ts_rank(search_vector, plainto_tsquery($1::regconfig, $2)) AS rank
            FROM user_documents
            WHERE user_id = $3
              AND tenant_id = $4
              AND is_active_for_ai = TRUE
              AND processed = TRUE
              AND search_vector @@ plainto_tsquery($1::regconfig, $2)
            ORDER BY rank DESC
            LIMIT $5
            "#,
        )
        .bind(FTS_CONFIG)
        .bind(query)
        .bind(user_id)
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(hits)
    }

    pub async fn list_active_documents(
        pool: &PgPool,
        user_id: i32,
        tenant_id: i32,
        limit: i64,
    ) -> Result<Vec<UserDocument>> {
        let docs = sqlx::query_as::<_, UserDocument>(
            r#"
            SELECT id, original_filename, file_type, uploaded_at
            FROM user_documents
            WHERE user_id = $1 AND tenant_id = $2 AND is_active_for_ai = TRUE
            ORDER BY uploaded_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(docs)
    }

    /// Documents never processed and not previously failed.
    pub async fn list_unprocessed_documents(
        pool: &PgPool,
        user_id: i32,
        tenant_id: i32,
        limit: i64,
    ) -> Result<Vec<UserDocument>> {
        let docs = sqlx::query_as::<_, UserDocument>(
            r#"
            SELECT id, original_filename, file_type, uploaded_at
            FROM user_documents
            WHERE user_id = $1 AND tenant_id = $2
              AND processed = FALSE
              AND processing_error IS NULL
            ORDER BY uploaded_at ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(docs)
    }

    /// Stores the extracted text; the FTS trigger owned by the schema
    /// refreshes `search_vector` from it.
    pub async fn mark_document_processed(pool: &PgPool, document_id: i32, extracted_text: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_documents
            SET extracted_text = $2, processed = TRUE, processing_error = NULL, processed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .bind(extracted_text)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn mark_document_failed(pool: &PgPool, document_id: i32, reason: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_documents
            SET processing_error = $2, processed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .bind(reason)
        .execute(pool)
        .await?;

        Ok(())
    }
}
