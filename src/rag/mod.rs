//! Document Context (RAG)
//!
//! Builds the document section of the consultation system prompt from the
//! user's indexed documents: ranked full-text hits packed into a token
//! budget, or, when nothing matches, one document picked by file name and
//! fetched through the PHP bridge.

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::db::DatabaseOperations;
use crate::extraction::{extract_document_text, DocumentKind};
use crate::models::{DocumentHit, UserDocument};
use crate::storage::PhpBridgeClient;
use crate::utils::text::{estimate_tokens, keywords, take_words, truncate_chars, words_for_tokens};

/// Characters of a bridged document placed in the prompt.
pub const BRIDGE_CONTEXT_CHARS: usize = 3500;
pub const BRIDGE_TRUNCATION_MARKER: &str = "\n[...Texto truncado...]";
/// Newest active documents considered for the file-name match.
const CANDIDATE_DOCUMENTS: i64 = 10;

fn document_section(name: &str, text: &str) -> String {
    format!("\n\n### Documento: {name} ###\n{text}")
}

/// Greedy fill in rank order. The first hit that does not fit is cut to the
/// remaining budget and ends the context.
pub fn assemble_context(hits: &[DocumentHit], budget_tokens: usize) -> String {
    let mut remaining = budget_tokens;
    let mut context = String::new();

    for hit in hits {
        let text = hit.extracted_text.trim();
        if text.is_empty() {
            continue;
        }
        if remaining == 0 {
            break;
        }

        let cost = estimate_tokens(text);
        if cost <= remaining {
            context.push_str(&document_section(&hit.original_filename, text));
            remaining -= cost;
            continue;
        }

        let words = words_for_tokens(remaining);
        if words > 0 {
            context.push_str(&document_section(&hit.original_filename, &take_words(text, words)));
        }
        debug!(document_id = hit.id, words, "Document truncated to fit context budget");
        break;
    }

    context
}

/// First document whose file name (without extension) shares a keyword
/// with the query.
pub fn select_by_filename<'a>(documents: &'a [UserDocument], query: &str) -> Option<&'a UserDocument> {
    let query_keywords = keywords(query);
    if query_keywords.is_empty() {
        return None;
    }

    documents.iter().find(|doc| {
        let stem = std::path::Path::new(&doc.original_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        !keywords(&stem).is_disjoint(&query_keywords)
    })
}

/// Fetches `document` through the bridge and renders its context section.
pub async fn bridged_document_context(
    bridge: &PhpBridgeClient,
    document: &UserDocument,
    user_id: i32,
) -> Option<String> {
    let ext = document.extension();
    if DocumentKind::from_extension(&ext).is_none() {
        warn!(document_id = document.id, %ext, "Bridged document type not processable");
        return None;
    }

    let bytes = match bridge.fetch_document(document.id, user_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(document_id = document.id, error = %e, "Bridge fetch failed");
            return None;
        }
    };

    match extract_document_text(bytes, ext).await {
        Ok(text) if !text.is_empty() => {
            info!(document_id = document.id, "Context added from bridged document");
            Some(format!(
                "\n\n### Contexto del Documento '{}' ###\n{}",
                document.original_filename,
                truncate_chars(&text, BRIDGE_CONTEXT_CHARS, BRIDGE_TRUNCATION_MARKER)
            ))
        }
        Ok(_) => None,
        Err(e) => {
            warn!(document_id = document.id, error = %e, "Bridged document extraction failed");
            None
        }
    }
}

pub struct DocumentContextProvider<'a> {
    pub pool: &'a PgPool,
    pub bridge: Option<&'a PhpBridgeClient>,
    pub token_budget: usize,
    pub max_documents: i64,
}

impl DocumentContextProvider<'_> {
    /// Document context for a query; `None` when nothing relevant was found
    /// or the lookups failed.
    pub async fn context_for(&self, user_id: i32, tenant_id: i32, query: &str) -> Option<String> {
        match DatabaseOperations::search_documents(self.pool, user_id, tenant_id, query, self.max_documents).await {
            Ok(hits) if !hits.is_empty() => {
                info!(user_id, hits = hits.len(), "Full-text document hits");
                let context = assemble_context(&hits, self.token_budget);
                return (!context.is_empty()).then_some(context);
            }
            Ok(_) => debug!(user_id, "No full-text document hits"),
            Err(e) => warn!(user_id, error = %e, "Document search failed"),
        }

        let bridge = self.bridge?;
        let documents =
            match DatabaseOperations::list_active_documents(self.pool, user_id, tenant_id, CANDIDATE_DOCUMENTS).await {
                Ok(documents) => documents,
                Err(e) => {
                    warn!(user_id, error = %e, "Listing active documents failed");
                    return None;
                }
            };

        let document = select_by_filename(&documents, query)?;
        info!(document_id = document.id, filename = %document.original_filename, "Relevant document by file name");
        bridged_document_context(bridge, document, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: i32, name: &str, text: &str) -> DocumentHit {
        DocumentHit {
            id,
            original_filename: name.to_string(),
            extracted_text: text.to_string(),
            rank: 1.0,
        }
    }

    fn doc(id: i32, name: &str) -> UserDocument {
        UserDocument {
            id,
            original_filename: name.to_string(),
            file_type: None,
            uploaded_at: None,
        }
    }

    #[test]
    fn test_assemble_context_whole_documents_within_budget() {
        // 10 words -> 13 tokens each
        let text = "uno dos tres cuatro cinco seis siete ocho nueve diez";
        let context = assemble_context(&[hit(1, "a.pdf", text), hit(2, "b.pdf", text)], 26);
        assert_eq!(
            context,
            format!("\n\n### Documento: a.pdf ###\n{text}\n\n### Documento: b.pdf ###\n{text}")
        );
    }

    #[test]
    fn test_assemble_context_truncates_first_overflow_and_stops() {
        let text = "uno dos tres cuatro cinco seis siete ocho nueve diez";
        let hits = [hit(1, "a.pdf", text), hit(2, "b.pdf", text), hit(3, "c.pdf", "x")];
        // 13 for a.pdf leaves 7 tokens -> 5 words of b.pdf
        let context = assemble_context(&hits, 20);
        assert!(context.ends_with("### Documento: b.pdf ###\nuno dos tres cuatro cinco"));
        assert!(!context.contains("c.pdf"));
    }

    #[test]
    fn test_assemble_context_skips_empty_hits() {
        let context = assemble_context(&[hit(1, "vacio.pdf", "  "), hit(2, "b.txt", "hola")], 100);
        assert_eq!(context, "\n\n### Documento: b.txt ###\nhola");
        assert_eq!(assemble_context(&[], 100), "");
    }

    #[test]
    fn test_select_by_filename() {
        let docs = [doc(1, "Plan Formacion 2026.pdf"), doc(2, "presupuesto anual.docx")];
        assert_eq!(select_by_filename(&docs, "¿Qué dice el presupuesto?").map(|d| d.id), Some(2));
        assert_eq!(select_by_filename(&docs, "plan de formacion").map(|d| d.id), Some(1));
        // Extension alone must not match
        assert!(select_by_filename(&docs, "docx").is_none());
        assert!(select_by_filename(&docs, "un de la").is_none());
    }

    #[tokio::test]
    async fn test_bridged_document_context_truncates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/serve.php")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("z".repeat(4000))
            .create_async()
            .await;

        let bridge = PhpBridgeClient::new(
            reqwest::Client::new(),
            format!("{}/serve.php", server.url()),
            "secret".to_string(),
        );
        let context = bridged_document_context(&bridge, &doc(7, "notas.txt"), 3).await.unwrap();

        assert!(context.starts_with("\n\n### Contexto del Documento 'notas.txt' ###\n"));
        assert!(context.ends_with(BRIDGE_TRUNCATION_MARKER));
        assert_eq!(context.matches('z').count(), BRIDGE_CONTEXT_CHARS);
    }

    #[tokio::test]
    async fn test_bridged_document_context_skips_unprocessable_types() {
        let bridge = PhpBridgeClient::new(reqwest::Client::new(), "http://127.0.0.1:9".to_string(), "k".to_string());
        assert!(bridged_document_context(&bridge, &doc(1, "foto.png"), 1).await.is_none());
    }
}
