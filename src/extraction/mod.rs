//! Text Extraction
//!
//! Best-effort text extraction from user documents and web pages:
//!
//! - [`document`]: uploaded or bridged files (PDF, DOCX, TXT, CSV)
//! - [`pdf`]: page-level PDF helpers shared by both paths
//! - [`html`]: HTML content stages (main content, article, meta, readability)
//! - [`web`]: URL pipeline with the PDF partial-fetch policy and fallbacks

pub mod document;
pub mod html;
pub mod pdf;
pub mod web;

pub use document::{decode_text, extract_document_text, extract_document_text_blocking, DocumentKind};
pub use web::{WebExtractor, DEFAULT_MAX_CHARS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Error PDF: No se pudo leer ({0})")]
    Pdf(String),

    #[error("Error DOCX: Archivo inválido ({0})")]
    Docx(String),

    #[error("Tipo no procesable: {0}")]
    Unsupported(String),

    #[error("Error de descarga: {0}")]
    Fetch(String),

    #[error("Error interno procesando documento: {0}")]
    Internal(String),
}
