// Document text extraction for uploaded and bridged files

use std::io::Cursor;

use docx_rust::document::{BodyContent, Paragraph, ParagraphContent, RunContent};
use docx_rust::DocxFile;
use tracing::debug;

use super::{pdf, ExtractError};

/// Supported text-bearing document families, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
    Csv,
}

impl DocumentKind {
    /// Legacy `.doc` files go through the DOCX reader and fail there if they
    /// are really binary Word documents.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Docx),
            "txt" => Some(Self::PlainText),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Extracts text from a document. CPU-bound; prefer
/// [`extract_document_text`] from async code.
pub fn extract_document_text_blocking(bytes: &[u8], ext: &str) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_extension(ext)
        .ok_or_else(|| ExtractError::Unsupported(ext.to_string()))?;

    let text = match kind {
        DocumentKind::Pdf => pdf_text(bytes)?,
        DocumentKind::Docx => docx_text(bytes)?,
        DocumentKind::PlainText | DocumentKind::Csv => decode_text(bytes),
    };

    debug!(?kind, chars = text.chars().count(), "Document text extracted");
    Ok(text.trim().to_string())
}

pub async fn extract_document_text(bytes: Vec<u8>, ext: String) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_document_text_blocking(&bytes, &ext))
        .await
        .map_err(|e| ExtractError::Internal(e.to_string()))?
}

fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = pdf::load(bytes)?;
    let pages = pdf::page_texts(&doc);
    Ok(pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Paragraph texts of the document body, one line per non-empty paragraph.
/// Tabs and breaks inside a paragraph are kept as `\t` and `\n`.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let file = DocxFile::from_reader(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let docx = file.parse().map_err(|e| ExtractError::Docx(e.to_string()))?;

    let paragraphs: Vec<String> = docx
        .document
        .body
        .content
        .iter()
        .filter_map(|content| match content {
            BodyContent::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .filter(|p| !p.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph<'_>) -> String {
    let mut text = String::new();
    for content in &paragraph.content {
        if let ParagraphContent::Run(run) = content {
            for part in &run.content {
                match part {
                    RunContent::Text(t) => text.push_str(&t.text),
                    RunContent::Tab(_) => text.push('\t'),
                    RunContent::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// Decodes plain text: BOM-marked UTF-8/UTF-16 first, then UTF-8, then Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16_lossy(&units)
}
