// Web page text extraction with staged fallbacks

use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::Client;
use tracing::{debug, info, warn};

use super::{html, pdf, ExtractError};
use crate::utils::text::{truncate_chars, ELLIPSIS};

pub const DEFAULT_MAX_CHARS: usize = 5000;

/// PDFs up to this size are downloaded whole; larger ones only in part.
const PDF_FULL_FETCH_LIMIT: u64 = 30_000_000;
const PDF_PARTIAL_RANGE: &str = "bytes=0-2097151";
const PDF_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Stages above this many characters are accepted without trying the next.
const MIN_STAGE_CHARS: usize = 200;
/// Meta descriptions live in the head; only the first this-many chars are parsed.
const META_SCAN_CHARS: usize = 4096;

#[derive(Clone)]
pub struct WebExtractor {
    client: Client,
}

impl WebExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Readable text of `url`, at most `max_chars` characters plus an
    /// ellipsis. Never fails: an empty string means nothing was extracted.
    pub async fn extract_text(&self, url: &str, max_chars: usize) -> String {
        if is_pdf_url(url) {
            match self.extract_pdf(url).await {
                Ok(text) => {
                    info!(url, chars = text.chars().count(), "PDF text extracted");
                    return truncate_chars(&text, max_chars, ELLIPSIS);
                }
                Err(e) => warn!(url, error = %e, "PDF extraction failed, trying HTML stages"),
            }
        }

        let page = match self.fetch_page(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url, error = %e, "Page fetch failed");
                return String::new();
            }
        };

        truncate_chars(&text_from_page(&page), max_chars, ELLIPSIS)
    }

    async fn extract_pdf(&self, url: &str) -> Result<String, ExtractError> {
        let size = self.content_length(url).await;

        let mut request = self.client.get(url).timeout(PDF_TIMEOUT);
        if size > PDF_FULL_FETCH_LIMIT {
            debug!(url, size, "Large PDF, fetching first 2 MiB");
            request = request.header(RANGE, PDF_PARTIAL_RANGE);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExtractError::Fetch(format!("HTTP {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))?;

        tokio::task::spawn_blocking(move || -> Result<String, ExtractError> {
            let doc = pdf::load(&bytes)?;
            let pages = pdf::page_texts(&doc);
            Ok(pdf::select_key_pages(&pages).join("\n\n"))
        })
        .await
        .map_err(|e| ExtractError::Internal(e.to_string()))?
    }

    /// `Content-Length` from a HEAD request; 0 when unknown.
    async fn content_length(&self, url: &str) -> u64 {
        match self.client.head(url).timeout(PDF_TIMEOUT).send().await {
            Ok(response) => response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            Err(e) => {
                debug!(url, error = %e, "HEAD request failed");
                0
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .get(url)
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExtractError::Fetch(format!("HTTP {}", response.status())));
        }
        response
            .text()
            .await
            .map_err(|e| ExtractError::Fetch(e.to_string()))
    }
}

pub fn is_pdf_url(url: &str) -> bool {
    url.split('?')
        .next()
        .unwrap_or_default()
        .to_lowercase()
        .ends_with(".pdf")
}

/// Runs the HTML stages in order: main content, article paragraphs, meta
/// description (from the first 4096 chars), readability summary.
pub fn text_from_page(page: &str) -> String {
    let content = html::main_content_text(page);
    if content.chars().count() > MIN_STAGE_CHARS {
        return content;
    }

    let article = html::article_text(page);
    if article.chars().count() > MIN_STAGE_CHARS {
        return article;
    }

    let head: String = page.chars().take(META_SCAN_CHARS).collect();
    if let Some(description) = html::meta_description(&head) {
        return description;
    }

    html::readability_summary(page)
}
