//! Web Search
//!
//! Result sources for the web-augmented flows:
//! - Google Custom Search (primary, with a news-oriented link filter)
//! - Google News RSS (secondary, best effort)

pub mod google;
pub mod news_rss;

pub use google::{GoogleSearchClient, WebResults};
pub use news_rss::NewsRssClient;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Google CSE: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse search results: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Concatenates both lists, dropping repeated URLs (first occurrence wins)
/// and stopping at `limit`.
pub fn merge_results(primary: Vec<SearchHit>, secondary: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    primary
        .into_iter()
        .chain(secondary)
        .filter(|hit| seen.insert(hit.url.clone()))
        .take(limit)
        .collect()
}
