// Google News RSS client; failures degrade to an empty result list

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use super::{SearchError, SearchHit};
use crate::extraction::html::fragment_text;

const RSS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct NewsRssClient {
    client: Client,
    endpoint: String,
}

impl NewsRssClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub async fn search(&self, query: &str, num: usize) -> Vec<SearchHit> {
        match self.fetch(query, num).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query, error = %e, "News RSS lookup failed");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, query: &str, num: usize) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("hl", "es"), ("gl", "ES"), ("ceid", "ES:es")])
            .timeout(RSS_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        let feed = feed_rs::parser::parse(body.as_ref()).map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(feed
            .entries
            .into_iter()
            .take(num)
            .map(|entry| SearchHit {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                url: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
                snippet: entry
                    .summary
                    .map(|s| fragment_text(&s.content))
                    .unwrap_or_default(),
            })
            .collect())
    }
}
