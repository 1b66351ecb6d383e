// Google Custom Search client

use std::time::Duration;

use chrono::Datelike;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::{SearchError, SearchHit};
use crate::config::SearchConfig;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Results requested by the consultation flow.
const CONSULT_RESULTS: usize = 3;
const NEWS_DOMAINS: [&str; 3] = ["canarias7.es", "rtve.es", "boe.es"];

pub const SEARCH_UNAVAILABLE_HTML: &str = "<p><i>[Búsqueda web no disponible.]</i></p>";
const NO_RESULTS_HTML: &str = "<p><i>[No se encontraron resultados web.]</i></p>";

/// Outcome of the consultation-path search, rendered as HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebResults {
    /// Results block or an informational notice; usable as model context.
    Html(String),
    /// Error notice to append to the answer instead.
    Failed(String),
}

#[derive(Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl From<CseItem> for SearchHit {
    fn from(item: CseItem) -> Self {
        Self {
            title: item.title,
            url: item.link,
            snippet: item.snippet,
        }
    }
}

#[derive(Clone)]
pub struct GoogleSearchClient {
    client: Client,
    api_key: String,
    cse_id: String,
    endpoint: String,
}

impl GoogleSearchClient {
    /// `None` when the API key or engine id is missing.
    pub fn from_config(client: Client, config: &SearchConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        Some(Self {
            client,
            api_key: config.google_api_key.clone(),
            cse_id: config.google_cse_id.clone(),
            endpoint: config.google_cse_url.clone(),
        })
    }

    async fn fetch_items(&self, query: &str, num: usize) -> Result<Vec<SearchHit>, SearchError> {
        info!(query, num, "Searching Google CSE");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", &num.to_string()),
            ])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "Google CSE error");
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CseResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        Ok(parsed.items.into_iter().map(SearchHit::from).collect())
    }

    /// Search-chat lookup with the news-oriented link filter applied.
    pub async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchHit>, SearchError> {
        let items = self.fetch_items(query, num).await?;
        let total = items.len();
        let filtered = filter_news(items, chrono::Utc::now().year());
        info!(kept = filtered.len(), total, "URLs after news filter");
        Ok(filtered)
    }

    /// Consultation lookup rendered as the `google-results` HTML block.
    pub async fn results_html(&self, query: &str) -> WebResults {
        match self.fetch_items(query, CONSULT_RESULTS).await {
            Ok(items) if items.is_empty() => WebResults::Html(NO_RESULTS_HTML.to_string()),
            Ok(items) => {
                info!(count = items.len(), "Web search OK");
                WebResults::Html(render_results(&items))
            }
            Err(SearchError::RequestFailed(e)) if e.is_timeout() => {
                warn!("Web search timed out");
                WebResults::Failed("<p><i>[Error: Timeout búsqueda web.]</i></p>".to_string())
            }
            Err(SearchError::RequestFailed(e)) => {
                warn!(error = %e, "Web search connection error");
                WebResults::Failed("<p><i>[Error conexión búsqueda web.]</i></p>".to_string())
            }
            Err(e) => {
                warn!(error = %e, "Web search failed");
                WebResults::Failed("<p><i>[Error inesperado búsqueda web.]</i></p>".to_string())
            }
        }
    }
}

pub fn is_news_link(link: &str, year: i32) -> bool {
    let path = link.split('?').next().unwrap_or_default().to_lowercase();
    link.contains(&format!("/{year}/"))
        || path.ends_with(".html")
        || NEWS_DOMAINS.iter().any(|domain| link.contains(domain))
}

/// Keeps news-looking links; all items when none qualify.
pub fn filter_news(items: Vec<SearchHit>, year: i32) -> Vec<SearchHit> {
    if items.iter().any(|hit| is_news_link(&hit.url, year)) {
        items.into_iter().filter(|hit| is_news_link(&hit.url, year)).collect()
    } else {
        items
    }
}

fn render_results(items: &[SearchHit]) -> String {
    let mut html = String::from(
        "<div class='google-results' style='margin-top:15px;border-top:1px solid #eee;padding-top:10px;'>\
         <h4 style='font-size:0.9em;color:#555;margin-bottom:8px;'>Resultados web:</h4>",
    );
    for item in items {
        let link = if item.url.is_empty() { "#" } else { item.url.as_str() };
        let snippet = item.snippet.replace('\n', " ");
        html.push_str(&format!(
            "<div style='margin-bottom:10px;font-size:0.85em;'>\
             <a href='{link}' target='_blank' style='color:#1a0dab;text-decoration:none;font-weight:bold;'>{}</a>\
             <p style='color:#545454;margin:2px 0;'>{snippet}</p>\
             <cite style='color:#006621;font-style:normal;font-size:0.9em;'>{link}</cite></div>\n",
            item.title
        ));
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(url: &str) -> SearchConfig {
        SearchConfig {
            google_api_key: "gkey".to_string(),
            google_cse_id: "cx1".to_string(),
            google_cse_url: url.to_string(),
            news_rss_url: String::new(),
        }
    }

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: String::new(),
            url: url.to_string(),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_is_news_link() {
        assert!(is_news_link("https://diario.es/2026/03/turismo", 2026));
        assert!(is_news_link("https://diario.es/noticia.HTML?utm=1", 2026));
        assert!(is_news_link("https://www.rtve.es/play/", 2026));
        assert!(!is_news_link("https://diario.es/2019/03/turismo", 2026));
    }

    #[test]
    fn test_filter_news_keeps_all_when_nothing_matches() {
        let items = vec![hit("https://a.com/x"), hit("https://b.com/y")];
        assert_eq!(filter_news(items.clone(), 2026), items);

        let mixed = vec![hit("https://a.com/x"), hit("https://boe.es/d")];
        assert_eq!(filter_news(mixed, 2026), vec![hit("https://boe.es/d")]);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let mut cfg = config("http://localhost");
        cfg.google_cse_id.clear();
        assert!(GoogleSearchClient::from_config(Client::new(), &cfg).is_none());
    }

    #[tokio::test]
    async fn test_search_sends_credentials_and_maps_items() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("key".into(), "gkey".into()),
                Matcher::UrlEncoded("cx".into(), "cx1".into()),
                Matcher::UrlEncoded("q".into(), "ocupación hotelera".into()),
                Matcher::UrlEncoded("num".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"items":[{"title":"Récord","link":"https://boe.es/a","snippet":"texto"},
                             {"title":"Otro","link":"https://foo.com/b"}]}"#,
            )
            .create_async()
            .await;

        let client = GoogleSearchClient::from_config(Client::new(), &config(&server.url())).unwrap();
        let hits = client.search("ocupación hotelera", 2).await.unwrap();

        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Récord");
        assert_eq!(hits[0].snippet, "texto");
    }

    #[tokio::test]
    async fn test_search_non_200_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let client = GoogleSearchClient::from_config(Client::new(), &config(&server.url())).unwrap();
        let err = client.search("x", 2).await.unwrap_err();
        assert!(matches!(err, SearchError::Status { status: 403, ref body } if body == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_results_html_block_and_notices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("q".into(), "congreso".into()))
            .with_status(200)
            .with_body(r#"{"items":[{"title":"Congreso","link":"https://x.es/c","snippet":"a\nb"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("q".into(), "nada".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("q".into(), "roto".into()))
            .with_status(500)
            .create_async()
            .await;

        let client = GoogleSearchClient::from_config(Client::new(), &config(&server.url())).unwrap();

        match client.results_html("congreso").await {
            WebResults::Html(html) => {
                assert!(html.starts_with("<div class='google-results'"));
                assert!(html.contains(">Congreso</a>"));
                assert!(html.contains("a b"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            client.results_html("nada").await,
            WebResults::Html(NO_RESULTS_HTML.to_string())
        );
        assert!(matches!(client.results_html("roto").await, WebResults::Failed(html) if html.contains("[Error")));
    }
}
