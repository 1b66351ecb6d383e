//! PHP File Bridge Client
//!
//! Uploaded user documents are served by a PHP endpoint that authenticates
//! the caller with a shared secret passed as a query parameter:
//!
//! `GET {serve_url}?doc_id=<id>&user_id=<id>&api_key=<secret>`

use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::config::BridgeConfig;

const FETCH_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("PHP bridge request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("PHP bridge returned HTTP {0}")]
    Status(u16),
}

#[derive(Clone)]
pub struct PhpBridgeClient {
    client: reqwest::Client,
    serve_url: String,
    api_key: String,
}

impl PhpBridgeClient {
    pub fn new(client: reqwest::Client, serve_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            serve_url: serve_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Configure client from config; `None` when the bridge is disabled.
    pub fn from_config(client: reqwest::Client, config: &BridgeConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        let (Some(url), Some(key)) = (&config.file_serve_url, &config.api_secret_key) else {
            return None;
        };
        Some(Self::new(client, url.clone(), key.clone()))
    }

    pub async fn fetch_document(&self, doc_id: i32, user_id: i32) -> Result<Vec<u8>, BridgeError> {
        info!(doc_id, user_id, "Requesting document from PHP bridge");

        let response = self
            .client
            .get(&self.serve_url)
            .query(&[
                ("doc_id", doc_id.to_string()),
                ("user_id", user_id.to_string()),
                ("api_key", self.api_key.clone()),
            ])
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        info!(doc_id, bytes = body.len(), "Document received from PHP bridge");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_fetch_document_sends_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/serve.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("doc_id".into(), "42".into()),
                Matcher::UrlEncoded("user_id".into(), "7".into()),
                Matcher::UrlEncoded("api_key".into(), "s3cret".into()),
            ]))
            .with_status(200)
            .with_body("contenido")
            .create_async()
            .await;

        let bridge = PhpBridgeClient::new(
            reqwest::Client::new(),
            format!("{}/serve.php", server.url()),
            "s3cret",
        );
        let bytes = bridge.fetch_document(42, 7).await.unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"contenido");
    }

    #[tokio::test]
    async fn test_fetch_document_maps_http_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/serve.php")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let bridge = PhpBridgeClient::new(
            reqwest::Client::new(),
            format!("{}/serve.php", server.url()),
            "wrong",
        );
        let err = bridge.fetch_document(1, 1).await.unwrap_err();
        assert!(matches!(err, BridgeError::Status(403)));
    }

    #[test]
    fn test_from_config_requires_both_values() {
        let config = BridgeConfig {
            file_serve_url: Some("https://files.example.com/serve.php".to_string()),
            api_secret_key: None,
        };
        assert!(PhpBridgeClient::from_config(reqwest::Client::new(), &config).is_none());
    }
}
