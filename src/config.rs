use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub bridge: BridgeConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `None` when no connection settings were provided; prompts and
    /// document context are skipped in that case.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub default_model: String,
    pub consult_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub google_api_key: String,
    pub google_cse_id: String,
    pub google_cse_url: String,
    pub news_rss_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub file_serve_url: Option<String>,
    pub api_secret_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    pub org_name: String,
    pub default_tenant_id: i32,
    pub rag_token_budget: usize,
    pub rag_max_documents: i64,
    pub extraction_timeout_secs: u64,
}

impl LLMConfig {
    pub fn is_configured(&self) -> bool {
        !self.openai_api_key.is_empty()
    }
}

impl SearchConfig {
    pub fn is_configured(&self) -> bool {
        !self.google_api_key.is_empty() && !self.google_cse_id.is_empty()
    }
}

impl BridgeConfig {
    pub fn is_configured(&self) -> bool {
        matches!(
            (&self.file_serve_url, &self.api_secret_key),
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty()
        )
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                log_dir: non_empty_var("LOG_DIR"),
            },
            database: DatabaseConfig {
                url: database_url_from_env()?,
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("DB_MAX_CONNECTIONS must be an integer")?,
                connect_timeout_secs: env::var("DB_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("DB_CONNECT_TIMEOUT_SECS must be an integer")?,
            },
            llm: LLMConfig {
                openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                openai_base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                default_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
                consult_model: env::var("OPENAI_CONSULT_MODEL")
                    .unwrap_or_else(|_| "gpt-4-turbo".to_string()),
            },
            search: SearchConfig {
                google_api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
                google_cse_id: env::var("GOOGLE_CSE_ID")
                    .or_else(|_| env::var("GOOGLE_CX"))
                    .unwrap_or_default(),
                google_cse_url: env::var("GOOGLE_CSE_URL")
                    .unwrap_or_else(|_| "https://www.googleapis.com/customsearch/v1".to_string()),
                news_rss_url: env::var("NEWS_RSS_URL")
                    .unwrap_or_else(|_| "https://news.google.com/rss/search".to_string()),
            },
            bridge: BridgeConfig {
                file_serve_url: non_empty_var("PHP_FILE_SERVE_URL"),
                api_secret_key: non_empty_var("PHP_API_SECRET_KEY"),
            },
            assistant: AssistantConfig {
                org_name: env::var("ASSISTANT_ORG_NAME").unwrap_or_else(|_| "Ashotel".to_string()),
                default_tenant_id: env::var("DEFAULT_TENANT_ID")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .context("DEFAULT_TENANT_ID must be an integer")?,
                rag_token_budget: env::var("RAG_TOKEN_BUDGET")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .context("RAG_TOKEN_BUDGET must be an integer")?,
                rag_max_documents: env::var("RAG_MAX_DOCUMENTS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("RAG_MAX_DOCUMENTS must be an integer")?,
                extraction_timeout_secs: env::var("EXTRACTION_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("EXTRACTION_TIMEOUT_SECS must be an integer")?,
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// `DATABASE_URL` wins; otherwise the URL is composed from the discrete
/// `DB_*` variables, and only when all of them are present.
fn database_url_from_env() -> Result<Option<String>> {
    if let Some(url) = non_empty_var("DATABASE_URL") {
        return Ok(Some(url));
    }

    let parts = (
        non_empty_var("DB_HOST"),
        non_empty_var("DB_USER"),
        non_empty_var("DB_PASS"),
        non_empty_var("DB_NAME"),
    );
    let (Some(host), Some(user), Some(pass), Some(name)) = parts else {
        return Ok(None);
    };

    let port: u16 = env::var("DB_PORT")
        .unwrap_or_else(|_| "5432".to_string())
        .parse()
        .context("DB_PORT must be a valid port number")?;

    compose_database_url(&host, port, &user, &pass, &name).map(Some)
}

/// Builds a postgres URL, percent-encoding the credentials.
pub fn compose_database_url(host: &str, port: u16, user: &str, pass: &str, name: &str) -> Result<String> {
    let mut url = reqwest::Url::parse("postgres://localhost")?;
    url.set_host(Some(host)).context("DB_HOST is not a valid host")?;
    url.set_port(Some(port))
        .map_err(|_| anyhow::anyhow!("DB_PORT cannot be applied to the database URL"))?;
    url.set_username(user)
        .map_err(|_| anyhow::anyhow!("DB_USER cannot be applied to the database URL"))?;
    url.set_password(Some(pass))
        .map_err(|_| anyhow::anyhow!("DB_PASS cannot be applied to the database URL"))?;
    url.set_path(name);
    Ok(url.to_string())
}
