use std::net::SocketAddr;

use anyhow::Context;
use asistente_ia::{config::Config, create_router, db, llm, utils::logger::init_logger, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_logger(config.server.log_dir.as_deref());
    info!(host = %config.server.host, port = config.server.port, "Configuration loaded");

    // Database is optional; user context and indexing are disabled without it
    let pool = match db::create_pool(&config.database).await {
        Ok(Some(pool)) => {
            info!("Database connected");
            Some(pool)
        }
        Ok(None) => {
            warn!("Database not configured, user context disabled");
            None
        }
        Err(e) => {
            warn!(error = %e, "Database connection failed, user context disabled");
            None
        }
    };

    let llm = llm::adapter_from_config(&config.llm);
    if llm.is_none() {
        warn!("OPENAI_API_KEY not set, AI endpoints will answer 503");
    }
    if !config.search.is_configured() {
        warn!("Google CSE not configured, web search limited");
    }
    if !config.bridge.is_configured() {
        warn!("PHP bridge not configured, bridged document context disabled");
    }

    let state = AppState {
        pool,
        config: config.clone(),
        llm,
        http: reqwest::Client::new(),
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("HOST/PORT do not form a valid socket address")?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
