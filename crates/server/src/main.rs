//! Duel server binary.
//!
//! Loads the content catalog, starts a lobby and accepts line-delimited JSON
//! connections over TCP.
mod config;
mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};
use duel_content::ContentFactory;
use duel_runtime::{LobbyHandle, OracleManager};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env()?;

    let catalog = ContentFactory::new(&config.content_dir)
        .load_catalog()
        .with_context(|| format!("loading content from {}", config.content_dir.display()))?;
    info!(
        content = %config.content_dir.display(),
        skills = catalog.skills().len(),
        "content loaded"
    );

    let lobby = LobbyHandle::new(
        config.runtime.clone(),
        OracleManager::from_catalog(Arc::new(catalog)),
    );

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(bind = %config.bind, timeout = ?config.runtime.decision_timeout, "duel server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "client connected");

        let lobby = lobby.clone();
        tokio::spawn(async move {
            if let Err(error) = transport::serve_connection(stream, peer, lobby).await {
                warn!(%peer, error = %format!("{error:#}"), "connection ended with error");
            }
        });
    }
}
