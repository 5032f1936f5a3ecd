//! Server configuration from the environment.
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use duel_runtime::RuntimeConfig;

const DEFAULT_BIND: &str = "127.0.0.1:7878";
const DEFAULT_CONTENT: &str = "crates/game/content/data";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub content_dir: PathBuf,
    pub runtime: RuntimeConfig,
}

impl ServerConfig {
    /// Environment variables:
    /// - `DUEL_BIND_ADDR` - Listen address (default: 127.0.0.1:7878)
    /// - `DUEL_CONTENT` - Content data directory (default: crates/game/content/data)
    /// - everything [`RuntimeConfig::from_env`] reads
    pub fn from_env() -> anyhow::Result<Self> {
        let bind = env::var("DUEL_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .with_context(|| format!("invalid DUEL_BIND_ADDR {bind:?}"))?;
        let content_dir = env::var("DUEL_CONTENT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONTENT));

        Ok(Self {
            bind,
            content_dir,
            runtime: RuntimeConfig::from_env(),
        })
    }
}
