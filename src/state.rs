//! Application state shared across handlers.

use crate::chain::ChainClient;
use crate::config::Config;
use crate::content::ContentClient;
use crate::session::SessionStore;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub content: ContentClient,
    pub chain: ChainClient,
    pub sessions: SessionStore,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: Config) -> Result<Self, crate::Error> {
        let content = ContentClient::new(&config)?;
        let chain = ChainClient::new(
            &config.chain_rpc_url,
            &config.fallback_chain_rpc_url,
            config.upstream_timeout_secs,
        )?;

        Ok(Self {
            content,
            chain,
            config,
            sessions: SessionStore::new(),
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        })
    }
}
