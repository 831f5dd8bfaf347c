//! Gallery configuration.

use serde::Deserialize;

/// Configuration for the gallery service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the content store query API (versioned root).
    #[serde(default = "defaults::content_api_url")]
    pub content_api_url: String,

    /// Base URL of the content store's image CDN.
    #[serde(default = "defaults::content_cdn_url")]
    pub content_cdn_url: String,

    #[serde(default = "defaults::content_project_id")]
    pub content_project_id: String,

    #[serde(default = "defaults::content_dataset")]
    pub content_dataset: String,

    /// Primary wallet/drop gateway JSON-RPC endpoint.
    #[serde(default = "defaults::chain_rpc_url")]
    pub chain_rpc_url: String,

    #[serde(default = "defaults::fallback_chain_rpc_url")]
    pub fallback_chain_rpc_url: String,

    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Timeout for upstream HTTP calls (content store and chain gateway).
    #[serde(default = "defaults::upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_api_url: defaults::content_api_url(),
            content_cdn_url: defaults::content_cdn_url(),
            content_project_id: defaults::content_project_id(),
            content_dataset: defaults::content_dataset(),
            chain_rpc_url: defaults::chain_rpc_url(),
            fallback_chain_rpc_url: defaults::fallback_chain_rpc_url(),
            bind_address: defaults::bind_address(),
            upstream_timeout_secs: defaults::upstream_timeout_secs(),
        }
    }
}

mod defaults {
    fn project() -> String {
        std::env::var("GALLERY_CONTENT_PROJECT_ID").unwrap_or_else(|_| "demo".into())
    }

    pub fn content_api_url() -> String {
        if let Ok(url) = std::env::var("GALLERY_CONTENT_API_URL") {
            if !url.is_empty() {
                return url;
            }
        }
        format!("https://{}.api.sanity.io/v2021-10-21/", project())
    }

    pub fn content_cdn_url() -> String {
        "https://cdn.sanity.io/".into()
    }

    pub fn content_project_id() -> String {
        project()
    }

    pub fn content_dataset() -> String {
        "production".into()
    }

    pub fn chain_rpc_url() -> String {
        "http://127.0.0.1:8545".into()
    }

    pub fn fallback_chain_rpc_url() -> String {
        "http://127.0.0.1:8546".into()
    }

    pub fn bind_address() -> String {
        "0.0.0.0:3050".into()
    }

    pub fn upstream_timeout_secs() -> u64 {
        10
    }
}
