//! Response types for the gallery API.

use serde::Serialize;

/// Response from the health endpoint.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub content_api: String,
    pub active_rpc: String,
    pub uptime_secs: u64,
    pub requests: u64,
    pub failovers: u64,
    pub sessions: usize,
}
