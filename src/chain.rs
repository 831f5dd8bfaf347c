//! Chain gateway client.
//!
//! Talks JSON-RPC to the wallet/drop-contract gateway with primary to
//! fallback failover and a circuit breaker. The gateway owns wallet
//! connection and contract execution; this client only reads drop state and
//! submits claims.

use crate::error::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Consecutive failures before the circuit breaker opens.
const CIRCUIT_BREAKER_THRESHOLD: u64 = 5;
/// How long (ms) before a tripped breaker retries the primary.
const CIRCUIT_BREAKER_WINDOW_MS: u64 = 30_000;

struct CircuitState {
    failures: u64,
    last_failure_ms: u64,
    open: bool,
}

/// A claim condition configured on the drop contract. The display price is
/// taken from the first condition in the list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClaimCondition {
    pub price: String,
    pub currency: String,
}

/// Aggregate supply state of a drop contract.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DropSupply {
    pub claimed: u64,
    /// Total supply. Large values arrive as decimal strings.
    #[serde(deserialize_with = "deserialize_u128")]
    pub total: u128,
}

/// Result of a successful claim submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimOutcome {
    /// Transaction hash of the claim receipt.
    pub receipt: String,
    pub token_id: String,
    /// Claimed token metadata, if the gateway returns it.
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client for the chain gateway with automatic failover.
pub struct ChainClient {
    http: reqwest::Client,
    primary: Url,
    fallback: Url,
    circuit: Mutex<CircuitState>,
    total_failovers: AtomicU64,
    next_id: AtomicU64,
}

impl ChainClient {
    pub fn new(primary_url: &str, fallback_url: &str, timeout_secs: u64) -> Result<Self, Error> {
        let primary = Url::parse(primary_url)
            .map_err(|e| Error::Config(format!("invalid chain_rpc_url: {e}")))?;
        let fallback = Url::parse(fallback_url)
            .map_err(|e| Error::Config(format!("invalid fallback_chain_rpc_url: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        info!(primary = %primary, fallback = %fallback, "Chain client initialized with failover");

        Ok(Self {
            http,
            primary,
            fallback,
            circuit: Mutex::new(CircuitState {
                failures: 0,
                last_failure_ms: 0,
                open: false,
            }),
            total_failovers: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
        })
    }

    /// Currently connected wallet address, or `None` when no wallet is
    /// connected.
    pub async fn wallet_address(&self) -> Result<Option<String>, Error> {
        self.call("wallet_address", json!([])).await
    }

    /// Claim conditions configured on `contract`.
    pub async fn claim_conditions(&self, contract: &str) -> Result<Vec<ClaimCondition>, Error> {
        self.call("drop_claimConditions", json!([contract])).await
    }

    /// Total supply and already-claimed count for `contract`.
    pub async fn supply(&self, contract: &str) -> Result<DropSupply, Error> {
        self.call("drop_supply", json!([contract])).await
    }

    /// Submit a claim of `quantity` tokens from `contract` to `address`.
    pub async fn claim(
        &self,
        contract: &str,
        address: &str,
        quantity: u64,
    ) -> Result<ClaimOutcome, Error> {
        self.call("drop_claimTo", json!([contract, address, quantity]))
            .await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, Error> {
        match self.call_on(self.active(), method, params.clone()).await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(primary_err) => {
                self.record_failure();
                warn!(error = %primary_err, method, "Primary chain RPC failed, trying fallback");
                self.call_on(&self.fallback, method, params)
                    .await
                    .map_err(|fallback_err| {
                        Error::Chain(format!(
                            "{method} failed on both RPCs: primary={primary_err}, fallback={fallback_err}"
                        ))
                    })
            }
        }
    }

    async fn call_on<T: DeserializeOwned>(
        &self,
        url: &Url,
        method: &str,
        params: Value,
    ) -> Result<T, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Chain(format!("gateway unreachable: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Chain(format!("gateway request failed: {e}")))?;

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| Error::Chain(format!("invalid gateway response: {e}")))?;

        decode_envelope(method, envelope)
    }

    // --- Failover / circuit breaker ---

    /// Active endpoint (primary unless the circuit is open).
    fn active(&self) -> &Url {
        if self.is_circuit_open() {
            &self.fallback
        } else {
            &self.primary
        }
    }

    fn record_success(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if circuit.failures > 0 {
            info!(primary = %self.primary, "Primary chain RPC recovered");
            circuit.failures = 0;
            circuit.open = false;
        }
    }

    fn record_failure(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        circuit.failures += 1;
        circuit.last_failure_ms = now_ms();
        if circuit.failures >= CIRCUIT_BREAKER_THRESHOLD && !circuit.open {
            circuit.open = true;
            self.total_failovers.fetch_add(1, Ordering::Relaxed);
            warn!(
                failures = circuit.failures,
                fallback = %self.fallback,
                "Circuit breaker opened, routing to fallback"
            );
        }
    }

    fn is_circuit_open(&self) -> bool {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        if !circuit.open {
            return false;
        }
        // Half-open: retry primary after the window elapses.
        if now_ms() - circuit.last_failure_ms > CIRCUIT_BREAKER_WINDOW_MS {
            circuit.open = false;
            circuit.failures = 0;
            info!(primary = %self.primary, "Circuit breaker half-open, retrying primary");
            return false;
        }
        true
    }

    /// Total number of failover events (for the health endpoint).
    pub fn failover_count(&self) -> u64 {
        self.total_failovers.load(Ordering::Relaxed)
    }

    /// Which endpoint is currently active.
    pub fn active_url(&self) -> String {
        self.active().to_string()
    }
}

fn decode_envelope<T: DeserializeOwned>(method: &str, envelope: RpcEnvelope) -> Result<T, Error> {
    if let Some(error) = envelope.error {
        return Err(Error::Chain(format!(
            "{method} rejected: {} (code {})",
            error.message, error.code
        )));
    }
    serde_json::from_value(envelope.result.unwrap_or(Value::Null))
        .map_err(|e| Error::Chain(format!("{method}: unexpected result shape: {e}")))
}

fn deserialize_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    struct U128Visitor;

    impl serde::de::Visitor<'_> for U128Visitor {
        type Value = u128;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an unsigned integer or a decimal string")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<u128, E> {
            v.parse().map_err(serde::de::Error::custom)
        }
    }

    deserializer.deserialize_any(U128Visitor)
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(raw: &str) -> RpcEnvelope {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn decodes_supply_with_numeric_total() {
        let supply: DropSupply = decode_envelope(
            "drop_supply",
            envelope(r#"{"jsonrpc":"2.0","id":1,"result":{"claimed":99,"total":100}}"#),
        )
        .unwrap();
        assert_eq!(supply, DropSupply { claimed: 99, total: 100 });
    }

    #[test]
    fn decodes_supply_with_string_total() {
        let supply: DropSupply = decode_envelope(
            "drop_supply",
            envelope(
                r#"{"jsonrpc":"2.0","id":1,"result":{"claimed":0,"total":"340282366920938463463374607431768211455"}}"#,
            ),
        )
        .unwrap();
        assert_eq!(supply.total, u128::MAX);
    }

    #[test]
    fn null_wallet_address_means_disconnected() {
        let address: Option<String> = decode_envelope(
            "wallet_address",
            envelope(r#"{"jsonrpc":"2.0","id":1,"result":null}"#),
        )
        .unwrap();
        assert!(address.is_none());

        let address: Option<String> = decode_envelope(
            "wallet_address",
            envelope(r#"{"jsonrpc":"2.0","id":1,"result":"0xabc"}"#),
        )
        .unwrap();
        assert_eq!(address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn decodes_claim_conditions() {
        let conditions: Vec<ClaimCondition> = decode_envelope(
            "drop_claimConditions",
            envelope(
                r#"{"jsonrpc":"2.0","id":1,"result":[{"price":"0.01","currency":"ETH"}]}"#,
            ),
        )
        .unwrap();
        assert_eq!(conditions[0].price, "0.01");
        assert_eq!(conditions[0].currency, "ETH");
    }

    #[test]
    fn rpc_error_becomes_chain_error() {
        let result: Result<ClaimOutcome, Error> = decode_envelope(
            "drop_claimTo",
            envelope(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"user rejected"}}"#,
            ),
        );
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Chain(_)));
        assert!(err.to_string().contains("user rejected"));
    }

    #[test]
    fn claim_outcome_metadata_is_optional() {
        let outcome: ClaimOutcome = decode_envelope(
            "drop_claimTo",
            envelope(r#"{"jsonrpc":"2.0","id":1,"result":{"receipt":"0xdead","token_id":"42"}}"#),
        )
        .unwrap();
        assert_eq!(outcome.receipt, "0xdead");
        assert_eq!(outcome.token_id, "42");
        assert!(outcome.metadata.is_none());
    }
}
