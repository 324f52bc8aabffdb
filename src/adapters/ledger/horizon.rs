//! Horizon-compatible ledger client.
//!
//! Looks up a transaction and its operations through the Horizon REST API:
//!
//! - `GET {base}/transactions/{hash}`
//! - `GET {base}/transactions/{hash}/operations?limit=200`
//!
//! # Configuration
//!
//! ```ignore
//! let config = HorizonConfig::new("https://horizon.stellar.org")
//!     .with_timeout(Duration::from_secs(10));
//! let client = HorizonLedgerClient::new(config)?;
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::subscription::{LedgerOperation, LedgerTransaction};
use crate::ports::{LedgerClient, LedgerError};

/// Horizon caps operation pages at 200 records.
const OPERATIONS_PAGE_LIMIT: u32 = 200;

/// Horizon client configuration.
#[derive(Debug, Clone)]
pub struct HorizonConfig {
    /// Base URL without trailing slash.
    base_url: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl HorizonConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Ledger client backed by a Horizon server.
pub struct HorizonLedgerClient {
    config: HorizonConfig,
    http_client: reqwest::Client,
}

impl HorizonLedgerClient {
    /// Builds the HTTP client with the configured timeout.
    pub fn new(config: HorizonConfig) -> Result<Self, LedgerError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LedgerError::unreachable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<Option<T>, LedgerError> {
        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| LedgerError::unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, url = %url, "Ledger returned an error status");
            return Err(LedgerError::unreachable(format!(
                "ledger responded with status {}",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| LedgerError::invalid_response(e.to_string()))
    }
}

/// Horizon transaction hashes are 64 hex characters.
fn is_transaction_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

#[async_trait]
impl LedgerClient for HorizonLedgerClient {
    async fn fetch_transaction(&self, hash: &str) -> Result<Option<LedgerTransaction>, LedgerError> {
        if !is_transaction_hash(hash) {
            tracing::debug!(tx_hash = %hash, "Rejecting malformed transaction hash without lookup");
            return Ok(None);
        }

        let tx_url = format!("{}/transactions/{}", self.config.base_url, hash);
        let Some(tx) = self.get_json::<HorizonTransaction>(&tx_url).await? else {
            return Ok(None);
        };

        let ops_url = format!(
            "{}/transactions/{}/operations?limit={}",
            self.config.base_url, hash, OPERATIONS_PAGE_LIMIT
        );
        let page = self
            .get_json::<HorizonOperationsPage>(&ops_url)
            .await?
            .ok_or_else(|| LedgerError::invalid_response("transaction has no operations resource"))?;

        Ok(Some(into_ledger_transaction(tx, page)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct HorizonTransaction {
    hash: String,
    /// Absent means unproven, so the payment is rejected.
    #[serde(default)]
    successful: bool,
}

#[derive(Debug, Deserialize)]
struct HorizonOperationsPage {
    #[serde(rename = "_embedded")]
    embedded: HorizonEmbedded,
}

#[derive(Debug, Deserialize)]
struct HorizonEmbedded {
    records: Vec<HorizonOperation>,
}

#[derive(Debug, Deserialize)]
struct HorizonOperation {
    #[serde(rename = "type")]
    kind: String,
    asset_code: Option<String>,
    asset_issuer: Option<String>,
    from: Option<String>,
    to: Option<String>,
    amount: Option<String>,
}

fn into_ledger_transaction(tx: HorizonTransaction, page: HorizonOperationsPage) -> LedgerTransaction {
    LedgerTransaction {
        hash: tx.hash,
        successful: tx.successful,
        operations: page
            .embedded
            .records
            .into_iter()
            .map(|op| LedgerOperation {
                kind: op.kind,
                asset_code: op.asset_code,
                asset_issuer: op.asset_issuer,
                from: op.from,
                to: op.to,
                amount: op.amount,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";

    #[test]
    fn config_strips_trailing_slash() {
        let config = HorizonConfig::new("https://horizon-testnet.stellar.org/");
        assert_eq!(config.base_url(), "https://horizon-testnet.stellar.org");
    }

    #[test]
    fn recognizes_transaction_hashes() {
        assert!(is_transaction_hash(HASH));
        assert!(!is_transaction_hash("abc"));
        assert!(!is_transaction_hash(&format!("{}/../x", &HASH[..58])));
    }

    #[test]
    fn parses_payment_operations() {
        let tx: HorizonTransaction = serde_json::from_str(&format!(
            r#"{{"hash": "{}", "successful": true, "ledger": 123}}"#,
            HASH
        ))
        .unwrap();
        let page: HorizonOperationsPage = serde_json::from_str(
            r#"{
                "_links": {},
                "_embedded": {
                    "records": [
                        {
                            "type": "payment",
                            "asset_type": "credit_alphanum4",
                            "asset_code": "USDC",
                            "asset_issuer": "GISSUER",
                            "from": "GFROM",
                            "to": "GTO",
                            "amount": "10.0000000"
                        },
                        {
                            "type": "create_account",
                            "funder": "GFROM",
                            "account": "GNEW",
                            "starting_balance": "2.0000000"
                        }
                    ]
                }
            }"#,
        )
        .unwrap();

        let ledger_tx = into_ledger_transaction(tx, page);

        assert_eq!(ledger_tx.hash, HASH);
        assert!(ledger_tx.successful);
        assert_eq!(ledger_tx.operations.len(), 2);
        assert!(ledger_tx.operations[0].is_payment());
        assert_eq!(ledger_tx.operations[0].amount.as_deref(), Some("10.0000000"));
        assert!(!ledger_tx.operations[1].is_payment());
        assert_eq!(ledger_tx.operations[1].asset_code, None);
    }

    #[test]
    fn missing_success_flag_reads_as_failed() {
        let tx: HorizonTransaction =
            serde_json::from_str(&format!(r#"{{"hash": "{}", "ledger": 123}}"#, HASH)).unwrap();
        let page: HorizonOperationsPage =
            serde_json::from_str(r#"{"_embedded": {"records": []}}"#).unwrap();

        assert!(!into_ledger_transaction(tx, page).successful);
    }

    #[tokio::test]
    async fn malformed_hash_is_not_found_without_network() {
        let client = HorizonLedgerClient::new(HorizonConfig::new("http://127.0.0.1:9")).unwrap();

        let result = client.fetch_transaction("not-a-hash").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_fault() {
        let client = HorizonLedgerClient::new(
            HorizonConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        let err = client.fetch_transaction(HASH).await.unwrap_err();

        assert!(matches!(err, LedgerError::Unreachable(_)));
    }
}
