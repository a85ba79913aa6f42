//! Ledger Client (spec §4.3).
//!
//! Thin adapter over an EVM contract exposing `anchor(bytes32,string)` and
//! `isAnchored(bytes32) -> (bool, uint256)`. Built on Alloy, following the
//! same provider/signer wiring as the teacher's EIP-155 chain provider:
//! a `PrivateKeySigner` wallet filler over an HTTP transport, round gas
//! estimation, and `get_receipt()`-style polling bounded by an explicit
//! timeout. The client never retries internally; retry policy belongs to
//! the Batcher (§9).

use crate::error::LedgerError;
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, FixedBytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::sol;
use std::time::Duration;
use url::Url;

sol! {
    #[sol(rpc)]
    interface CraftAnchor {
        function anchor(bytes32 h, string publicId) external;
        function isAnchored(bytes32 h) external view returns (bool, uint256);
    }
}

/// Configuration needed to stand up a [`LedgerClient`].
pub struct LedgerConfig {
    pub rpc_url: Url,
    pub contract_address: Address,
    pub chain_id: u64,
    pub gas_limit: u64,
    pub receipt_timeout: Duration,
    pub signer: PrivateKeySigner,
}

/// Adapter over the two-method anchoring contract.
pub struct LedgerClient {
    gas_limit: u64,
    receipt_timeout: Duration,
    poll_interval: Duration,
    provider: DynProvider,
    contract_address: Address,
}

/// Accepts 64-hex (with or without `0x`), left-pads short input, rejects
/// anything else (§4.3 "Hash conversion").
pub fn parse_hash32(hash_hex: &str) -> Result<FixedBytes<32>, LedgerError> {
    let stripped = hash_hex.strip_prefix("0x").unwrap_or(hash_hex);
    if stripped.len() > 64 || !stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(LedgerError::InvalidInput(
            "hash must be at most 64 hex characters".into(),
        ));
    }
    let padded = format!("{stripped:0>64}");
    let bytes = hex::decode(&padded)
        .map_err(|_| LedgerError::InvalidInput("hash is not valid hex".into()))?;
    Ok(FixedBytes::<32>::from_slice(&bytes))
}

impl LedgerClient {
    /// Builds the provider stack: a wallet filler over an HTTP transport,
    /// matching the teacher's `ProviderBuilder` composition. Aborts (via
    /// `Err`) if the RPC URL is malformed; all other config validation
    /// happens before construction in `Config::load`.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let wallet = EthereumWallet::from(config.signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(config.rpc_url);

        Ok(Self {
            gas_limit: config.gas_limit,
            receipt_timeout: config.receipt_timeout,
            poll_interval: Duration::from_secs(2),
            provider: DynProvider::new(provider),
            contract_address: config.contract_address,
        })
    }

    /// `isAnchored(hash32) -> (bool, unixSeconds)` — pure view call.
    pub async fn is_anchored(&self, hash_hex: &str) -> Result<(bool, u64), LedgerError> {
        let hash = parse_hash32(hash_hex)?;
        let contract = CraftAnchor::new(self.contract_address, self.provider.clone());
        let result = contract
            .isAnchored(hash)
            .call()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let first_anchor_unix: u64 = result._1.try_into().unwrap_or(u64::MAX);
        Ok((result._0, first_anchor_unix))
    }

    /// `anchor(hash32, public_id, waitForReceipt=true, timeoutSec) -> tx_hash`.
    ///
    /// Sends the transaction with a static gas ceiling, then polls
    /// `getTransactionReceipt` at a fixed ≤2s interval until the receipt
    /// is observed or `receipt_timeout` elapses.
    pub async fn anchor(
        &self,
        hash_hex: &str,
        public_id: &str,
        wait_for_receipt: bool,
    ) -> Result<String, LedgerError> {
        let hash = parse_hash32(hash_hex)?;
        let contract = CraftAnchor::new(self.contract_address, self.provider.clone());

        let call = contract
            .anchor(hash, public_id.to_string())
            .gas(self.gas_limit);

        let pending = call
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let tx_hash = format!("0x{}", hex::encode(pending.tx_hash()));

        if !wait_for_receipt {
            return Ok(tx_hash);
        }

        let deadline = tokio::time::Instant::now() + self.receipt_timeout;
        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(LedgerError::ReceiptTimeout);
            }
            match self.provider.get_transaction_receipt(*pending.tx_hash()).await {
                Ok(Some(receipt)) => {
                    return if receipt.status() {
                        Ok(tx_hash)
                    } else {
                        Err(LedgerError::TxRejected)
                    };
                }
                Ok(None) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => return Err(LedgerError::Transport(e.to_string())),
            }
        }
    }
}

/// Converts a block-header Unix-second timestamp into ISO-8601 UTC, for
/// reconciling `anchored_at` from `isAnchored`'s returned block timestamp.
pub fn unix_seconds_to_iso(unix_seconds: u64) -> String {
    use chrono::{DateTime, Utc};
    DateTime::<Utc>::from_timestamp(unix_seconds as i64, 0)
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hash32_accepts_0x_prefix_and_pads_short_input() {
        let h = parse_hash32("0xabc").unwrap();
        assert_eq!(hex::encode(h), format!("{:0>64}", "abc"));
    }

    #[test]
    fn parse_hash32_rejects_non_hex() {
        assert!(parse_hash32("not-hex").is_err());
    }

    #[test]
    fn parse_hash32_rejects_overlong_input() {
        assert!(parse_hash32(&"a".repeat(65)).is_err());
    }

    #[test]
    fn unix_seconds_round_trips_to_second_precision_iso() {
        assert_eq!(unix_seconds_to_iso(1_735_689_600), "2025-01-01T00:00:00Z");
    }
}
