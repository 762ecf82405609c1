//! Wallet provider boundary
//!
//! An EIP-1193 shaped interface to whatever wallet the environment offers:
//! a JSON-RPC style `request`, a push channel for `accountsChanged` and
//! `chainChanged`, and a way to obtain a signing capability for an
//! authorized account.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::config::{ContractAddresses, NetworkConstants};
use crate::error::Error;
use crate::gateway::DexContracts;

/// JSON-RPC methods used against the wallet provider
pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const BLOCK_NUMBER: &str = "eth_blockNumber";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    pub const REVOKE_PERMISSIONS: &str = "wallet_revokePermissions";
}

/// EIP-1193 / EIP-3085 error codes
pub mod codes {
    pub const USER_REJECTED_REQUEST: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;
}

/// Error returned by `WalletProvider::request`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(codes::USER_REJECTED_REQUEST, "User rejected the request")
    }

    pub fn unrecognized_chain(chain_id: u64) -> Self {
        Self {
            code: codes::UNRECOGNIZED_CHAIN,
            message: format!("Unrecognized chain ID {}", chain_hex(chain_id)),
            data: Some(json!({ "chainId": chain_hex(chain_id) })),
        }
    }

    pub fn unsupported(method: &str) -> Self {
        Self::new(
            codes::UNSUPPORTED_METHOD,
            format!("Method {} is not supported", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }
}

impl fmt::Display for ProviderRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ProviderRpcError {}

/// Environment-pushed wallet events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Wallet families a user can connect with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local encrypted keystore (the injected-wallet equivalent)
    Keystore,
    WalletConnect,
    Coinbase,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Keystore => "Keystore",
            ProviderKind::WalletConnect => "WalletConnect",
            ProviderKind::Coinbase => "Coinbase Wallet",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keystore" | "injected" | "metamask" => Ok(ProviderKind::Keystore),
            "walletconnect" => Ok(ProviderKind::WalletConnect),
            "coinbase" => Ok(ProviderKind::Coinbase),
            other => Err(Error::InvalidInput(format!("Unknown wallet kind: {}", other))),
        }
    }
}

/// An EIP-1193 wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Which wallet family this provider belongs to
    fn kind(&self) -> ProviderKind;

    /// Send a JSON-RPC request to the wallet
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;

    /// Register a listener for account and chain changes
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Signing capability for an authorized account, bound to the wallet's
    /// current chain.
    fn signer(
        &self,
        account: Address,
        contracts: &ContractAddresses,
    ) -> Result<Arc<dyn DexContracts>, Error>;
}

/// Providers present in the running environment
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn WalletProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Register a provider, replacing any existing one of the same kind
    pub fn register(&mut self, provider: Arc<dyn WalletProvider>) {
        self.providers.retain(|p| p.kind() != provider.kind());
        self.providers.push(provider);
    }

    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn WalletProvider>, Error> {
        self.providers
            .iter()
            .find(|p| p.kind() == kind)
            .cloned()
            .ok_or_else(|| {
                Error::ProviderUnavailable(format!("{} is not available", kind.display_name()))
            })
    }

    /// First registered provider, used for silent reconnect and network checks
    pub fn primary(&self) -> Option<Arc<dyn WalletProvider>> {
        self.providers.first().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }
}

/// Scoped event listener; dropping it unregisters from the provider.
pub struct EventSubscription {
    receiver: broadcast::Receiver<ProviderEvent>,
}

impl EventSubscription {
    pub fn new(provider: &dyn WalletProvider) -> Self {
        Self {
            receiver: provider.subscribe(),
        }
    }

    /// Next queued event without waiting. Lagged events are skipped.
    pub fn try_next(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} wallet events", skipped);
                }
                Err(_) => return None,
            }
        }
    }

    /// Wait for the next event; `None` once the provider is gone.
    pub async fn next(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} wallet events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        tracing::debug!("Wallet event listener unregistered");
    }
}

/// Format a chain id the way wallets expect it (`0xa5bd`)
pub fn chain_hex(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// Parse a hex (`0x...`) or decimal chain id
pub fn parse_chain_id(value: &str) -> Option<u64> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Parse the account list returned by `eth_accounts` / `eth_requestAccounts`
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, Error> {
    let list: Vec<String> = serde_json::from_value(value.clone())?;
    list.iter()
        .map(|a| {
            a.parse::<Address>()
                .map_err(|e| Error::Wallet(format!("Invalid account {}: {}", a, e)))
        })
        .collect()
}

/// Parameters for `wallet_switchEthereumChain`
pub fn switch_chain_params(chain_id: u64) -> Value {
    json!([{ "chainId": chain_hex(chain_id) }])
}

/// Parameters for `wallet_addEthereumChain`
pub fn add_chain_params(network: &NetworkConstants) -> Value {
    json!([{
        "chainId": chain_hex(network.chain_id),
        "chainName": network.network_name,
        "nativeCurrency": {
            "name": network.native_currency_name,
            "symbol": network.native_symbol,
            "decimals": network.native_decimals,
        },
        "rpcUrls": [network.rpc_url],
        "blockExplorerUrls": [network.explorer_url],
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_round_trip_formats() {
        assert_eq!(chain_hex(42429), "0xa5bd");
        assert_eq!(parse_chain_id("0xa5bd"), Some(42429));
        assert_eq!(parse_chain_id("42429"), Some(42429));
        assert_eq!(parse_chain_id("nope"), None);
    }

    #[test]
    fn test_parse_accounts() {
        let value = json!(["0x00000000000000000000000000000000000000aa"]);
        let accounts = parse_accounts(&value).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0], Address::from_low_u64_be(0xaa));

        assert!(parse_accounts(&json!(["not-an-address"])).is_err());
        assert!(parse_accounts(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_add_chain_params_shape() {
        let network = NetworkConstants::default();
        let params = add_chain_params(&network);
        let entry = &params[0];
        assert_eq!(entry["chainId"], "0xa5bd");
        assert_eq!(entry["rpcUrls"][0], network.rpc_url.as_str());
        assert_eq!(entry["blockExplorerUrls"][0], network.explorer_url.as_str());
        assert_eq!(entry["nativeCurrency"]["symbol"], network.native_symbol.as_str());
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("metamask".parse::<ProviderKind>().unwrap(), ProviderKind::Keystore);
        assert_eq!(
            "WalletConnect".parse::<ProviderKind>().unwrap(),
            ProviderKind::WalletConnect
        );
        assert!("ledger".parse::<ProviderKind>().is_err());
    }
}
