//! Network connection manager
//!
//! Tracks the wallet's chain against the chain the DEX is deployed on and
//! drives the switch / add-chain flow.

use serde_json::json;

use crate::config::NetworkConstants;
use crate::error::Error;
use crate::provider::{
    add_chain_params, codes, methods, parse_chain_id, switch_chain_params, WalletProvider,
};

/// `Unknown -> Checking -> {Matched, Mismatched}`,
/// `Mismatched -> Switching -> {Matched, Mismatched}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Unknown,
    Checking,
    Matched,
    Mismatched,
    Switching,
}

/// Snapshot of the wallet's chain relative to the required chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkStatus {
    pub current_chain_id: Option<u64>,
    pub required_chain_id: u64,
    pub is_match: bool,
    pub switch_in_progress: bool,
}

pub struct NetworkManager {
    required: NetworkConstants,
    state: NetworkState,
    current_chain_id: Option<u64>,
    block_number: Option<u64>,
    checks: u64,
}

impl NetworkManager {
    pub fn new(required: NetworkConstants) -> Self {
        Self {
            required,
            state: NetworkState::Unknown,
            current_chain_id: None,
            block_number: None,
            checks: 0,
        }
    }

    pub fn required(&self) -> &NetworkConstants {
        &self.required
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    pub fn is_matched(&self) -> bool {
        self.state == NetworkState::Matched
    }

    pub fn current_chain_id(&self) -> Option<u64> {
        self.current_chain_id
    }

    /// Latest block seen while on the required chain
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    /// Number of chain checks issued so far
    pub fn check_count(&self) -> u64 {
        self.checks
    }

    pub fn status(&self) -> NetworkStatus {
        NetworkStatus {
            current_chain_id: self.current_chain_id,
            required_chain_id: self.required.chain_id,
            is_match: self.is_matched(),
            switch_in_progress: self.state == NetworkState::Switching,
        }
    }

    /// `Ok` only when the wallet sits on the required chain
    pub fn ensure_matched(&self) -> Result<(), Error> {
        if self.is_matched() {
            Ok(())
        } else {
            Err(Error::NetworkMismatch {
                current: self.current_chain_id,
                required: self.required.chain_id,
            })
        }
    }

    /// Query the wallet's chain id and classify it. A failed query keeps
    /// the last known chain.
    pub async fn check_network(&mut self, provider: &dyn WalletProvider) -> NetworkState {
        self.checks += 1;
        self.state = NetworkState::Checking;

        let chain_id = provider
            .request(methods::CHAIN_ID, json!([]))
            .await
            .map_err(Error::from)
            .and_then(|value| {
                value
                    .as_str()
                    .and_then(parse_chain_id)
                    .or_else(|| value.as_u64())
                    .ok_or_else(|| Error::Rpc(format!("Unexpected chain id {}", value)))
            });

        match chain_id {
            Ok(chain_id) => {
                if self.current_chain_id != Some(chain_id) {
                    tracing::info!("Wallet is on chain {}", chain_id);
                }
                self.current_chain_id = Some(chain_id);
            }
            Err(e) => tracing::warn!("Network check failed: {}", e),
        }

        self.settle();
        if !self.is_matched() {
            self.block_number = None;
        }
        self.state
    }

    /// Ask the wallet to switch to the required chain. An unrecognized
    /// chain is registered once with `wallet_addEthereumChain` and then
    /// re-checked; every other failure is returned as is.
    pub async fn switch_to_required(
        &mut self,
        provider: &dyn WalletProvider,
    ) -> Result<NetworkState, Error> {
        let chain_id = self.required.chain_id;
        self.state = NetworkState::Switching;
        tracing::info!("Switching wallet to chain {}", chain_id);

        match provider
            .request(methods::SWITCH_CHAIN, switch_chain_params(chain_id))
            .await
        {
            Ok(_) => Ok(self.check_network(provider).await),
            Err(e) if e.code == codes::UNRECOGNIZED_CHAIN => {
                tracing::info!("Chain {} unknown to wallet, registering it", chain_id);
                match provider
                    .request(methods::ADD_CHAIN, add_chain_params(&self.required))
                    .await
                {
                    Ok(_) => Ok(self.check_network(provider).await),
                    Err(add_error) => {
                        self.settle();
                        tracing::warn!("Adding chain {} failed: {}", chain_id, add_error);
                        Err(Error::from(add_error))
                    }
                }
            }
            Err(e) => {
                self.settle();
                tracing::warn!("Switching to chain {} failed: {}", chain_id, e);
                Err(Error::from(e))
            }
        }
    }

    /// Re-check after an environment `chainChanged` push
    pub async fn on_chain_changed(&mut self, provider: &dyn WalletProvider) -> NetworkState {
        self.check_network(provider).await
    }

    /// Refresh the block number; only runs while on the required chain
    pub async fn refresh_block_number(&mut self, provider: &dyn WalletProvider) -> Option<u64> {
        if !self.is_matched() {
            return None;
        }
        match provider.request(methods::BLOCK_NUMBER, json!([])).await {
            Ok(value) => match value.as_str().and_then(parse_chain_id) {
                Some(block) => self.block_number = Some(block),
                None => tracing::warn!("Unexpected block number {}", value),
            },
            Err(e) => tracing::warn!("Failed to fetch block: {}", e),
        }
        self.block_number
    }

    fn settle(&mut self) {
        self.state = match self.current_chain_id {
            Some(id) if id == self.required.chain_id => NetworkState::Matched,
            Some(_) => NetworkState::Mismatched,
            None => NetworkState::Unknown,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status() {
        let manager = NetworkManager::new(NetworkConstants::default());
        assert_eq!(manager.state(), NetworkState::Unknown);
        let status = manager.status();
        assert_eq!(status.current_chain_id, None);
        assert_eq!(status.required_chain_id, 42429);
        assert!(!status.is_match);
        assert!(!status.switch_in_progress);
        assert!(matches!(
            manager.ensure_matched(),
            Err(Error::NetworkMismatch { current: None, required: 42429 })
        ));
    }
}
