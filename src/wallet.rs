use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::coins_bip39::{English, Mnemonic};
use ethers::signers::{LocalWallet, MnemonicBuilder, Signer};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::config::{ContractAddresses, NetworkConstants};
use crate::error::Error;
use crate::gateway::{ContractGateway, DexContracts};
use crate::provider::{
    chain_hex, methods, parse_chain_id, ProviderEvent, ProviderKind, ProviderRpcError,
    WalletProvider,
};

pub mod storage;

pub use storage::{WalletMetadata, WalletStorage};

/// Signing middleware used for keystore accounts
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Capacity of the wallet event channel
const EVENT_CAPACITY: usize = 32;

/// TempoDEX wallet: one secp256k1 key on the standard Ethereum path
#[derive(Clone)]
pub struct TempoWallet {
    signer: LocalWallet,
}

/// Wallet info that can be serialized safely
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    /// The wallet address
    pub address: String,
}

impl TempoWallet {
    /// Create a new wallet from a mnemonic (path m/44'/60'/0'/0/{account_index})
    pub fn from_mnemonic(mnemonic: &str, account_index: u32) -> Result<Self, Error> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(mnemonic.trim())
            .index(account_index)
            .map_err(|e| Error::Wallet(format!("Invalid derivation index: {}", e)))?
            .build()
            .map_err(|e| Error::Wallet(format!("Invalid mnemonic: {}", e)))?;

        Ok(Self { signer })
    }

    /// Create a wallet from a hex private key
    pub fn from_private_key(key: &str) -> Result<Self, Error> {
        let signer = LocalWallet::from_str(key.trim().trim_start_matches("0x"))
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;
        Ok(Self { signer })
    }

    /// Generate a new random wallet, returning the wallet and its phrase
    pub fn generate() -> Result<(Self, String), Error> {
        let mut rng = rand::thread_rng();
        let mnemonic = Mnemonic::<English>::new_with_count(&mut rng, 12)
            .map_err(|e| Error::Wallet(format!("Failed to generate mnemonic: {}", e)))?;

        let phrase = mnemonic.to_phrase();
        let wallet = Self::from_mnemonic(&phrase, 0)?;

        Ok((wallet, phrase))
    }

    /// Get the wallet's address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signer bound to `chain_id`
    pub fn local_wallet(&self, chain_id: u64) -> LocalWallet {
        self.signer.clone().with_chain_id(chain_id)
    }

    /// Get wallet info
    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            address: format!("{:?}", self.address()),
        }
    }
}

/// Prompts the keystore raises before granting something
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalRequest {
    /// Expose `account` to the DEX
    ConnectAccount(Address),
    /// Register a new chain and switch to it
    AddChain { chain_id: u64, name: String },
}

/// Decides approval prompts (interactive confirm in the CLI, fixed answer in tests)
pub type ApprovalHandler = Arc<dyn Fn(&ApprovalRequest) -> bool + Send + Sync>;

struct KeystoreState {
    authorized: bool,
    current_chain: u64,
    chains: HashMap<u64, NetworkConstants>,
}

/// In-process EIP-1193 wallet over a local keystore.
pub struct KeystoreProvider {
    wallet: TempoWallet,
    state: Mutex<KeystoreState>,
    events: broadcast::Sender<ProviderEvent>,
    approval: ApprovalHandler,
}

impl KeystoreProvider {
    /// Wallet starting on `home`, which is the only chain it knows about
    pub fn new(wallet: TempoWallet, home: NetworkConstants) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let current_chain = home.chain_id;
        let mut chains = HashMap::new();
        chains.insert(home.chain_id, home);

        Self {
            wallet,
            state: Mutex::new(KeystoreState {
                authorized: false,
                current_chain,
                chains,
            }),
            events,
            approval: Arc::new(|_| true),
        }
    }

    /// Replace the approval prompt
    pub fn with_approval(mut self, approval: ApprovalHandler) -> Self {
        self.approval = approval;
        self
    }

    /// Mark the account as already authorized (a previous session approved it)
    pub fn with_authorization(self, authorized: bool) -> Self {
        self.lock_state().authorized = authorized;
        self
    }

    /// Register an extra chain without switching to it
    pub fn with_chain(self, chain: NetworkConstants) -> Self {
        self.lock_state().chains.insert(chain.chain_id, chain);
        self
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn is_authorized(&self) -> bool {
        self.lock_state().authorized
    }

    pub fn current_chain(&self) -> u64 {
        self.lock_state().current_chain
    }

    pub fn knows_chain(&self, chain_id: u64) -> bool {
        self.lock_state().chains.contains_key(&chain_id)
    }

    /// Number of live event listeners
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Read-only RPC client for the current chain
    pub fn rpc_provider(&self) -> Result<Provider<Http>, Error> {
        let url = self.current_rpc_url()?;
        Provider::<Http>::try_from(url.as_str())
            .map_err(|e| Error::Rpc(format!("Invalid RPC URL {}: {}", url, e)))
    }

    fn current_rpc_url(&self) -> Result<String, Error> {
        let state = self.lock_state();
        state
            .chains
            .get(&state.current_chain)
            .map(|c| c.rpc_url.clone())
            .ok_or_else(|| Error::Wallet(format!("Unknown chain {}", state.current_chain)))
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, KeystoreState> {
        // State is only mutated in short non-panicking sections
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, event: ProviderEvent) {
        tracing::debug!("Keystore event: {:?}", event);
        // No listeners is fine
        let _ = self.events.send(event);
    }

    fn request_accounts(&self) -> Result<Value, ProviderRpcError> {
        let address = self.address();
        if !self.is_authorized() {
            if !(self.approval)(&ApprovalRequest::ConnectAccount(address)) {
                return Err(ProviderRpcError::user_rejected());
            }
            self.lock_state().authorized = true;
            self.emit(ProviderEvent::AccountsChanged(vec![address]));
        }
        Ok(json!([format!("{:?}", address)]))
    }

    fn accounts(&self) -> Value {
        if self.is_authorized() {
            json!([format!("{:?}", self.address())])
        } else {
            json!([])
        }
    }

    fn switch_chain(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let chain_id = chain_id_param(params)?;
        {
            let mut state = self.lock_state();
            if !state.chains.contains_key(&chain_id) {
                return Err(ProviderRpcError::unrecognized_chain(chain_id));
            }
            if state.current_chain == chain_id {
                return Ok(Value::Null);
            }
            state.current_chain = chain_id;
        }
        self.emit(ProviderEvent::ChainChanged(chain_id));
        Ok(Value::Null)
    }

    fn add_chain(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let chain = chain_from_params(params)?;
        let chain_id = chain.chain_id;

        let request = ApprovalRequest::AddChain {
            chain_id,
            name: chain.network_name.clone(),
        };
        if !(self.approval)(&request) {
            return Err(ProviderRpcError::user_rejected());
        }

        let switched = {
            let mut state = self.lock_state();
            state.chains.insert(chain_id, chain);
            let switched = state.current_chain != chain_id;
            state.current_chain = chain_id;
            switched
        };
        if switched {
            self.emit(ProviderEvent::ChainChanged(chain_id));
        }
        Ok(Value::Null)
    }

    fn revoke(&self) -> Value {
        let was_authorized = {
            let mut state = self.lock_state();
            std::mem::replace(&mut state.authorized, false)
        };
        if was_authorized {
            self.emit(ProviderEvent::AccountsChanged(Vec::new()));
        }
        Value::Null
    }

    async fn block_number(&self) -> Result<Value, ProviderRpcError> {
        let provider = self
            .rpc_provider()
            .map_err(|e| ProviderRpcError::new(crate::provider::codes::INTERNAL, e.to_string()))?;
        let block = provider
            .get_block_number()
            .await
            .map_err(|e| ProviderRpcError::new(crate::provider::codes::INTERNAL, e.to_string()))?;
        Ok(json!(format!("0x{:x}", block.as_u64())))
    }
}

#[async_trait]
impl WalletProvider for KeystoreProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Keystore
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        tracing::debug!("Keystore request {}", method);
        match method {
            methods::REQUEST_ACCOUNTS => self.request_accounts(),
            methods::ACCOUNTS => Ok(self.accounts()),
            methods::CHAIN_ID => Ok(json!(chain_hex(self.current_chain()))),
            methods::BLOCK_NUMBER => self.block_number().await,
            methods::SWITCH_CHAIN => self.switch_chain(&params),
            methods::ADD_CHAIN => self.add_chain(&params),
            methods::REVOKE_PERMISSIONS => Ok(self.revoke()),
            other => Err(ProviderRpcError::unsupported(other)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    fn signer(
        &self,
        account: Address,
        contracts: &ContractAddresses,
    ) -> Result<Arc<dyn DexContracts>, Error> {
        if !self.is_authorized() || account != self.address() {
            return Err(Error::Wallet(format!(
                "Account {:?} is not authorized",
                account
            )));
        }

        let provider = self.rpc_provider()?;
        let client = SignerMiddleware::new(provider, self.wallet.local_wallet(self.current_chain()));
        Ok(Arc::new(ContractGateway::new(
            Arc::new(client),
            account,
            contracts.clone(),
        )))
    }
}

fn chain_id_param(params: &Value) -> Result<u64, ProviderRpcError> {
    params
        .get(0)
        .and_then(|p| p.get("chainId"))
        .and_then(|c| c.as_str())
        .and_then(parse_chain_id)
        .ok_or_else(|| ProviderRpcError::invalid_params("Missing or invalid chainId"))
}

fn chain_from_params(params: &Value) -> Result<NetworkConstants, ProviderRpcError> {
    let chain_id = chain_id_param(params)?;
    let entry = &params[0];

    let first = |key: &str| {
        entry
            .get(key)
            .and_then(|v| v.get(0))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let rpc_url =
        first("rpcUrls").ok_or_else(|| ProviderRpcError::invalid_params("Missing rpcUrls"))?;
    let currency = &entry["nativeCurrency"];

    Ok(NetworkConstants {
        network_name: entry["chainName"]
            .as_str()
            .unwrap_or("Unknown network")
            .to_string(),
        chain_id,
        rpc_url,
        explorer_url: first("blockExplorerUrls").unwrap_or_default(),
        native_currency_name: currency["name"].as_str().unwrap_or("ETH").to_string(),
        native_symbol: currency["symbol"].as_str().unwrap_or("ETH").to_string(),
        native_decimals: currency["decimals"].as_u64().unwrap_or(18) as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{add_chain_params, codes, parse_accounts, switch_chain_params};

    const PHRASE: &str = "test test test test test test test test test test test junk";

    fn mainnet() -> NetworkConstants {
        NetworkConstants {
            network_name: "Ethereum".to_string(),
            chain_id: 1,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            ..NetworkConstants::default()
        }
    }

    #[test]
    fn test_wallet_from_known_mnemonic() {
        let wallet = TempoWallet::from_mnemonic(PHRASE, 0).unwrap();
        assert_eq!(
            wallet.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
        let second = TempoWallet::from_mnemonic(PHRASE, 1).unwrap();
        assert_ne!(wallet.address(), second.address());
    }

    #[test]
    fn test_wallet_generate_round_trip() {
        let (wallet, phrase) = TempoWallet::generate().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 12);
        let recreated = TempoWallet::from_mnemonic(&phrase, 0).unwrap();
        assert_eq!(wallet.address(), recreated.address());
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        assert!(TempoWallet::from_mnemonic("not a real phrase", 0).is_err());
    }

    #[tokio::test]
    async fn test_request_accounts_prompts_once() {
        let wallet = TempoWallet::from_mnemonic(PHRASE, 0).unwrap();
        let provider = KeystoreProvider::new(wallet, mainnet());
        let mut events = provider.subscribe();

        let silent = provider.request(methods::ACCOUNTS, json!([])).await.unwrap();
        assert!(parse_accounts(&silent).unwrap().is_empty());

        let granted = provider
            .request(methods::REQUEST_ACCOUNTS, json!([]))
            .await
            .unwrap();
        assert_eq!(parse_accounts(&granted).unwrap(), vec![provider.address()]);
        assert_eq!(
            events.try_recv().unwrap(),
            ProviderEvent::AccountsChanged(vec![provider.address()])
        );

        let silent = provider.request(methods::ACCOUNTS, json!([])).await.unwrap();
        assert_eq!(parse_accounts(&silent).unwrap(), vec![provider.address()]);
    }

    #[tokio::test]
    async fn test_denied_prompt_is_4001() {
        let wallet = TempoWallet::from_mnemonic(PHRASE, 0).unwrap();
        let provider = KeystoreProvider::new(wallet, mainnet()).with_approval(Arc::new(|_| false));

        let err = provider
            .request(methods::REQUEST_ACCOUNTS, json!([]))
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::USER_REJECTED_REQUEST);
        assert!(!provider.is_authorized());
    }

    #[tokio::test]
    async fn test_switch_unknown_chain_then_add() {
        let wallet = TempoWallet::from_mnemonic(PHRASE, 0).unwrap();
        let provider = KeystoreProvider::new(wallet, mainnet());
        let tempo = NetworkConstants::default();

        let err = provider
            .request(methods::SWITCH_CHAIN, switch_chain_params(tempo.chain_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::UNRECOGNIZED_CHAIN);

        provider
            .request(methods::ADD_CHAIN, add_chain_params(&tempo))
            .await
            .unwrap();
        assert!(provider.knows_chain(tempo.chain_id));
        assert_eq!(provider.current_chain(), tempo.chain_id);

        let chain = provider.request(methods::CHAIN_ID, json!([])).await.unwrap();
        assert_eq!(chain, json!("0xa5bd"));
    }

    #[tokio::test]
    async fn test_revoke_emits_empty_accounts() {
        let wallet = TempoWallet::from_mnemonic(PHRASE, 0).unwrap();
        let provider = KeystoreProvider::new(wallet, mainnet()).with_authorization(true);
        let mut events = provider.subscribe();

        provider
            .request(methods::REVOKE_PERMISSIONS, json!([]))
            .await
            .unwrap();
        assert!(!provider.is_authorized());
        assert_eq!(
            events.try_recv().unwrap(),
            ProviderEvent::AccountsChanged(Vec::new())
        );
    }

    #[test]
    fn test_signer_requires_authorization() {
        let wallet = TempoWallet::from_mnemonic(PHRASE, 0).unwrap();
        let provider = KeystoreProvider::new(wallet, mainnet());
        let contracts = ContractAddresses::default();

        assert!(provider.signer(provider.address(), &contracts).is_err());

        let provider = provider.with_authorization(true);
        let gateway = provider.signer(provider.address(), &contracts).unwrap();
        assert_eq!(gateway.account(), provider.address());
        assert_eq!(gateway.router(), contracts.router);
    }

    #[test]
    fn test_listener_count_tracks_subscriptions() {
        let wallet = TempoWallet::from_mnemonic(PHRASE, 0).unwrap();
        let provider = KeystoreProvider::new(wallet, mainnet());
        let first = provider.subscribe();
        let second = provider.subscribe();
        assert_eq!(provider.listener_count(), 2);
        drop(first);
        drop(second);
        assert_eq!(provider.listener_count(), 0);
    }
}
