#[cfg(test)]
#[allow(dead_code)]
pub mod test_utils {
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex, Once};

    use async_trait::async_trait;
    use ethers::types::{Address, TxHash, U256};
    use serde_json::{json, Value};
    use tempo_dex_sdk::config::{ContractAddresses, TokenList};
    use tempo_dex_sdk::gateway::{
        AddLiquidityParams, DexContracts, RemoveLiquidityParams, Reserves, TxReceiptSummary,
    };
    use tempo_dex_sdk::provider::{
        chain_hex, methods, parse_chain_id, ProviderEvent, ProviderKind, ProviderRegistry,
        ProviderRpcError, WalletProvider,
    };
    use tempo_dex_sdk::{Error, TempoNetworkConfig};
    use tokio::sync::broadcast;

    pub const TEMPO_CHAIN: u64 = 42429;
    pub const MAINNET: u64 = 1;

    static INIT: Once = Once::new();

    /// Install a test subscriber once; `RUST_LOG` controls verbosity
    pub fn init_test_env() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }

    pub fn account(n: u64) -> Address {
        Address::from_low_u64_be(0xa000 + n)
    }

    pub fn tokens() -> TokenList {
        TokenList::default()
    }

    /// Whole tokens to base units
    pub fn units(amount: u64, decimals: u8) -> U256 {
        U256::from(amount) * U256::exp10(decimals as usize)
    }

    // ---------------------------------------------------------------------
    // Wallet provider
    // ---------------------------------------------------------------------

    struct WalletState {
        accounts: Vec<Address>,
        authorized: bool,
        approve_prompts: bool,
        chain_id: u64,
        known_chains: HashSet<u64>,
        reject_add_chain: bool,
        calls: HashMap<String, usize>,
        signer_calls: usize,
    }

    /// Scriptable EIP-1193 wallet
    pub struct MockProvider {
        kind: ProviderKind,
        state: Mutex<WalletState>,
        events: broadcast::Sender<ProviderEvent>,
        contracts: Arc<MockContracts>,
    }

    impl MockProvider {
        pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
            let (events, _) = broadcast::channel(32);
            let first = accounts.first().copied().unwrap_or_default();
            Self {
                kind: ProviderKind::Keystore,
                state: Mutex::new(WalletState {
                    accounts,
                    authorized: false,
                    approve_prompts: true,
                    chain_id,
                    known_chains: [MAINNET, chain_id].into_iter().collect(),
                    reject_add_chain: false,
                    calls: HashMap::new(),
                    signer_calls: 0,
                }),
                events,
                contracts: Arc::new(MockContracts::new(first)),
            }
        }

        pub fn with_kind(mut self, kind: ProviderKind) -> Self {
            self.kind = kind;
            self
        }

        /// The user approved this site earlier
        pub fn authorized(self) -> Self {
            self.state.lock().unwrap().authorized = true;
            self
        }

        pub fn rejecting_prompts(self) -> Self {
            self.state.lock().unwrap().approve_prompts = false;
            self
        }

        pub fn knowing_chain(self, chain_id: u64) -> Self {
            self.state.lock().unwrap().known_chains.insert(chain_id);
            self
        }

        pub fn rejecting_add_chain(self) -> Self {
            self.state.lock().unwrap().reject_add_chain = true;
            self
        }

        pub fn contracts(&self) -> Arc<MockContracts> {
            self.contracts.clone()
        }

        pub fn call_count(&self, method: &str) -> usize {
            self.state
                .lock()
                .unwrap()
                .calls
                .get(method)
                .copied()
                .unwrap_or(0)
        }

        pub fn signer_calls(&self) -> usize {
            self.state.lock().unwrap().signer_calls
        }

        pub fn chain_id(&self) -> u64 {
            self.state.lock().unwrap().chain_id
        }

        pub fn listener_count(&self) -> usize {
            self.events.receiver_count()
        }

        /// The user picked another chain in the wallet
        pub fn user_switches_chain(&self, chain_id: u64) {
            self.state.lock().unwrap().chain_id = chain_id;
            let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
        }

        /// The user picked other accounts (or locked the wallet with `[]`)
        pub fn user_changes_accounts(&self, accounts: Vec<Address>) {
            {
                let mut state = self.state.lock().unwrap();
                state.authorized = !accounts.is_empty();
                state.accounts = accounts.clone();
            }
            let _ = self.events.send(ProviderEvent::AccountsChanged(accounts));
        }

        fn emit(&self, event: ProviderEvent) {
            let _ = self.events.send(event);
        }
    }

    #[async_trait]
    impl WalletProvider for MockProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(method.to_string()).or_default() += 1;

            match method {
                methods::REQUEST_ACCOUNTS => {
                    if !state.authorized && !state.approve_prompts {
                        return Err(ProviderRpcError::user_rejected());
                    }
                    state.authorized = true;
                    Ok(json!(state.accounts))
                }
                methods::ACCOUNTS => {
                    if state.authorized {
                        Ok(json!(state.accounts))
                    } else {
                        Ok(json!([]))
                    }
                }
                methods::CHAIN_ID => Ok(json!(chain_hex(state.chain_id))),
                methods::BLOCK_NUMBER => Ok(json!("0x1a4")),
                methods::SWITCH_CHAIN => {
                    let chain_id = params[0]["chainId"]
                        .as_str()
                        .and_then(parse_chain_id)
                        .ok_or_else(|| ProviderRpcError::invalid_params("chainId"))?;
                    if !state.known_chains.contains(&chain_id) {
                        return Err(ProviderRpcError::unrecognized_chain(chain_id));
                    }
                    state.chain_id = chain_id;
                    drop(state);
                    self.emit(ProviderEvent::ChainChanged(chain_id));
                    Ok(Value::Null)
                }
                methods::ADD_CHAIN => {
                    if state.reject_add_chain {
                        return Err(ProviderRpcError::user_rejected());
                    }
                    let chain_id = params[0]["chainId"]
                        .as_str()
                        .and_then(parse_chain_id)
                        .ok_or_else(|| ProviderRpcError::invalid_params("chainId"))?;
                    state.known_chains.insert(chain_id);
                    state.chain_id = chain_id;
                    drop(state);
                    self.emit(ProviderEvent::ChainChanged(chain_id));
                    Ok(Value::Null)
                }
                methods::REVOKE_PERMISSIONS => {
                    state.authorized = false;
                    drop(state);
                    self.emit(ProviderEvent::AccountsChanged(Vec::new()));
                    Ok(Value::Null)
                }
                other => Err(ProviderRpcError::unsupported(other)),
            }
        }

        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.events.subscribe()
        }

        fn signer(
            &self,
            account: Address,
            _contracts: &ContractAddresses,
        ) -> Result<Arc<dyn DexContracts>, Error> {
            let mut state = self.state.lock().unwrap();
            state.signer_calls += 1;
            if !state.authorized || !state.accounts.contains(&account) {
                return Err(Error::Wallet(format!("{:?} is not authorized", account)));
            }
            Ok(self.contracts.clone())
        }
    }

    pub fn registry_with(provider: Arc<MockProvider>) -> ProviderRegistry {
        ProviderRegistry::new().with_provider(provider)
    }

    pub fn network_config() -> TempoNetworkConfig {
        TempoNetworkConfig::default()
    }

    // ---------------------------------------------------------------------
    // Contracts
    // ---------------------------------------------------------------------

    #[derive(Default)]
    struct Chain {
        balances: HashMap<(Address, Address), U256>,
        allowances: HashMap<(Address, Address), U256>,
        supplies: HashMap<Address, U256>,
        amount_out: Option<U256>,
        pairs: Vec<Address>,
        pair_tokens: HashMap<Address, (Address, Address)>,
        reserves: HashMap<Address, Reserves>,
        failing_mints: HashSet<Address>,
        swap_revert: Option<String>,
        add_revert: Option<String>,
        calls: Vec<String>,
        approvals: Vec<(Address, U256)>,
        swaps: Vec<(U256, U256)>,
        adds: Vec<AddLiquidityParams>,
        removes: Vec<RemoveLiquidityParams>,
        quote_calls: usize,
        next_hash: u64,
    }

    /// In-memory token, router, factory and pair contracts
    pub struct MockContracts {
        account: Address,
        router: Address,
        chain: Mutex<Chain>,
    }

    impl MockContracts {
        pub fn new(account: Address) -> Self {
            Self {
                account,
                router: ContractAddresses::default().router,
                chain: Mutex::new(Chain::default()),
            }
        }

        pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
            self.chain.lock().unwrap().balances.insert((token, owner), amount);
        }

        pub fn set_allowance(&self, token: Address, amount: U256) {
            self.chain
                .lock()
                .unwrap()
                .allowances
                .insert((token, self.account), amount);
        }

        /// Router price for any path; `None` makes `getAmountsOut` revert
        pub fn set_amount_out(&self, amount: Option<U256>) {
            self.chain.lock().unwrap().amount_out = amount;
        }

        /// Register a pair whose token0 is `token0`
        pub fn add_pair(
            &self,
            token0: Address,
            token1: Address,
            reserve0: u128,
            reserve1: u128,
            total_supply: U256,
        ) -> Address {
            let mut chain = self.chain.lock().unwrap();
            let pair = Address::from_low_u64_be(0xfeed + chain.pairs.len() as u64);
            chain.pairs.push(pair);
            chain.pair_tokens.insert(pair, (token0, token1));
            chain.reserves.insert(
                pair,
                Reserves {
                    reserve0,
                    reserve1,
                    block_timestamp_last: 0,
                },
            );
            chain.supplies.insert(pair, total_supply);
            pair
        }

        pub fn fail_mint(&self, token: Address) {
            self.chain.lock().unwrap().failing_mints.insert(token);
        }

        pub fn revert_swap(&self, reason: &str) {
            self.chain.lock().unwrap().swap_revert = Some(reason.to_string());
        }

        pub fn revert_add_liquidity(&self, reason: &str) {
            self.chain.lock().unwrap().add_revert = Some(reason.to_string());
        }

        /// Names of write calls and confirmations, in order
        pub fn calls(&self) -> Vec<String> {
            self.chain.lock().unwrap().calls.clone()
        }

        pub fn approvals(&self) -> Vec<(Address, U256)> {
            self.chain.lock().unwrap().approvals.clone()
        }

        /// `(amount_in, amount_out_min)` of every swap sent
        pub fn swaps(&self) -> Vec<(U256, U256)> {
            self.chain.lock().unwrap().swaps.clone()
        }

        pub fn adds(&self) -> Vec<AddLiquidityParams> {
            self.chain.lock().unwrap().adds.clone()
        }

        pub fn removes(&self) -> Vec<RemoveLiquidityParams> {
            self.chain.lock().unwrap().removes.clone()
        }

        /// Number of `getAmountsOut` reads
        pub fn quote_calls(&self) -> usize {
            self.chain.lock().unwrap().quote_calls
        }

        fn send(&self, chain: &mut Chain, call: &str) -> TxHash {
            chain.calls.push(call.to_string());
            chain.next_hash += 1;
            TxHash::from_low_u64_be(chain.next_hash)
        }
    }

    #[async_trait]
    impl DexContracts for MockContracts {
        fn account(&self) -> Address {
            self.account
        }

        fn router(&self) -> Address {
            self.router
        }

        async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, Error> {
            Ok(self
                .chain
                .lock()
                .unwrap()
                .balances
                .get(&(token, owner))
                .copied()
                .unwrap_or_default())
        }

        async fn decimals(&self, _token: Address) -> Result<u8, Error> {
            Ok(18)
        }

        async fn total_supply(&self, token: Address) -> Result<U256, Error> {
            Ok(self
                .chain
                .lock()
                .unwrap()
                .supplies
                .get(&token)
                .copied()
                .unwrap_or_default())
        }

        async fn allowance(
            &self,
            token: Address,
            owner: Address,
            _spender: Address,
        ) -> Result<U256, Error> {
            Ok(self
                .chain
                .lock()
                .unwrap()
                .allowances
                .get(&(token, owner))
                .copied()
                .unwrap_or_default())
        }

        async fn approve(
            &self,
            token: Address,
            _spender: Address,
            amount: U256,
        ) -> Result<TxHash, Error> {
            let mut chain = self.chain.lock().unwrap();
            chain.allowances.insert((token, self.account), amount);
            chain.approvals.push((token, amount));
            Ok(self.send(&mut chain, "approve"))
        }

        async fn mint(&self, token: Address, _amount: U256) -> Result<TxHash, Error> {
            let mut chain = self.chain.lock().unwrap();
            if chain.failing_mints.contains(&token) {
                chain.calls.push("mint".to_string());
                return Err(Error::TransactionReverted("mint reverted".to_string()));
            }
            Ok(self.send(&mut chain, "mint"))
        }

        async fn get_amounts_out(
            &self,
            amount_in: U256,
            path: Vec<Address>,
        ) -> Result<Vec<U256>, Error> {
            let mut chain = self.chain.lock().unwrap();
            chain.quote_calls += 1;
            match chain.amount_out {
                Some(out) if path.len() == 2 => Ok(vec![amount_in, out]),
                _ => Err(Error::Contract(
                    "getAmountsOut failed: INSUFFICIENT_LIQUIDITY".to_string(),
                )),
            }
        }

        async fn swap_exact_tokens_for_tokens(
            &self,
            amount_in: U256,
            amount_out_min: U256,
            _path: Vec<Address>,
            _to: Address,
            _deadline: U256,
        ) -> Result<TxHash, Error> {
            let mut chain = self.chain.lock().unwrap();
            if let Some(reason) = chain.swap_revert.clone() {
                chain.calls.push("swap".to_string());
                return Err(Error::TransactionReverted(reason));
            }
            chain.swaps.push((amount_in, amount_out_min));
            Ok(self.send(&mut chain, "swap"))
        }

        async fn add_liquidity(&self, params: &AddLiquidityParams) -> Result<TxHash, Error> {
            let mut chain = self.chain.lock().unwrap();
            if let Some(reason) = chain.add_revert.clone() {
                chain.calls.push("add_liquidity".to_string());
                return Err(Error::TransactionReverted(reason));
            }
            chain.adds.push(params.clone());
            Ok(self.send(&mut chain, "add_liquidity"))
        }

        async fn remove_liquidity(&self, params: &RemoveLiquidityParams) -> Result<TxHash, Error> {
            let mut chain = self.chain.lock().unwrap();
            chain.removes.push(params.clone());
            Ok(self.send(&mut chain, "remove_liquidity"))
        }

        async fn get_pair(&self, token_a: Address, token_b: Address) -> Result<Address, Error> {
            let chain = self.chain.lock().unwrap();
            Ok(chain
                .pair_tokens
                .iter()
                .find(|(_, (t0, t1))| {
                    (*t0 == token_a && *t1 == token_b) || (*t0 == token_b && *t1 == token_a)
                })
                .map(|(pair, _)| *pair)
                .unwrap_or_default())
        }

        async fn all_pairs_length(&self) -> Result<U256, Error> {
            Ok(U256::from(self.chain.lock().unwrap().pairs.len()))
        }

        async fn all_pairs(&self, index: U256) -> Result<Address, Error> {
            self.chain
                .lock()
                .unwrap()
                .pairs
                .get(index.as_usize())
                .copied()
                .ok_or_else(|| Error::Contract("allPairs: index out of range".to_string()))
        }

        async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), Error> {
            self.chain
                .lock()
                .unwrap()
                .pair_tokens
                .get(&pair)
                .copied()
                .ok_or_else(|| Error::Contract("token0 failed: not a pair".to_string()))
        }

        async fn get_reserves(&self, pair: Address) -> Result<Reserves, Error> {
            self.chain
                .lock()
                .unwrap()
                .reserves
                .get(&pair)
                .copied()
                .ok_or_else(|| Error::Contract("getReserves failed: not a pair".to_string()))
        }

        async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceiptSummary, Error> {
            self.chain.lock().unwrap().calls.push("wait".to_string());
            Ok(TxReceiptSummary {
                tx_hash,
                block_number: Some(420),
                gas_used: Some(U256::from(21_000u64)),
            })
        }
    }
}
