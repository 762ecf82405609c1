//! Wallet session lifecycle
//!
//! Connect, disconnect and silent reconnect against a `WalletProvider`, plus
//! the per-account balance snapshot that every view reads from.

use std::collections::HashMap;
use std::sync::Arc;

use ethers::types::Address;
use rust_decimal::Decimal;
use serde_json::json;

use crate::amount;
use crate::config::{ContractAddresses, TokenList};
use crate::error::Error;
use crate::gateway::DexContracts;
use crate::provider::{methods, parse_accounts, ProviderKind, ProviderRegistry, WalletProvider};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// An established session. The account and the signing capability only
/// ever exist together.
#[derive(Clone)]
pub struct Session {
    account: Address,
    signer: Arc<dyn DexContracts>,
    provider_kind: ProviderKind,
}

impl Session {
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn signer(&self) -> Arc<dyn DexContracts> {
        self.signer.clone()
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider_kind
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("provider_kind", &self.provider_kind)
            .finish()
    }
}

/// Token balances of the active account keyed by token key.
///
/// Every invalidation bumps `generation`; a refresh started under an older
/// generation is discarded instead of overwriting newer state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSnapshot {
    balances: HashMap<String, Decimal>,
    generation: u64,
}

impl BalanceSnapshot {
    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.balances.get(key).copied()
    }

    /// Balance or zero when unknown
    pub fn get_or_zero(&self, key: &str) -> Decimal {
        self.get(key).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.balances.iter()
    }

    /// Sum of all balances regardless of token, capped at `Decimal::MAX`
    pub fn total(&self) -> Decimal {
        amount::saturating_sum(self.balances.values().copied())
    }

    pub fn invalidate(&mut self) {
        self.balances.clear();
        self.generation += 1;
    }

    /// Store a fetched set of balances if nothing invalidated the snapshot
    /// since `generation` was read. Returns whether it was stored.
    pub fn replace_if_current(&mut self, generation: u64, balances: HashMap<String, Decimal>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding stale balances (generation {} != {})",
                generation,
                self.generation
            );
            return false;
        }
        self.balances = balances;
        true
    }
}

/// Wallet session manager
pub struct WalletSession {
    registry: ProviderRegistry,
    contracts: ContractAddresses,
    tokens: TokenList,
    state: ConnectionState,
    session: Option<Session>,
    provider: Option<Arc<dyn WalletProvider>>,
    balances: BalanceSnapshot,
    last_error: Option<String>,
}

impl WalletSession {
    pub fn new(registry: ProviderRegistry, contracts: ContractAddresses, tokens: TokenList) -> Self {
        Self {
            registry,
            contracts,
            tokens,
            state: ConnectionState::Disconnected,
            session: None,
            provider: None,
            balances: BalanceSnapshot::default(),
            last_error: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn account(&self) -> Option<Address> {
        self.session.as_ref().map(|s| s.account)
    }

    /// Signing capability of the active session
    pub fn signer(&self) -> Result<Arc<dyn DexContracts>, Error> {
        self.session
            .as_ref()
            .map(|s| s.signer.clone())
            .ok_or(Error::NotConnected)
    }

    /// Provider behind the active session
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.clone()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn tokens(&self) -> &TokenList {
        &self.tokens
    }

    pub fn balances(&self) -> &BalanceSnapshot {
        &self.balances
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Ask the wallet of `kind` for account access and start a session with
    /// the first account it returns.
    pub async fn connect(&mut self, kind: ProviderKind) -> Result<Address, Error> {
        let provider = match self.registry.get(kind) {
            Ok(provider) => provider,
            Err(e) => {
                self.last_error = Some(e.reason());
                return Err(e);
            }
        };

        self.last_error = None;

        match self.request_session(&provider).await {
            Ok(session) => {
                let account = session.account;
                tracing::info!("Connected {:?} via {}", account, kind.display_name());
                self.establish(provider, session);
                Ok(account)
            }
            Err(e) => {
                tracing::warn!("Connect via {} failed: {}", kind.display_name(), e);
                self.last_error = Some(e.reason());
                Err(e)
            }
        }
    }

    async fn request_session(&self, provider: &Arc<dyn WalletProvider>) -> Result<Session, Error> {
        let response = provider.request(methods::REQUEST_ACCOUNTS, json!([])).await?;
        let account = parse_accounts(&response)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Wallet("Wallet returned no accounts".to_string()))?;

        let signer = provider.signer(account, &self.contracts)?;
        Ok(Session {
            account,
            signer,
            provider_kind: provider.kind(),
        })
    }

    /// Drop the session and cached balances. Calling it again is a no-op.
    pub fn disconnect(&mut self) {
        if self.session.is_none() && self.balances.is_empty() && self.last_error.is_none() {
            return;
        }
        if let Some(session) = self.session.take() {
            tracing::info!("Disconnected {:?}", session.account);
        }
        self.provider = None;
        self.state = ConnectionState::Disconnected;
        self.last_error = None;
        self.balances.invalidate();
    }

    /// Restore a session for an account the wallet already authorized.
    /// Never prompts and never fails; returns whether a session exists.
    pub async fn auto_reconnect(&mut self) -> bool {
        if self.session.is_some() {
            return true;
        }
        let Some(provider) = self.registry.primary() else {
            return false;
        };

        let accounts = match provider.request(methods::ACCOUNTS, json!([])).await {
            Ok(value) => parse_accounts(&value),
            Err(e) => Err(Error::from(e)),
        };
        let account = match accounts {
            Ok(accounts) => match accounts.first() {
                Some(account) => *account,
                None => return false,
            },
            Err(e) => {
                tracing::warn!("Silent reconnect skipped: {}", e);
                return false;
            }
        };

        match provider.signer(account, &self.contracts) {
            Ok(signer) => {
                tracing::info!("Reconnected {:?}", account);
                let session = Session {
                    account,
                    signer,
                    provider_kind: provider.kind(),
                };
                self.establish(provider, session);
                true
            }
            Err(e) => {
                tracing::warn!("Silent reconnect skipped: {}", e);
                false
            }
        }
    }

    /// React to an `accountsChanged` push
    pub fn handle_accounts_changed(&mut self, accounts: &[Address]) {
        let Some(&first) = accounts.first() else {
            self.disconnect();
            return;
        };
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("Ignoring accountsChanged while disconnected");
            return;
        };

        if session.account != first {
            tracing::info!("Active account changed to {:?}", first);
            if let Some(provider) = &self.provider {
                match provider.signer(first, &self.contracts) {
                    Ok(signer) => {
                        session.account = first;
                        session.signer = signer;
                    }
                    Err(e) => {
                        tracing::warn!("No signer for {:?}: {}", first, e);
                        self.disconnect();
                        return;
                    }
                }
            }
        }
        self.balances.invalidate();
    }

    /// React to a `chainChanged` push: balances are stale and the signer
    /// must be rebound to the new chain.
    pub fn handle_chain_changed(&mut self) {
        self.balances.invalidate();

        let (Some(session), Some(provider)) = (self.session.as_mut(), self.provider.as_ref()) else {
            return;
        };
        match provider.signer(session.account, &self.contracts) {
            Ok(signer) => session.signer = signer,
            Err(e) => tracing::warn!("Could not rebind signer after chain change: {}", e),
        }
    }

    /// Fetch every token balance concurrently. A token that fails to load
    /// reads as zero.
    pub async fn refresh_balances(&mut self) -> Result<&BalanceSnapshot, Error> {
        let (account, signer) = match &self.session {
            Some(session) => (session.account, session.signer.clone()),
            None => return Err(Error::NotConnected),
        };
        let generation = self.balances.generation();

        let fetched = fetch_balances(signer.as_ref(), account, &self.tokens).await;
        self.balances.replace_if_current(generation, fetched);
        Ok(&self.balances)
    }

    fn establish(&mut self, provider: Arc<dyn WalletProvider>, session: Session) {
        self.session = Some(session);
        self.provider = Some(provider);
        self.state = ConnectionState::Connected;
        self.last_error = None;
        self.balances.invalidate();
    }
}

/// Balances of `owner` for every token in `tokens`, joined concurrently
pub async fn fetch_balances(
    contracts: &dyn DexContracts,
    owner: Address,
    tokens: &TokenList,
) -> HashMap<String, Decimal> {
    let calls = tokens.iter().map(|token| async move {
        let value = match contracts.balance_of(token.address, owner).await {
            Ok(raw) => amount::from_base_units(raw, token.decimals).unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Balance of {} unavailable: {}", token.symbol, e);
                Decimal::ZERO
            }
        };
        (token.key.clone(), value)
    });

    futures::future::join_all(calls).await.into_iter().collect()
}
