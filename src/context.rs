//! Application context
//!
//! One `AppContext` is created by the front end and passed to everything
//! that needs wallet or network state. It owns the wallet session, the
//! network manager, the event subscription to the active provider and the
//! recent-transaction list, plus the timers of the periodic refreshes.

use std::sync::Arc;

use ethers::types::{Address, TxHash};

use crate::config::{timing, TempoNetworkConfig};
use crate::error::Error;
use crate::gateway::DexContracts;
use crate::history::{HistorySource, RecentTransactions};
use crate::network::{NetworkManager, NetworkState};
use crate::provider::{EventSubscription, ProviderEvent, ProviderKind, ProviderRegistry, WalletProvider};
use crate::schedule::Cadence;
use crate::session::WalletSession;

pub struct AppContext {
    config: TempoNetworkConfig,
    session: WalletSession,
    network: NetworkManager,
    subscription: Option<EventSubscription>,
    history: RecentTransactions,
    history_source: Option<Arc<dyn HistorySource>>,
    block_refresh: Cadence,
    history_refresh: Cadence,
}

impl AppContext {
    pub fn new(config: TempoNetworkConfig, registry: ProviderRegistry) -> Self {
        let session = WalletSession::new(
            registry,
            config.contracts.clone(),
            config.tokens.clone(),
        );
        let network = NetworkManager::new(config.constants.clone());
        Self {
            config,
            session,
            network,
            subscription: None,
            history: RecentTransactions::default(),
            history_source: None,
            block_refresh: Cadence::new(timing::BLOCK_REFRESH),
            history_refresh: Cadence::new(timing::HISTORY_REFRESH),
        }
    }

    /// Where account history is read from
    pub fn with_history_source(mut self, source: Arc<dyn HistorySource>) -> Self {
        self.history_source = Some(source);
        self
    }

    /// Startup: listen to the primary provider, restore a previously
    /// authorized session and check the chain. Never fails.
    pub async fn start(&mut self) {
        let Some(provider) = self.active_provider() else {
            tracing::info!("No wallet provider available");
            return;
        };
        self.subscribe_to(provider.as_ref());
        self.session.auto_reconnect().await;
        self.network.check_network(provider.as_ref()).await;
    }

    pub fn config(&self) -> &TempoNetworkConfig {
        &self.config
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut WalletSession {
        &mut self.session
    }

    pub fn network(&self) -> &NetworkManager {
        &self.network
    }

    pub fn account(&self) -> Option<Address> {
        self.session.account()
    }

    /// Provider of the active session, else the first one present
    pub fn active_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.session
            .provider()
            .or_else(|| self.session.registry().primary())
    }

    pub async fn connect(&mut self, kind: ProviderKind) -> Result<Address, Error> {
        let account = self.session.connect(kind).await?;
        // Listen to the provider that owns the session from here on
        if let Some(provider) = self.session.provider() {
            self.subscribe_to(provider.as_ref());
            self.network.check_network(provider.as_ref()).await;
        }
        Ok(account)
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
        self.history.clear();
    }

    pub async fn check_network(&mut self) -> NetworkState {
        match self.active_provider() {
            Some(provider) => self.network.check_network(provider.as_ref()).await,
            None => self.network.state(),
        }
    }

    /// Switch the wallet to the required chain, registering it if needed
    pub async fn switch_network(&mut self) -> Result<NetworkState, Error> {
        let provider = self.active_provider().ok_or_else(|| {
            Error::ProviderUnavailable("No wallet provider available".to_string())
        })?;
        let state = self.network.switch_to_required(provider.as_ref()).await?;
        self.pump_events().await;
        Ok(state)
    }

    pub async fn refresh_block_number(&mut self) -> Option<u64> {
        let provider = self.active_provider()?;
        self.network.refresh_block_number(provider.as_ref()).await
    }

    /// Apply one environment event
    pub async fn handle_event(&mut self, event: ProviderEvent) {
        tracing::debug!("Wallet event: {:?}", event);
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let before = self.session.account();
                self.session.handle_accounts_changed(&accounts);
                if self.session.account() != before {
                    self.history.clear();
                }
            }
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::info!("Wallet chain changed to {}", chain_id);
                self.session.handle_chain_changed();
                if let Some(provider) = self.active_provider() {
                    self.network.on_chain_changed(provider.as_ref()).await;
                }
            }
        }
    }

    /// Apply every queued event. Returns how many were handled.
    pub async fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.subscription.as_mut().and_then(|s| s.try_next()) {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    pub fn history(&self) -> &RecentTransactions {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut RecentTransactions {
        &mut self.history
    }

    /// Show a transaction this client just submitted ahead of fetched history
    pub fn record_transaction(&mut self, hash: TxHash, input: &[u8]) {
        tracing::debug!("Recording submitted transaction {:?}", hash);
        self.history.push_pending(hash, input);
    }

    /// Refetch history from the configured source
    pub async fn refresh_history(&mut self) -> Result<(), Error> {
        let source = self
            .history_source
            .clone()
            .ok_or_else(|| Error::Config("No history source configured".to_string()))?;
        self.refresh_history_from(source.as_ref()).await
    }

    /// Refetch history from `source`, keeping locally submitted entries
    /// it does not know yet
    pub async fn refresh_history_from(&mut self, source: &dyn HistorySource) -> Result<(), Error> {
        let account = self.account().ok_or(Error::NotConnected)?;
        self.history.refresh(source, account).await
    }

    /// Run the periodic refreshes that fell due: the block number every
    /// `BLOCK_REFRESH` while on the required chain, history every
    /// `HISTORY_REFRESH` while connected. Returns how many ran.
    pub async fn poll_refresh(&mut self) -> usize {
        let mut ran = 0;

        if self.block_refresh.is_due() && self.network.is_matched() {
            self.refresh_block_number().await;
            ran += 1;
        }

        if self.history_refresh.is_due()
            && self.history_source.is_some()
            && self.session.is_connected()
        {
            if let Err(e) = self.refresh_history().await {
                tracing::warn!("History refresh failed: {}", e);
            }
            ran += 1;
        }

        ran
    }

    /// Signing gateway for a submission, or why there is none
    pub fn ensure_ready(&self) -> Result<Arc<dyn DexContracts>, Error> {
        let signer = self.session.signer()?;
        self.network.ensure_matched()?;
        Ok(signer)
    }

    /// Stop listening to provider events
    pub fn shutdown(&mut self) {
        self.subscription = None;
    }

    fn subscribe_to(&mut self, provider: &dyn WalletProvider) {
        self.subscription = Some(EventSubscription::new(provider));
    }
}
