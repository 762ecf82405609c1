use std::sync::Arc;

use colored::Colorize;
use ethers::providers::{Http, Provider};
use tempo_dex_sdk::views::NetworkGuard;
use tempo_dex_sdk::{
    AppContext, BlockScanHistory, DexContracts, KeystoreProvider, ProviderKind, ProviderRegistry,
    WalletStorage,
};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::utils::{approval_handler, confirm, print_success, unlock_active_wallet};

/// State shared by every command of one CLI process. The wallet context is
/// built lazily so wallet management works without unlocking anything.
pub struct CliApp {
    pub config: CliConfig,
    pub assume_yes: bool,
    context: Option<AppContext>,
    context_wallet: Option<String>,
}

impl CliApp {
    pub fn new(config: CliConfig, assume_yes: bool) -> Self {
        Self {
            config,
            assume_yes,
            context: None,
            context_wallet: None,
        }
    }

    pub fn storage(&self) -> Result<WalletStorage, CliError> {
        Ok(WalletStorage::new()?)
    }

    /// Drop the current wallet context; the next command rebuilds it
    pub fn reset_context(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.shutdown();
        }
        self.context_wallet = None;
    }

    /// Context over the active keystore wallet, with pending wallet events
    /// applied
    pub async fn context(&mut self) -> Result<&mut AppContext, CliError> {
        let active = self.config.active_wallet().map(String::from);
        if active.is_none() || active != self.context_wallet {
            self.reset_context();
        }

        if self.context.is_none() {
            let storage = self.storage()?;
            let wallet = unlock_active_wallet(&mut self.config, &storage)?;
            let settings = &self.config.settings;
            let provider = KeystoreProvider::new(wallet, settings.network.constants.clone())
                .with_authorization(settings.authorized)
                .with_approval(approval_handler(self.assume_yes));
            let registry = ProviderRegistry::new().with_provider(Arc::new(provider));

            let mut context = AppContext::new(settings.network.clone(), registry);
            match Provider::<Http>::try_from(settings.network.constants.rpc_url.as_str()) {
                Ok(client) => {
                    context = context
                        .with_history_source(Arc::new(BlockScanHistory::new(Arc::new(client))));
                }
                Err(e) => tracing::warn!("History unavailable, invalid RPC URL: {}", e),
            }
            context.start().await;
            self.context = Some(context);
            self.context_wallet = active;
        }

        let context = self
            .context
            .as_mut()
            .ok_or_else(|| CliError::Wallet("Wallet context unavailable".to_string()))?;
        context.pump_events().await;
        Ok(context)
    }

    /// Connect the keystore, remembering the approval for silent reconnects
    pub async fn connect(&mut self) -> Result<(), CliError> {
        let context = self.context().await?;
        if context.session().is_connected() {
            return Ok(());
        }
        let account = context.connect(ProviderKind::Keystore).await?;
        print_success(&format!("Connected {:?}", account));

        self.config.set_authorized(true);
        self.config.save()?;
        Ok(())
    }

    /// Connected and on the required chain; offers a switch when the wallet
    /// sits elsewhere
    pub async fn ready(&mut self) -> Result<Arc<dyn DexContracts>, CliError> {
        self.connect().await?;
        let assume_yes = self.assume_yes;
        let context = self.context().await?;

        if !context.network().is_matched() {
            let network = context.config().constants.clone();
            let guard = NetworkGuard::new(&context.network().status(), true, &network);
            println!("{}", guard.title.red().bold());
            println!("{}", guard.description);
            if confirm(&format!("{}?", guard.button.text), assume_yes)? {
                context.switch_network().await?;
                print_success(&format!("Switched to {}", network.network_name));
            }
        }

        Ok(context.ensure_ready()?)
    }

    /// Apply queued wallet events and run the periodic refreshes that fell
    /// due. Never builds a context, so it never prompts.
    pub async fn refresh_due(&mut self) {
        if let Some(context) = self.context.as_mut() {
            context.pump_events().await;
            let ran = context.poll_refresh().await;
            if ran > 0 {
                tracing::debug!("Ran {} periodic refreshes", ran);
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.reset_context();
    }
}
