use std::path::{Path, PathBuf};

use tempo_dex_sdk::Config;

use crate::error::CliError;

/// User configuration plus state that only lives for one CLI process
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: Config,
    path: PathBuf,
    session_password: Option<String>,
}

impl CliConfig {
    /// Load the file at `path`, writing defaults there when it is missing
    pub fn load_or_create(path: &Path) -> Result<Self, CliError> {
        let path = path.to_path_buf();
        let settings = Config::load_or_default(&path)?;
        if !path.exists() {
            settings.save(&path)?;
            tracing::info!("Created default config at {}", path.display());
        }

        Ok(Self {
            settings,
            path,
            session_password: None,
        })
    }

    pub fn save(&self) -> Result<(), CliError> {
        self.settings.save(&self.path)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        Config::default_path()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn active_wallet(&self) -> Option<&str> {
        self.settings.active_wallet.as_deref()
    }

    /// Switching wallets drops the account approval of the previous one
    pub fn set_active_wallet(&mut self, name: Option<String>) {
        if self.settings.active_wallet != name {
            self.settings.authorized = false;
            self.session_password = None;
        }
        self.settings.active_wallet = name;
    }

    pub fn set_authorized(&mut self, authorized: bool) {
        self.settings.authorized = authorized;
    }

    /// Remember the password that unlocked the active wallet
    pub fn store_session_password(&mut self, password: &str) {
        self.session_password = Some(password.to_string());
    }

    pub fn clear_session_password(&mut self) {
        self.session_password = None;
    }

    pub fn get_session_password(&self) -> Option<&str> {
        self.session_password.as_deref()
    }
}
