use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::Password;
use tempo_dex_sdk::TempoWallet;

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{confirm, print_success, print_table, prompt_new_password, wallet_from_secret};

#[derive(Args, Clone)]
pub struct WalletCommand {
    #[command(subcommand)]
    command: WalletCommands,
}

#[derive(Subcommand, Clone)]
enum WalletCommands {
    /// Create a new wallet
    Create {
        /// Wallet name
        #[arg(short, long)]
        name: String,
    },

    /// Import an existing wallet from a mnemonic or private key
    Import {
        /// Wallet name
        #[arg(short, long)]
        name: String,

        /// Mnemonic phrase or hex private key (prompted when omitted)
        #[arg(short, long)]
        secret: Option<String>,
    },

    /// List all wallets
    List,

    /// Set a wallet as the active wallet
    Use {
        /// Wallet name
        name: String,
    },

    /// Export the secret of a wallet
    Export {
        /// Wallet name (if not provided, uses active wallet)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove a wallet
    Remove {
        /// Wallet name
        name: String,

        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

impl WalletCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let storage = app.storage()?;

        match self.command {
            WalletCommands::Create { name } => {
                let (wallet, mnemonic) = TempoWallet::generate()?;

                println!("\n{}\n", "Your mnemonic phrase (KEEP THIS SAFE):".yellow());
                println!("{}\n", mnemonic);

                if !confirm("Have you saved your mnemonic phrase in a safe place?", false)? {
                    return Err(CliError::Command(
                        "Wallet creation cancelled - please save your mnemonic before continuing"
                            .to_string(),
                    ));
                }

                let password = prompt_new_password()?;
                let address = wallet.info().address;
                storage.save_wallet(&name, &mnemonic, &password, &address)?;
                activate(app, &name, &password)?;

                print_success(&format!("Wallet '{}' created, encrypted, and set as active", name));
                println!("\nWallet address: {}", address);
                Ok(())
            }

            WalletCommands::Import { name, secret } => {
                let secret = match secret {
                    Some(s) => s,
                    None => Password::new()
                        .with_prompt("Enter your mnemonic phrase or private key")
                        .interact()?,
                };
                let wallet = wallet_from_secret(&secret)
                    .map_err(|e| CliError::Wallet(format!("Invalid secret: {}", e)))?;

                let password = prompt_new_password()?;
                let address = wallet.info().address;
                storage.save_wallet(&name, secret.trim(), &password, &address)?;
                activate(app, &name, &password)?;

                print_success(&format!("Wallet '{}' imported, encrypted, and set as active", name));
                println!("\nWallet address: {}", address);
                Ok(())
            }

            WalletCommands::List => {
                let wallets = storage.list_wallets()?;
                if wallets.is_empty() {
                    println!("No wallets configured. Use 'wallet create' or 'wallet import' to add a wallet.");
                    return Ok(());
                }

                let active = app.config.active_wallet();
                let rows = wallets
                    .into_iter()
                    .map(|w| {
                        let marker = if active == Some(w.name.as_str()) {
                            "✓".green().to_string()
                        } else {
                            String::new()
                        };
                        vec![
                            marker,
                            w.name,
                            w.address,
                            w.last_accessed.unwrap_or_else(|| "never".to_string()),
                        ]
                    })
                    .collect();

                print_table(vec!["Active", "Name", "Address", "Last used"], rows);
                Ok(())
            }

            WalletCommands::Use { name } => {
                if !storage.exists(&name) {
                    return Err(CliError::Wallet(format!("Wallet '{}' not found", name)));
                }
                let password = Password::new()
                    .with_prompt(format!("Enter password to unlock wallet '{}'", name))
                    .interact()?;
                storage
                    .load_wallet(&name, &password)
                    .map_err(|_| CliError::Wallet("Invalid password".to_string()))?;

                activate(app, &name, &password)?;
                print_success(&format!("Wallet '{}' set as active", name));
                Ok(())
            }

            WalletCommands::Export { name } => {
                let wallet_name = match name {
                    Some(n) => n,
                    None => app
                        .config
                        .active_wallet()
                        .map(String::from)
                        .ok_or_else(|| CliError::Wallet("No active wallet set".to_string()))?,
                };

                if !confirm(
                    "WARNING: You are about to display your wallet secret. Make sure no one can see your screen. Continue?",
                    false,
                )? {
                    return Ok(());
                }

                let password = Password::new()
                    .with_prompt(format!("Enter password to unlock wallet '{}'", wallet_name))
                    .interact()?;
                let secret = storage
                    .load_wallet(&wallet_name, &password)
                    .map_err(|_| CliError::Wallet("Invalid password".to_string()))?;

                println!("\n{}\n", "Your wallet secret (KEEP THIS SAFE):".yellow());
                println!("{}\n", secret);
                Ok(())
            }

            WalletCommands::Remove { name, yes } => {
                if !storage.exists(&name) {
                    return Err(CliError::Wallet(format!("Wallet '{}' not found", name)));
                }
                if !confirm(
                    &format!("Are you sure you want to remove wallet '{}'?", name),
                    yes || app.assume_yes,
                )? {
                    return Ok(());
                }

                storage.delete_wallet(&name)?;
                if app.config.active_wallet() == Some(name.as_str()) {
                    app.reset_context();
                    app.config.set_active_wallet(None);
                    app.config.save()?;
                }

                print_success(&format!("Wallet '{}' removed", name));
                Ok(())
            }
        }
    }
}

/// Make `name` the active wallet and keep its password for this session
fn activate(app: &mut CliApp, name: &str, password: &str) -> Result<(), CliError> {
    app.reset_context();
    app.config.set_active_wallet(Some(name.to_string()));
    app.config.store_session_password(password);
    app.config.save()
}
