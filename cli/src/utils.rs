use std::sync::Arc;

use colored::Colorize;
use dialoguer::{Confirm, Password};
use prettytable::{Cell, Row, Table};
use tempo_dex_sdk::amount;
use tempo_dex_sdk::views::{ProgressView, StepMark};
use tempo_dex_sdk::wallet::{ApprovalHandler, ApprovalRequest};
use tempo_dex_sdk::{
    Decimal, NetworkConstants, ProgressTracker, TempoWallet, TokenInfo, TokenList,
    TransactionProgress, WalletStorage,
};
use tokio::task::JoinHandle;

use crate::config::CliConfig;
use crate::error::CliError;

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

/// Print a table with data
pub fn print_table(headers: Vec<&str>, rows: Vec<Vec<String>>) {
    let mut table = Table::new();

    table.set_titles(Row::new(
        headers.iter().map(|h| Cell::new(h.as_ref())).collect(),
    ));

    for row_data in rows {
        table.add_row(Row::new(row_data.iter().map(|c| Cell::new(c)).collect()));
    }

    table.printstd();
}

/// Format a display amount with its token symbol
pub fn format_amount(value: Decimal, token: &TokenInfo) -> String {
    format!("{} {}", amount::format_display(value), token.symbol)
}

/// Look up a token by key or symbol
pub fn resolve_token<'a>(tokens: &'a TokenList, name: &str) -> Result<&'a TokenInfo, CliError> {
    tokens.get(name).ok_or_else(|| {
        let known: Vec<&str> = tokens.iter().map(|t| t.symbol.as_str()).collect();
        CliError::Parse(format!(
            "Unknown token '{}'. Known tokens: {}",
            name,
            known.join(", ")
        ))
    })
}

/// Yes/no prompt; `assume_yes` answers it without asking
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Prompt for a new keystore password
pub fn prompt_new_password() -> Result<String, CliError> {
    let password = Password::new()
        .with_prompt("Enter password for wallet encryption")
        .with_confirmation("Confirm password", "Passwords don't match")
        .interact()?;
    Ok(password)
}

/// Answers keystore prompts on the terminal
pub fn approval_handler(assume_yes: bool) -> ApprovalHandler {
    Arc::new(move |request: &ApprovalRequest| {
        if assume_yes {
            return true;
        }
        let prompt = match request {
            ApprovalRequest::ConnectAccount(address) => {
                format!("Allow TempoDEX to access account {:?}?", address)
            }
            ApprovalRequest::AddChain { chain_id, name } => {
                format!("Add network {} (chain {}) to the wallet and switch to it?", name, chain_id)
            }
        };
        Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .unwrap_or(false)
    })
}

/// Rebuild a wallet from its stored secret, a phrase or a hex private key
pub fn wallet_from_secret(secret: &str) -> Result<TempoWallet, CliError> {
    let secret = secret.trim();
    let wallet = if secret.split_whitespace().count() > 1 {
        TempoWallet::from_mnemonic(secret, 0)?
    } else {
        TempoWallet::from_private_key(secret)?
    };
    Ok(wallet)
}

/// Decrypt the active wallet, prompting for the password until it matches.
/// A password that worked earlier in this process is tried first.
pub fn unlock_active_wallet(
    config: &mut CliConfig,
    storage: &WalletStorage,
) -> Result<TempoWallet, CliError> {
    let name = config
        .active_wallet()
        .map(String::from)
        .ok_or_else(|| {
            CliError::Wallet("No active wallet. Create one with 'wallet create'".to_string())
        })?;
    if !storage.exists(&name) {
        return Err(CliError::Wallet(format!("Wallet '{}' not found", name)));
    }

    if let Some(password) = config.get_session_password() {
        match storage.load_wallet(&name, password) {
            Ok(secret) => return wallet_from_secret(&secret),
            Err(_) => config.clear_session_password(),
        }
    }

    println!("Unlock wallet '{}' (press Ctrl+C to cancel)", name);
    loop {
        let password = match Password::new().with_prompt("Enter password").interact() {
            Ok(password) => password,
            Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
                println!("Operation cancelled");
                return Err(CliError::Cancelled);
            }
            Err(e) => return Err(e.into()),
        };

        match storage.load_wallet(&name, &password) {
            Ok(secret) => {
                config.store_session_password(&password);
                return wallet_from_secret(&secret);
            }
            Err(_) => println!("{}", "Invalid password, please try again".red()),
        }
    }
}

/// Print each progress update of an operation until its tracker is dropped
pub fn follow_progress(tracker: &ProgressTracker, network: NetworkConstants) -> JoinHandle<()> {
    let mut updates = tracker.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let progress = updates.borrow_and_update().clone();
            if let Some(progress) = progress {
                print_progress_line(&progress, &network);
            }
        }
    })
}

fn print_progress_line(progress: &TransactionProgress, network: &NetworkConstants) {
    if progress.error {
        println!("  {} {}", "✗".red(), progress.message);
        return;
    }
    let total = progress.steps.len();
    let marker = if progress.success {
        "✓".green()
    } else {
        format!("[{}/{}]", progress.step, total).cyan()
    };
    println!("  {} {}", marker, progress.message);
    if let Some(hash) = progress.tx_hash {
        println!("      {}", network.tx_url(&format!("{:?}", hash)).dimmed());
    }
}

/// Stop following `tracker`, print where the operation ended and return
/// its final state
pub async fn finish_progress(
    tracker: ProgressTracker,
    printer: JoinHandle<()>,
    network: &NetworkConstants,
) -> Option<TransactionProgress> {
    let progress = tracker.current();
    drop(tracker);
    if let Err(e) = printer.await {
        tracing::debug!("Progress printer stopped: {}", e);
    }
    if let Some(progress) = &progress {
        print_progress_summary(progress, network);
    }
    progress
}

/// Step checklist of a finished operation
fn print_progress_summary(progress: &TransactionProgress, network: &NetworkConstants) {
    let view = ProgressView::new(progress, network);
    println!("\n{}", view.status.bold());
    for (label, mark) in &view.steps {
        let symbol = match mark {
            StepMark::Completed => "●".green(),
            StepMark::Active => "◐".yellow(),
            StepMark::Pending => "○".dimmed(),
        };
        println!("  {} {}", symbol, label);
    }
    if let Some(url) = view.explorer_url {
        println!("  View on explorer: {}", url);
    }
}
