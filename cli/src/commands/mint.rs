use clap::Args;
use colored::Colorize;
use tempo_dex_sdk::contracts::selectors;
use tempo_dex_sdk::flows::MintEntry;
use tempo_dex_sdk::views::minter::MINT_PRECONDITION;
use tempo_dex_sdk::views::MinterView;
use tempo_dex_sdk::{mint_all, MintStatus, MintTracker};

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{confirm, print_success, print_table, print_warning};

#[derive(Args, Clone)]
pub struct MintCommand {
    /// Skip confirmation prompt
    #[arg(long)]
    yes: bool,
}

impl MintCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let contracts = match app.ready().await {
            Ok(contracts) => contracts,
            Err(CliError::Sdk(e)) => {
                tracing::debug!("Mint unavailable: {}", e);
                return Err(CliError::Blocked(MINT_PRECONDITION.to_string()));
            }
            Err(e) => return Err(e),
        };
        let assume_yes = self.yes || app.assume_yes;
        let context = app.context().await?;
        let tokens = context.config().tokens.clone();

        let symbols: Vec<&str> = tokens.iter().map(|t| t.symbol.as_str()).collect();
        println!("Mint the faucet amount of {}", symbols.join(", "));
        if !confirm("Mint all tokens?", assume_yes)? {
            return Err(CliError::Cancelled);
        }

        let tracker = MintTracker::default();
        let mut updates = tracker.subscribe();
        let printer = tokio::spawn(async move {
            let mut printed: Vec<MintEntry> = Vec::new();
            while updates.changed().await.is_ok() {
                let entries = updates.borrow_and_update().clone();
                for entry in entries.iter().filter(|e| !printed.contains(*e)) {
                    println!("  {} {}", entry.symbol, entry.status);
                }
                printed = entries;
            }
        });

        let report = mint_all(contracts.as_ref(), &tokens, &tracker).await;
        drop(tracker);
        if let Err(e) = printer.await {
            tracing::debug!("Mint printer stopped: {}", e);
        }

        for hash in report.entries.iter().filter_map(|e| e.tx_hash) {
            context.record_transaction(hash, &selectors::MINT);
        }

        let view = MinterView::new(report.entries.clone());
        let rows = view
            .rows()
            .into_iter()
            .zip(report.entries.iter())
            .map(|((symbol, status), entry)| {
                let status = match &entry.status {
                    MintStatus::Completed => status.green().to_string(),
                    MintStatus::Failed(reason) => format!("{} ({})", status.red(), reason),
                    _ => status,
                };
                vec![symbol, status]
            })
            .collect();
        print_table(vec!["Token", "Status"], rows);

        context.session_mut().refresh_balances().await?;
        if report.failed() == 0 {
            print_success(&format!("Minted {} tokens", report.completed()));
        } else {
            print_warning(&format!(
                "Minted {} tokens, {} failed",
                report.completed(),
                report.failed()
            ));
        }
        Ok(())
    }
}
