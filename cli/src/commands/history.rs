use std::sync::Arc;

use clap::Args;
use ethers::providers::{Http, Provider};
use tempo_dex_sdk::history::{TxStatus, HISTORY_LOOKBACK, MAX_HISTORY};
use tempo_dex_sdk::views::format_time;
use tempo_dex_sdk::BlockScanHistory;

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::print_table;

#[derive(Args, Clone)]
pub struct HistoryCommand {
    /// Number of transactions to show
    #[arg(short, long, default_value_t = MAX_HISTORY)]
    limit: usize,

    /// Number of recent blocks to scan
    #[arg(long, default_value_t = HISTORY_LOOKBACK)]
    blocks: u64,
}

impl HistoryCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        app.connect().await?;
        let context = app.context().await?;
        let network = context.config().constants.clone();

        let client = Provider::<Http>::try_from(network.rpc_url.as_str())
            .map_err(|e| CliError::Command(format!("Invalid RPC URL: {}", e)))?;
        let source = BlockScanHistory::new(Arc::new(client)).with_lookback(self.blocks);

        // Transactions sent earlier in this session stay on top until the
        // scan finds them
        context.history_mut().set_cap(self.limit);
        context.refresh_history_from(&source).await?;
        let recent = context.history();

        if recent.is_empty() {
            println!("No transactions found in the last {} blocks", self.blocks);
            return Ok(());
        }

        let rows = recent
            .entries()
            .into_iter()
            .map(|entry| {
                let hash = format!("{:?}", entry.hash);
                vec![
                    format!("{}...{}", &hash[..10], &hash[hash.len() - 8..]),
                    entry.method.to_string(),
                    entry
                        .timestamp
                        .map(format_time)
                        .unwrap_or_else(|| "-".to_string()),
                    match entry.status {
                        TxStatus::Pending => "Pending".to_string(),
                        TxStatus::Confirmed => "Confirmed".to_string(),
                    },
                    network.tx_url(&hash),
                ]
            })
            .collect();

        print_table(vec!["Hash", "Method", "Time", "Status", "Explorer"], rows);
        Ok(())
    }
}
