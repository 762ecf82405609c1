use clap::Args;
use colored::Colorize;
use tempo_dex_sdk::amount::format_display;
use tempo_dex_sdk::load_dashboard;
use tempo_dex_sdk::views::format_address;

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{format_amount, print_table};

#[derive(Args, Clone)]
pub struct DashboardCommand {
    /// Hide tokens with a zero balance
    #[arg(long)]
    hide_zero: bool,
}

impl DashboardCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let contracts = app.ready().await?;
        let context = app.context().await?;
        let tokens = context.config().tokens.clone();
        let account = contracts.account();

        let dashboard = load_dashboard(contracts.as_ref(), account, &tokens).await;
        context.session_mut().refresh_balances().await?;
        let block = context.refresh_block_number().await;

        println!("\n{} {}", "Account:".bold(), format_address(account));
        if let Some(block) = block {
            println!("{} {}", "Block:".bold(), block);
        }

        let rows: Vec<Vec<String>> = tokens
            .iter()
            .filter_map(|token| {
                let balance = dashboard.balances.get(&token.key).copied().unwrap_or_default();
                if self.hide_zero && balance.is_zero() {
                    return None;
                }
                Some(vec![
                    token.symbol.clone(),
                    token.name.clone(),
                    format_amount(balance, token),
                ])
            })
            .collect();

        if rows.is_empty() {
            println!("No token balances found");
        } else {
            print_table(vec!["Token", "Name", "Balance"], rows);
        }

        println!("\n{} {}", "Total balance:".bold(), format_display(dashboard.total_balance()));
        println!("{} {}", "Pairs:".bold(), dashboard.pools.pair_count);
        println!("{} {}", "Total value locked:".bold(), format_display(dashboard.pools.tvl));
        Ok(())
    }
}
