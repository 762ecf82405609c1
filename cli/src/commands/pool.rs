use clap::Args;
use tempo_dex_sdk::amount::format_display;
use tempo_dex_sdk::fetch_pool;
use tempo_dex_sdk::views::format_address;

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{format_amount, print_table, resolve_token};

/// Reserves, price and your position in the pool of two tokens
#[derive(Args, Clone)]
pub struct PoolCommand {
    /// First token (key or symbol)
    #[arg(long)]
    token_a: String,

    /// Second token (key or symbol)
    #[arg(long)]
    token_b: String,
}

impl PoolCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let contracts = app.ready().await?;
        let tokens = app.config.settings.network.tokens.clone();

        let token_a = resolve_token(&tokens, &self.token_a)?;
        let token_b = resolve_token(&tokens, &self.token_b)?;
        let pool = fetch_pool(
            contracts.as_ref(),
            token_a,
            token_b,
            Some(contracts.account()),
        )
        .await?;

        let Some(pair) = pool.pair else {
            println!("No pool exists for {}/{}", token_a.symbol, token_b.symbol);
            return Ok(());
        };

        let rate = pool
            .exchange_rate()
            .map(|r| format!("1 {} = {} {}", token_a.symbol, format_display(r), token_b.symbol))
            .unwrap_or_else(|| "-".to_string());

        print_table(
            vec!["Field", "Value"],
            vec![
                vec!["Pair".to_string(), format_address(pair)],
                vec![
                    format!("{} reserve", token_a.symbol),
                    format_amount(pool.reserve_a, token_a),
                ],
                vec![
                    format!("{} reserve", token_b.symbol),
                    format_amount(pool.reserve_b, token_b),
                ],
                vec!["Price".to_string(), rate],
                vec!["Your LP tokens".to_string(), format_display(pool.lp_balance)],
                vec![
                    "Your share".to_string(),
                    format!("{}%", format_display(pool.share_percent)),
                ],
            ],
        );
        Ok(())
    }
}
