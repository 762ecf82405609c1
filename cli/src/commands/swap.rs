use clap::Args;
use tempo_dex_sdk::amount::format_display;
use tempo_dex_sdk::contracts::selectors;
use tempo_dex_sdk::quote::NO_LIQUIDITY;
use tempo_dex_sdk::views::SwapForm;
use tempo_dex_sdk::{execute_swap, fetch_pool, fetch_quote, Error, ProgressTracker, QuoteState};

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{confirm, finish_progress, follow_progress, print_success, resolve_token};

#[derive(Args, Clone)]
pub struct SwapCommand {
    /// Token to sell (key or symbol, e.g. TMETH)
    #[arg(short, long, default_value = "TmEth")]
    from: String,

    /// Token to buy (key or symbol, e.g. OMUSD)
    #[arg(short, long, default_value = "OmUsd")]
    to: String,

    /// Amount of the sold token
    #[arg(short, long, required_unless_present = "max")]
    amount: Option<String>,

    /// Sell 99.9% of the balance
    #[arg(long)]
    max: bool,

    /// Slippage tolerance in percent (0.1 to 50)
    #[arg(short, long)]
    slippage: Option<String>,

    /// Skip confirmation prompt
    #[arg(long)]
    yes: bool,

    /// Only quote the swap without executing it
    #[arg(long)]
    simulate: bool,
}

impl SwapCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let contracts = app.ready().await?;
        let assume_yes = self.yes || app.assume_yes;
        let default_slippage = app.config.settings.default_slippage;
        let context = app.context().await?;
        let tokens = context.config().tokens.clone();
        let network = context.config().constants.clone();

        let from = resolve_token(&tokens, &self.from)?.clone();
        let to = resolve_token(&tokens, &self.to)?.clone();

        let mut form = SwapForm::default().with_slippage(default_slippage);
        form.set_from(&from.key);
        form.set_to(&to.key);
        if let Some(slippage) = &self.slippage {
            form.set_slippage(slippage)?;
        }
        if self.max {
            let balances = context.session_mut().refresh_balances().await?;
            form.set_max(balances);
        } else if let Some(amount) = &self.amount {
            form.set_amount(amount);
        }

        form.quote = match fetch_quote(contracts.as_ref(), &from, &to, &form.amount).await {
            Ok(quote) => QuoteState::Ready(quote),
            Err(e @ (Error::InvalidAmount(_) | Error::InvalidInput(_))) => return Err(e.into()),
            Err(e) => {
                tracing::debug!("Quote failed: {}", e);
                QuoteState::NoLiquidity(NO_LIQUIDITY.to_string())
            }
        };

        let button = form.button(true, context.network().is_matched());
        if let QuoteState::Ready(quote) = &form.quote {
            println!("\nSwap {} {} for ~{} {}", quote.amount_in, from.symbol, form.output_text(), to.symbol);
            println!("Rate: 1 {} = {} {}", from.symbol, format_display(quote.exchange_rate), to.symbol);
            match fetch_pool(contracts.as_ref(), &from, &to, None).await {
                Ok(pool) => {
                    if let Some(impact) = quote.price_impact(pool.reserve_a, pool.reserve_b) {
                        println!("Price impact: {}%", impact);
                    }
                }
                Err(e) => tracing::debug!("Pool reserves unavailable: {}", e),
            }
            if let Some(minimum) = form.minimum_received() {
                println!("Minimum received: {} {} ({}% slippage)", format_display(minimum), to.symbol, form.slippage);
            }
        }
        if button.disabled {
            return Err(CliError::Blocked(button.text));
        }
        if self.simulate {
            return Ok(());
        }
        if !confirm("Execute this swap?", assume_yes)? {
            return Err(CliError::Cancelled);
        }

        let request = form.request(&tokens)?;
        let tracker = ProgressTracker::default();
        let printer = follow_progress(&tracker, network.clone());
        let result = execute_swap(contracts.as_ref(), &tracker, &request).await;
        finish_progress(tracker, printer, &network).await;

        let receipt = result?;
        context.record_transaction(receipt.tx_hash, &selectors::SWAP_EXACT_TOKENS_FOR_TOKENS);
        context.session_mut().refresh_balances().await?;
        print_success(&format!(
            "Swapped {} {} in block {}",
            request.amount_in,
            request.from.symbol,
            receipt
                .block_number
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".to_string())
        ));
        Ok(())
    }
}

/// Price a swap without sending anything
#[derive(Args, Clone)]
pub struct QuoteCommand {
    /// Token to sell (key or symbol)
    #[arg(short, long, default_value = "TmEth")]
    from: String,

    /// Token to buy (key or symbol)
    #[arg(short, long, default_value = "OmUsd")]
    to: String,

    /// Amount of the sold token
    #[arg(short, long)]
    amount: String,

    /// Slippage tolerance in percent, for the minimum received
    #[arg(short, long)]
    slippage: Option<String>,
}

impl QuoteCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        SwapCommand {
            from: self.from,
            to: self.to,
            amount: Some(self.amount),
            max: false,
            slippage: self.slippage,
            yes: false,
            simulate: true,
        }
        .execute(app)
        .await
    }
}
