use clap::Args;
use tempo_dex_sdk::amount::format_display;
use tempo_dex_sdk::contracts::selectors;
use tempo_dex_sdk::views::{LiquidityForm, LiquidityMode};
use tempo_dex_sdk::{
    add_liquidity, fetch_pool, remove_liquidity, DexContracts, ProgressTracker, TokenList,
};

use crate::app::CliApp;
use crate::error::CliError;
use crate::utils::{confirm, finish_progress, follow_progress, print_success, resolve_token};

#[derive(Args, Clone)]
pub struct AddLiquidityCommand {
    /// First token (key or symbol)
    #[arg(long)]
    token_a: String,

    /// Second token (key or symbol)
    #[arg(long)]
    token_b: String,

    /// Amount of the first token
    #[arg(long)]
    amount_a: String,

    /// Amount of the second token; only used for a pool without reserves,
    /// otherwise it follows the pool ratio
    #[arg(long)]
    amount_b: Option<String>,

    /// Skip confirmation prompt
    #[arg(long)]
    yes: bool,
}

impl AddLiquidityCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let contracts = app.ready().await?;
        let assume_yes = self.yes || app.assume_yes;
        let context = app.context().await?;
        let tokens = context.config().tokens.clone();
        let network = context.config().constants.clone();

        let form = {
            let mut form = load_form(contracts.as_ref(), &tokens, &self.token_a, &self.token_b).await?;
            form.set_amount_a(&self.amount_a);
            if let Some(amount_b) = &self.amount_b {
                form.set_amount_b(amount_b);
            }
            form
        };

        let button = form.button(true, context.network().is_matched());
        if button.disabled {
            return Err(CliError::Blocked(button.text));
        }
        let request = form.add_request(&tokens)?;
        println!(
            "\nDeposit {} {} and {} {}",
            request.amount_a,
            request.token_a.symbol,
            form.amount_b_text(),
            request.token_b.symbol
        );
        if !form.pool.has_liquidity() {
            println!("This pool has no reserves yet; your amounts set its price.");
        }
        if !confirm("Add liquidity?", assume_yes)? {
            return Err(CliError::Cancelled);
        }

        let tracker = ProgressTracker::default();
        let printer = follow_progress(&tracker, network.clone());
        let result = add_liquidity(contracts.as_ref(), &tracker, &request).await;
        let progress = finish_progress(tracker, printer, &network).await;
        result?;
        if let Some(hash) = progress.and_then(|p| p.tx_hash) {
            context.record_transaction(hash, &selectors::ADD_LIQUIDITY);
        }

        context.session_mut().refresh_balances().await?;
        print_success(&format!(
            "Added liquidity to {}/{}",
            request.token_a.symbol, request.token_b.symbol
        ));
        Ok(())
    }
}

#[derive(Args, Clone)]
pub struct RemoveLiquidityCommand {
    /// First token (key or symbol)
    #[arg(long)]
    token_a: String,

    /// Second token (key or symbol)
    #[arg(long)]
    token_b: String,

    /// LP tokens to burn
    #[arg(short, long, required_unless_present = "max")]
    liquidity: Option<String>,

    /// Withdraw the whole LP balance
    #[arg(long)]
    max: bool,

    /// Skip confirmation prompt
    #[arg(long)]
    yes: bool,
}

impl RemoveLiquidityCommand {
    pub async fn execute(self, app: &mut CliApp) -> Result<(), CliError> {
        let contracts = app.ready().await?;
        let assume_yes = self.yes || app.assume_yes;
        let context = app.context().await?;
        let tokens = context.config().tokens.clone();
        let network = context.config().constants.clone();

        let mut form = load_form(contracts.as_ref(), &tokens, &self.token_a, &self.token_b).await?;
        form.set_mode(LiquidityMode::Remove);
        if self.max {
            form.set_max_liquidity();
        } else if let Some(liquidity) = &self.liquidity {
            form.set_liquidity(liquidity);
        }

        let button = form.button(true, context.network().is_matched());
        if button.disabled {
            return Err(CliError::Blocked(button.text));
        }
        let request = form.remove_request(&tokens)?;
        println!(
            "\nBurn {} of {} LP tokens ({}% of the pool)",
            request.liquidity,
            format_display(form.pool.lp_balance),
            format_display(form.pool.share_percent)
        );
        if !confirm("Remove liquidity?", assume_yes)? {
            return Err(CliError::Cancelled);
        }

        let tracker = ProgressTracker::default();
        let printer = follow_progress(&tracker, network.clone());
        let result = remove_liquidity(contracts.as_ref(), &tracker, &request).await;
        let progress = finish_progress(tracker, printer, &network).await;
        result?;
        if let Some(hash) = progress.and_then(|p| p.tx_hash) {
            context.record_transaction(hash, &selectors::REMOVE_LIQUIDITY);
        }

        context.session_mut().refresh_balances().await?;
        print_success(&format!(
            "Removed liquidity from {}/{}",
            request.token_a.symbol, request.token_b.symbol
        ));
        Ok(())
    }
}

/// Form for the pair with the pool snapshot already loaded
async fn load_form(
    contracts: &dyn DexContracts,
    tokens: &TokenList,
    token_a: &str,
    token_b: &str,
) -> Result<LiquidityForm, CliError> {
    let token_a = resolve_token(tokens, token_a)?;
    let token_b = resolve_token(tokens, token_b)?;

    let mut form = LiquidityForm::default();
    form.set_tokens(&token_a.key, &token_b.key);
    let pool = fetch_pool(contracts, token_a, token_b, Some(contracts.account())).await?;
    form.set_pool(pool);
    Ok(form)
}
