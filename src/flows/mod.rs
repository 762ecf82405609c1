//! Transaction submission flows
//!
//! Every flow follows approve-then-act: a router allowance is topped up
//! (and confirmed) before the dependent router call is sent. Progress is
//! reported through a `ProgressTracker`; failures end the flow without retry.

pub mod liquidity;
pub mod mint;
pub mod swap;

pub use liquidity::{
    add_liquidity, fetch_pool, remove_liquidity, AddLiquidityRequest, PoolSnapshot,
    RemoveLiquidityRequest,
};
pub use mint::{mint_all, MintEntry, MintReport, MintStatus, MintTracker};
pub use swap::{execute_swap, SwapPlan, SwapRequest};

use ethers::types::{Address, U256};

use crate::error::Error;
use crate::gateway::DexContracts;
use crate::progress::ProgressTracker;

/// True when the router may already spend `amount` of `token`
pub(crate) async fn has_allowance(
    contracts: &dyn DexContracts,
    token: Address,
    amount: U256,
) -> Result<bool, Error> {
    let allowance = contracts
        .allowance(token, contracts.account(), contracts.router())
        .await?;
    tracing::debug!("Allowance of {:?}: {} (need {})", token, allowance, amount);
    Ok(allowance >= amount)
}

/// Approve the router for exactly `amount` and wait for confirmation
pub(crate) async fn approve_router(
    contracts: &dyn DexContracts,
    tracker: &ProgressTracker,
    step: usize,
    message: &str,
    token: Address,
    amount: U256,
) -> Result<(), Error> {
    let tx_hash = contracts.approve(token, contracts.router(), amount).await?;
    tracker.advance_with_tx(step, message, tx_hash);
    contracts.wait_for_confirmation(tx_hash).await?;
    Ok(())
}
