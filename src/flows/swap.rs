use std::sync::Mutex;

use ethers::types::{Address, U256};
use futures::FutureExt;
use rust_decimal::Decimal;

use crate::amount;
use crate::config::TokenInfo;
use crate::error::Error;
use crate::executor::StepExecutor;
use crate::gateway::{DexContracts, TxReceiptSummary};
use crate::progress::{ProgressTracker, SWAP_STEPS};

use super::{approve_router, has_allowance};

/// A swap the user asked for
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub from: TokenInfo,
    pub to: TokenInfo,
    /// Input amount as typed
    pub amount_in: String,
    /// Quoted output in display units
    pub quoted_out: Decimal,
    /// Slippage tolerance in percent
    pub slippage: Decimal,
}

/// Router arguments derived from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub amount_in: U256,
    pub min_out: U256,
    /// Minimum output in display units
    pub min_out_display: Decimal,
    pub path: Vec<Address>,
    pub deadline: U256,
}

impl SwapRequest {
    /// Reject requests the swap form would have disabled
    pub fn validate(&self) -> Result<(), Error> {
        if self.from.address == self.to.address {
            return Err(Error::InvalidInput("Select different tokens".to_string()));
        }
        if !amount::is_positive(&self.amount_in) {
            return Err(Error::InvalidAmount(
                "Amount must be greater than zero".to_string(),
            ));
        }
        if self.quoted_out <= Decimal::ZERO {
            return Err(Error::QuoteUnavailable(crate::quote::NO_LIQUIDITY.to_string()));
        }
        Ok(())
    }

    /// Compute router arguments for a call issued at `now_secs`
    pub fn plan(&self, now_secs: u64) -> Result<SwapPlan, Error> {
        self.validate()?;
        let amount_in = amount::to_base_units(&self.amount_in, self.from.decimals)?;
        let min_out_display = amount::minimum_output(self.quoted_out, self.slippage)?;
        let min_out =
            amount::to_base_units(&min_out_display.to_string(), self.to.decimals)?;

        Ok(SwapPlan {
            amount_in,
            min_out,
            min_out_display,
            path: vec![self.from.address, self.to.address],
            deadline: amount::deadline(now_secs),
        })
    }
}

/// Approve if needed, swap, and wait for the swap to be mined
pub async fn execute_swap(
    contracts: &dyn DexContracts,
    tracker: &ProgressTracker,
    request: &SwapRequest,
) -> Result<TxReceiptSummary, Error> {
    tracker.begin(&SWAP_STEPS);

    let plan = match request.plan(amount::unix_now()) {
        Ok(plan) => plan,
        Err(e) => {
            tracker.fail(e.reason());
            return Err(e);
        }
    };
    tracing::info!(
        "Swapping {} {} for at least {} {}",
        request.amount_in,
        request.from.symbol,
        plan.min_out_display,
        request.to.symbol
    );

    let receipt: Mutex<Option<TxReceiptSummary>> = Mutex::new(None);
    let (plan, slot) = (&plan, &receipt);
    let token = request.from.address;

    let report = StepExecutor::new()
        .step_unless(
            SWAP_STEPS[0],
            move || has_allowance(contracts, token, plan.amount_in).boxed(),
            move || {
                approve_router(contracts, tracker, 1, "Approving tokens...", token, plan.amount_in)
                    .boxed()
            },
        )
        .step(SWAP_STEPS[1], move || {
            async move {
                tracker.advance(2, "Swapping tokens...");
                let tx_hash = contracts
                    .swap_exact_tokens_for_tokens(
                        plan.amount_in,
                        plan.min_out,
                        plan.path.clone(),
                        contracts.account(),
                        plan.deadline,
                    )
                    .await?;
                tracker.advance_with_tx(3, "Swap submitted", tx_hash);

                let confirmed = contracts.wait_for_confirmation(tx_hash).await?;
                if let Ok(mut slot) = slot.lock() {
                    *slot = Some(confirmed);
                }
                Ok::<(), Error>(())
            }
            .boxed()
        })
        .run()
        .await;

    if let Err(e) = report.into_result() {
        tracker.fail(e.reason());
        return Err(e);
    }

    tracker.succeed("Swap completed successfully!");
    let confirmed = receipt
        .into_inner()
        .ok()
        .flatten()
        .ok_or_else(|| Error::TransactionFailed("Swap receipt missing".to_string()))?;
    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenList;
    use std::str::FromStr;

    fn request(amount_in: &str, quoted_out: &str, slippage: &str) -> SwapRequest {
        let tokens = TokenList::default();
        SwapRequest {
            from: tokens.get("TmEth").unwrap().clone(),
            to: tokens.get("OmUsd").unwrap().clone(),
            amount_in: amount_in.to_string(),
            quoted_out: Decimal::from_str(quoted_out).unwrap(),
            slippage: Decimal::from_str(slippage).unwrap(),
        }
    }

    #[test]
    fn test_plan_minimum_output() {
        let plan = request("10", "20.123456", "0.5").plan(1_700_000_000).unwrap();
        assert_eq!(plan.min_out_display, Decimal::from_str("20.022839").unwrap());
        assert_eq!(
            plan.min_out,
            U256::from_dec_str("20022839000000000000").unwrap()
        );
        assert_eq!(
            plan.amount_in,
            U256::from(10u64) * U256::exp10(18)
        );
        assert_eq!(plan.deadline, U256::from(1_700_000_600u64));
        assert_eq!(plan.path.len(), 2);
    }

    #[test]
    fn test_validate_rejects_disabled_inputs() {
        assert!(request("0", "1", "0.5").validate().is_err());
        assert!(request("-1", "1", "0.5").validate().is_err());
        assert!(request("", "1", "0.5").validate().is_err());

        let mut same = request("1", "1", "0.5");
        same.to = same.from.clone();
        assert!(same.validate().is_err());

        assert!(request("1", "0", "0.5").validate().is_err());
        assert!(request("1", "1", "60").plan(0).is_err());
    }
}
