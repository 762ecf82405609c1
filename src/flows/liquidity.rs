use ethers::types::{Address, U256};
use futures::FutureExt;
use rust_decimal::Decimal;

use crate::amount;
use crate::config::TokenInfo;
use crate::error::Error;
use crate::executor::StepExecutor;
use crate::gateway::{AddLiquidityParams, DexContracts, RemoveLiquidityParams};
use crate::progress::{ProgressTracker, ADD_LIQUIDITY_STEPS, REMOVE_LIQUIDITY_STEPS};

use super::{approve_router, has_allowance};

/// Decimals of every pair's LP token
pub const LP_DECIMALS: u8 = 18;

/// Reserves and the user's position in the pool of two tokens, oriented to
/// the caller's `(token_a, token_b)` order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolSnapshot {
    /// `None` when the factory has no pair for the tokens
    pub pair: Option<Address>,
    pub reserve_a: Decimal,
    pub reserve_b: Decimal,
    pub reserve_a_raw: U256,
    pub reserve_b_raw: U256,
    pub lp_balance: Decimal,
    pub lp_balance_raw: U256,
    pub total_supply_raw: U256,
    /// User's share of the pool in percent
    pub share_percent: Decimal,
}

impl PoolSnapshot {
    pub fn exists(&self) -> bool {
        self.pair.is_some()
    }

    pub fn has_liquidity(&self) -> bool {
        self.reserve_a > Decimal::ZERO && self.reserve_b > Decimal::ZERO
    }

    /// Units of token B per token A
    pub fn exchange_rate(&self) -> Option<Decimal> {
        amount::paired_amount(Decimal::ONE, self.reserve_a, self.reserve_b)
    }

    /// Token B amount matching `amount_a` at the current pool ratio
    pub fn paired_amount(&self, amount_a: Decimal) -> Option<Decimal> {
        amount::paired_amount(amount_a, self.reserve_a, self.reserve_b)
    }

    /// Base-unit amounts `liquidity` LP tokens currently redeem for
    pub fn expected_withdrawal(&self, liquidity: U256) -> (U256, U256) {
        if self.total_supply_raw.is_zero() {
            return (U256::zero(), U256::zero());
        }
        (
            self.reserve_a_raw * liquidity / self.total_supply_raw,
            self.reserve_b_raw * liquidity / self.total_supply_raw,
        )
    }
}

/// Read the pool of `token_a`/`token_b`; LP figures are filled in when
/// `owner` is given.
pub async fn fetch_pool(
    contracts: &dyn DexContracts,
    token_a: &TokenInfo,
    token_b: &TokenInfo,
    owner: Option<Address>,
) -> Result<PoolSnapshot, Error> {
    if token_a.address == token_b.address {
        return Err(Error::InvalidInput("Select different tokens".to_string()));
    }
    let pair = contracts.get_pair(token_a.address, token_b.address).await?;
    if pair.is_zero() {
        return Ok(PoolSnapshot::default());
    }

    let ((token0, _), reserves, total_supply_raw) = futures::try_join!(
        contracts.pair_tokens(pair),
        contracts.get_reserves(pair),
        contracts.total_supply(pair),
    )?;

    let (reserve_a_raw, reserve_b_raw) = if token0 == token_a.address {
        (U256::from(reserves.reserve0), U256::from(reserves.reserve1))
    } else {
        (U256::from(reserves.reserve1), U256::from(reserves.reserve0))
    };

    let mut snapshot = PoolSnapshot {
        pair: Some(pair),
        reserve_a: amount::from_base_units(reserve_a_raw, token_a.decimals)?,
        reserve_b: amount::from_base_units(reserve_b_raw, token_b.decimals)?,
        reserve_a_raw,
        reserve_b_raw,
        total_supply_raw,
        ..PoolSnapshot::default()
    };

    if let Some(owner) = owner {
        let lp_balance_raw = contracts.balance_of(pair, owner).await?;
        snapshot.lp_balance_raw = lp_balance_raw;
        snapshot.lp_balance = amount::from_base_units(lp_balance_raw, LP_DECIMALS)?;
        if !total_supply_raw.is_zero() {
            let total = amount::from_base_units(total_supply_raw, LP_DECIMALS)?;
            snapshot.share_percent = snapshot.lp_balance / total * Decimal::ONE_HUNDRED;
        }
    }

    Ok(snapshot)
}

/// Deposit of two tokens at the desired amounts
#[derive(Debug, Clone)]
pub struct AddLiquidityRequest {
    pub token_a: TokenInfo,
    pub token_b: TokenInfo,
    pub amount_a: String,
    pub amount_b: String,
}

impl AddLiquidityRequest {
    pub fn params(&self, to: Address, now_secs: u64) -> Result<AddLiquidityParams, Error> {
        if self.token_a.address == self.token_b.address {
            return Err(Error::InvalidInput("Select different tokens".to_string()));
        }
        if !amount::is_positive(&self.amount_a) || !amount::is_positive(&self.amount_b) {
            return Err(Error::InvalidAmount(
                "Both amounts must be greater than zero".to_string(),
            ));
        }
        let amount_a_desired = amount::to_base_units(&self.amount_a, self.token_a.decimals)?;
        let amount_b_desired = amount::to_base_units(&self.amount_b, self.token_b.decimals)?;

        Ok(AddLiquidityParams {
            token_a: self.token_a.address,
            token_b: self.token_b.address,
            amount_a_desired,
            amount_b_desired,
            amount_a_min: amount::liquidity_minimum(amount_a_desired),
            amount_b_min: amount::liquidity_minimum(amount_b_desired),
            to,
            deadline: amount::deadline(now_secs),
        })
    }
}

/// Withdrawal of `liquidity` LP tokens
#[derive(Debug, Clone)]
pub struct RemoveLiquidityRequest {
    pub token_a: TokenInfo,
    pub token_b: TokenInfo,
    pub liquidity: String,
}

impl RemoveLiquidityRequest {
    /// Router arguments with minimums at 95% of what `pool` says the LP
    /// tokens redeem for
    pub fn params(
        &self,
        pool: &PoolSnapshot,
        to: Address,
        now_secs: u64,
    ) -> Result<RemoveLiquidityParams, Error> {
        if !pool.exists() {
            return Err(Error::InvalidInput(format!(
                "No pool for {}/{}",
                self.token_a.symbol, self.token_b.symbol
            )));
        }
        if !amount::is_positive(&self.liquidity) {
            return Err(Error::InvalidAmount("Enter LP amount".to_string()));
        }
        let liquidity = amount::to_base_units(&self.liquidity, LP_DECIMALS)?;
        if liquidity > pool.lp_balance_raw {
            return Err(Error::InvalidAmount("Insufficient LP".to_string()));
        }
        let (expected_a, expected_b) = pool.expected_withdrawal(liquidity);

        Ok(RemoveLiquidityParams {
            token_a: self.token_a.address,
            token_b: self.token_b.address,
            liquidity,
            amount_a_min: amount::liquidity_minimum(expected_a),
            amount_b_min: amount::liquidity_minimum(expected_b),
            to,
            deadline: amount::deadline(now_secs),
        })
    }
}

/// Approve both tokens as needed, then `addLiquidity`
pub async fn add_liquidity(
    contracts: &dyn DexContracts,
    tracker: &ProgressTracker,
    request: &AddLiquidityRequest,
) -> Result<(), Error> {
    tracker.begin(&ADD_LIQUIDITY_STEPS);
    let params = match request.params(contracts.account(), amount::unix_now()) {
        Ok(params) => params,
        Err(e) => {
            tracker.fail(e.reason());
            return Err(e);
        }
    };
    tracing::info!(
        "Adding liquidity {} {} + {} {}",
        request.amount_a,
        request.token_a.symbol,
        request.amount_b,
        request.token_b.symbol
    );

    let p = &params;
    let report = StepExecutor::new()
        .step_unless(
            ADD_LIQUIDITY_STEPS[0],
            move || has_allowance(contracts, p.token_a, p.amount_a_desired).boxed(),
            move || {
                approve_router(contracts, tracker, 1, "Approving token A...", p.token_a, p.amount_a_desired)
                    .boxed()
            },
        )
        .step_unless(
            ADD_LIQUIDITY_STEPS[1],
            move || has_allowance(contracts, p.token_b, p.amount_b_desired).boxed(),
            move || {
                approve_router(contracts, tracker, 2, "Approving token B...", p.token_b, p.amount_b_desired)
                    .boxed()
            },
        )
        .step(ADD_LIQUIDITY_STEPS[2], move || {
            async move {
                tracker.advance(3, "Adding liquidity...");
                let tx_hash = contracts.add_liquidity(p).await?;
                tracker.advance_with_tx(3, "Liquidity submitted", tx_hash);
                contracts.wait_for_confirmation(tx_hash).await?;
                Ok::<(), Error>(())
            }
            .boxed()
        })
        .run()
        .await;

    match report.into_result() {
        Ok(()) => {
            tracker.succeed("Liquidity added successfully!");
            Ok(())
        }
        Err(e) => {
            tracker.fail(e.reason());
            Err(e)
        }
    }
}

/// Approve the LP token as needed, then `removeLiquidity`
pub async fn remove_liquidity(
    contracts: &dyn DexContracts,
    tracker: &ProgressTracker,
    request: &RemoveLiquidityRequest,
) -> Result<(), Error> {
    tracker.begin(&REMOVE_LIQUIDITY_STEPS);
    let account = contracts.account();

    let prepared = async {
        let pool = fetch_pool(contracts, &request.token_a, &request.token_b, Some(account)).await?;
        let params = request.params(&pool, account, amount::unix_now())?;
        Ok::<_, Error>((pool, params))
    }
    .await;
    let (pool, params) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            tracker.fail(e.reason());
            return Err(e);
        }
    };
    let Some(pair) = pool.pair else {
        return Err(Error::InvalidInput("No pool".to_string()));
    };
    tracing::info!(
        "Removing {} LP from {}/{}",
        request.liquidity,
        request.token_a.symbol,
        request.token_b.symbol
    );

    let p = &params;
    let report = StepExecutor::new()
        .step_unless(
            REMOVE_LIQUIDITY_STEPS[0],
            move || has_allowance(contracts, pair, p.liquidity).boxed(),
            move || {
                approve_router(contracts, tracker, 1, "Approving LP tokens...", pair, p.liquidity)
                    .boxed()
            },
        )
        .step(REMOVE_LIQUIDITY_STEPS[1], move || {
            async move {
                tracker.advance(2, "Removing liquidity...");
                let tx_hash = contracts.remove_liquidity(p).await?;
                tracker.advance_with_tx(2, "Removal submitted", tx_hash);
                contracts.wait_for_confirmation(tx_hash).await?;
                Ok::<(), Error>(())
            }
            .boxed()
        })
        .run()
        .await;

    match report.into_result() {
        Ok(()) => {
            tracker.succeed("Liquidity removed successfully!");
            Ok(())
        }
        Err(e) => {
            tracker.fail(e.reason());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenList;

    fn pair_tokens() -> (TokenInfo, TokenInfo) {
        let tokens = TokenList::default();
        (
            tokens.get("TmEth").unwrap().clone(),
            tokens.get("OmUsd").unwrap().clone(),
        )
    }

    #[test]
    fn test_add_params_use_95_percent_minimums() {
        let (a, b) = pair_tokens();
        let request = AddLiquidityRequest {
            token_a: a,
            token_b: b,
            amount_a: "1".to_string(),
            amount_b: "2000".to_string(),
        };
        let params = request.params(Address::zero(), 100).unwrap();
        assert_eq!(
            params.amount_a_min,
            U256::exp10(18) * U256::from(95u64) / U256::from(100u64)
        );
        assert_eq!(params.amount_b_min, U256::from(1900u64) * U256::exp10(18));
        assert_eq!(params.deadline, U256::from(700u64));
    }

    #[test]
    fn test_remove_params_checks_lp_balance() {
        let (a, b) = pair_tokens();
        let pool = PoolSnapshot {
            pair: Some(Address::from_low_u64_be(7)),
            reserve_a_raw: U256::from(1_000u64),
            reserve_b_raw: U256::from(4_000u64),
            total_supply_raw: U256::from(2_000u64),
            lp_balance_raw: U256::exp10(18),
            ..PoolSnapshot::default()
        };
        let request = RemoveLiquidityRequest {
            token_a: a,
            token_b: b,
            liquidity: "2".to_string(),
        };
        assert!(request.params(&pool, Address::zero(), 0).is_err());

        let request = RemoveLiquidityRequest {
            liquidity: "0.000000000000001".to_string(),
            ..request
        };
        // 1000 base units of LP out of 2000 redeem half the reserves
        let params = request.params(&pool, Address::zero(), 0).unwrap();
        assert_eq!(params.liquidity, U256::from(1_000u64));
        assert_eq!(params.amount_a_min, U256::from(475u64));
        assert_eq!(params.amount_b_min, U256::from(1_900u64));
    }

    #[test]
    fn test_pool_ratio_helpers() {
        let pool = PoolSnapshot {
            pair: Some(Address::from_low_u64_be(7)),
            reserve_a: Decimal::from(10),
            reserve_b: Decimal::from(25),
            ..PoolSnapshot::default()
        };
        assert_eq!(pool.exchange_rate(), Some(Decimal::new(25, 1)));
        assert_eq!(pool.paired_amount(Decimal::from(2)), Some(Decimal::from(5)));
        assert!(PoolSnapshot::default().paired_amount(Decimal::ONE).is_none());
    }
}
