//! Portfolio overview: balances plus factory-wide pool statistics

use std::collections::HashMap;

use ethers::types::{Address, U256};
use rust_decimal::Decimal;

use crate::amount;
use crate::config::TokenList;
use crate::error::Error;
use crate::gateway::DexContracts;
use crate::session::fetch_balances;

/// Pairs scanned for the TVL estimate
pub const TVL_PAIR_LIMIT: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub pair_count: u64,
    /// Sum of both reserves of every scanned pair made of known tokens
    pub tvl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dashboard {
    pub balances: HashMap<String, Decimal>,
    pub pools: PoolStats,
}

impl Dashboard {
    /// Sum of all token balances, capped at `Decimal::MAX`
    pub fn total_balance(&self) -> Decimal {
        amount::saturating_sum(self.balances.values().copied())
    }
}

/// Load balances and pool statistics concurrently
pub async fn load_dashboard(
    contracts: &dyn DexContracts,
    owner: Address,
    tokens: &TokenList,
) -> Dashboard {
    let (balances, pools) = futures::join!(
        fetch_balances(contracts, owner, tokens),
        load_pool_stats(contracts, tokens),
    );

    let pools = pools.unwrap_or_else(|e| {
        tracing::warn!("Pool statistics unavailable: {}", e);
        PoolStats::default()
    });

    Dashboard { balances, pools }
}

/// Pair count plus a naive TVL over the first pairs
pub async fn load_pool_stats(
    contracts: &dyn DexContracts,
    tokens: &TokenList,
) -> Result<PoolStats, Error> {
    let count = contracts.all_pairs_length().await?;
    let pair_count = count.min(U256::from(u64::MAX)).as_u64();

    let mut tvl = Decimal::ZERO;
    for index in 0..pair_count.min(TVL_PAIR_LIMIT) {
        match pair_value(contracts, tokens, index).await {
            Ok(Some(value)) => tvl = amount::saturating_sum([tvl, value]),
            Ok(None) => tracing::debug!("Pair {} has unknown tokens, skipped", index),
            Err(e) => tracing::warn!("Pair {} unavailable: {}", index, e),
        }
    }

    Ok(PoolStats { pair_count, tvl })
}

async fn pair_value(
    contracts: &dyn DexContracts,
    tokens: &TokenList,
    index: u64,
) -> Result<Option<Decimal>, Error> {
    let pair = contracts.all_pairs(U256::from(index)).await?;
    let ((token0, token1), reserves) =
        futures::try_join!(contracts.pair_tokens(pair), contracts.get_reserves(pair))?;

    let (Some(t0), Some(t1)) = (tokens.by_address(token0), tokens.by_address(token1)) else {
        return Ok(None);
    };

    let value = amount::saturating_sum([
        amount::from_base_units(U256::from(reserves.reserve0), t0.decimals)?,
        amount::from_base_units(U256::from(reserves.reserve1), t1.decimals)?,
    ]);
    Ok(Some(value))
}
