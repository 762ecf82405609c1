use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{Middleware, PendingTransaction};
use ethers::types::{Address, TxHash, U256, U64};

use crate::config::ContractAddresses;
use crate::contracts::{ITempoToken, IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router02};
use crate::error::{contract_error, Error};

/// Arguments of `addLiquidity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: U256,
}

/// Arguments of `removeLiquidity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub liquidity: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: U256,
}

/// Pair reserves as returned by `getReserves`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reserves {
    pub reserve0: u128,
    pub reserve1: u128,
    pub block_timestamp_last: u32,
}

/// What a confirmed transaction left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceiptSummary {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

/// Callable proxy over the token, router, factory and pair contracts.
///
/// Writes return as soon as the transaction is accepted into the pending
/// pool; `wait_for_confirmation` blocks until it is mined.
#[async_trait]
pub trait DexContracts: Send + Sync {
    /// Account that signs writes
    fn account(&self) -> Address;

    /// Router address (the spender for approvals)
    fn router(&self) -> Address;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, Error>;

    async fn decimals(&self, token: Address) -> Result<u8, Error>;

    async fn total_supply(&self, token: Address) -> Result<U256, Error>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address)
        -> Result<U256, Error>;

    async fn approve(&self, token: Address, spender: Address, amount: U256)
        -> Result<TxHash, Error>;

    async fn mint(&self, token: Address, amount: U256) -> Result<TxHash, Error>;

    async fn get_amounts_out(&self, amount_in: U256, path: Vec<Address>)
        -> Result<Vec<U256>, Error>;

    async fn swap_exact_tokens_for_tokens(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> Result<TxHash, Error>;

    async fn add_liquidity(&self, params: &AddLiquidityParams) -> Result<TxHash, Error>;

    async fn remove_liquidity(&self, params: &RemoveLiquidityParams) -> Result<TxHash, Error>;

    async fn get_pair(&self, token_a: Address, token_b: Address) -> Result<Address, Error>;

    async fn all_pairs_length(&self) -> Result<U256, Error>;

    async fn all_pairs(&self, index: U256) -> Result<Address, Error>;

    /// `(token0, token1)` of a pair
    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), Error>;

    async fn get_reserves(&self, pair: Address) -> Result<Reserves, Error>;

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceiptSummary, Error>;
}

/// `DexContracts` backed by `ethers` bindings over any middleware stack
pub struct ContractGateway<M> {
    client: Arc<M>,
    account: Address,
    contracts: ContractAddresses,
}

impl<M: Middleware + 'static> ContractGateway<M> {
    pub fn new(client: Arc<M>, account: Address, contracts: ContractAddresses) -> Self {
        Self {
            client,
            account,
            contracts,
        }
    }

    pub fn token(&self, address: Address) -> ITempoToken<M> {
        ITempoToken::new(address, self.client.clone())
    }

    pub fn router_contract(&self) -> IUniswapV2Router02<M> {
        IUniswapV2Router02::new(self.contracts.router, self.client.clone())
    }

    pub fn factory_contract(&self) -> IUniswapV2Factory<M> {
        IUniswapV2Factory::new(self.contracts.factory, self.client.clone())
    }

    pub fn pair(&self, address: Address) -> IUniswapV2Pair<M> {
        IUniswapV2Pair::new(address, self.client.clone())
    }

    pub fn client(&self) -> Arc<M> {
        self.client.clone()
    }
}

fn read_error(what: &str, e: impl std::fmt::Display) -> Error {
    Error::Contract(format!("{} failed: {}", what, e))
}

#[async_trait]
impl<M: Middleware + 'static> DexContracts for ContractGateway<M> {
    fn account(&self) -> Address {
        self.account
    }

    fn router(&self) -> Address {
        self.contracts.router
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, Error> {
        self.token(token)
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| read_error("balanceOf", e))
    }

    async fn decimals(&self, token: Address) -> Result<u8, Error> {
        self.token(token)
            .decimals()
            .call()
            .await
            .map_err(|e| read_error("decimals", e))
    }

    async fn total_supply(&self, token: Address) -> Result<U256, Error> {
        self.token(token)
            .total_supply()
            .call()
            .await
            .map_err(|e| read_error("totalSupply", e))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, Error> {
        self.token(token)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| read_error("allowance", e))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, Error> {
        tracing::debug!("approve {:?} for {:?}: {}", token, spender, amount);
        let call = self.token(token).approve(spender, amount);
        let pending = call.send().await.map_err(contract_error)?;
        Ok(pending.tx_hash())
    }

    async fn mint(&self, token: Address, amount: U256) -> Result<TxHash, Error> {
        tracing::debug!("mint {} on {:?}", amount, token);
        let call = self.token(token).mint(amount);
        let pending = call.send().await.map_err(contract_error)?;
        Ok(pending.tx_hash())
    }

    async fn get_amounts_out(
        &self,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>, Error> {
        self.router_contract()
            .get_amounts_out(amount_in, path)
            .call()
            .await
            .map_err(|e| Error::QuoteUnavailable(e.to_string()))
    }

    async fn swap_exact_tokens_for_tokens(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> Result<TxHash, Error> {
        tracing::debug!(
            "swapExactTokensForTokens in={} min_out={} path={:?}",
            amount_in,
            amount_out_min,
            path
        );
        let call = self.router_contract().swap_exact_tokens_for_tokens(
            amount_in,
            amount_out_min,
            path,
            to,
            deadline,
        );
        let pending = call.send().await.map_err(contract_error)?;
        Ok(pending.tx_hash())
    }

    async fn add_liquidity(&self, params: &AddLiquidityParams) -> Result<TxHash, Error> {
        tracing::debug!("addLiquidity {:?}", params);
        let call = self.router_contract().add_liquidity(
            params.token_a,
            params.token_b,
            params.amount_a_desired,
            params.amount_b_desired,
            params.amount_a_min,
            params.amount_b_min,
            params.to,
            params.deadline,
        );
        let pending = call.send().await.map_err(contract_error)?;
        Ok(pending.tx_hash())
    }

    async fn remove_liquidity(&self, params: &RemoveLiquidityParams) -> Result<TxHash, Error> {
        tracing::debug!("removeLiquidity {:?}", params);
        let call = self.router_contract().remove_liquidity(
            params.token_a,
            params.token_b,
            params.liquidity,
            params.amount_a_min,
            params.amount_b_min,
            params.to,
            params.deadline,
        );
        let pending = call.send().await.map_err(contract_error)?;
        Ok(pending.tx_hash())
    }

    async fn get_pair(&self, token_a: Address, token_b: Address) -> Result<Address, Error> {
        self.factory_contract()
            .get_pair(token_a, token_b)
            .call()
            .await
            .map_err(|e| read_error("getPair", e))
    }

    async fn all_pairs_length(&self) -> Result<U256, Error> {
        self.factory_contract()
            .all_pairs_length()
            .call()
            .await
            .map_err(|e| read_error("allPairsLength", e))
    }

    async fn all_pairs(&self, index: U256) -> Result<Address, Error> {
        self.factory_contract()
            .all_pairs(index)
            .call()
            .await
            .map_err(|e| read_error("allPairs", e))
    }

    async fn pair_tokens(&self, pair: Address) -> Result<(Address, Address), Error> {
        let contract = self.pair(pair);
        let token0_call = contract.token_0();
        let token1_call = contract.token_1();
        let (token0, token1) = futures::try_join!(token0_call.call(), token1_call.call())
            .map_err(|e| read_error("token0/token1", e))?;
        Ok((token0, token1))
    }

    async fn get_reserves(&self, pair: Address) -> Result<Reserves, Error> {
        let (reserve0, reserve1, block_timestamp_last) = self
            .pair(pair)
            .get_reserves()
            .call()
            .await
            .map_err(|e| read_error("getReserves", e))?;
        Ok(Reserves {
            reserve0,
            reserve1,
            block_timestamp_last,
        })
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceiptSummary, Error> {
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .await
            .map_err(|e| Error::TransactionFailed(e.to_string()))?
            .ok_or_else(|| {
                Error::TransactionFailed(format!("Transaction {:?} was dropped", tx_hash))
            })?;

        if receipt.status == Some(U64::zero()) {
            return Err(Error::TransactionReverted(format!(
                "Transaction {:?} reverted on-chain",
                tx_hash
            )));
        }

        Ok(TxReceiptSummary {
            tx_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
        })
    }
}
