use rust_decimal::Decimal;

use crate::amount;
use crate::config::TokenList;
use crate::error::Error;
use crate::flows::{AddLiquidityRequest, PoolSnapshot, RemoveLiquidityRequest};

use super::ButtonState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiquidityMode {
    #[default]
    Add,
    Remove,
}

/// Liquidity screen state
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityForm {
    pub mode: LiquidityMode,
    pub token_a: String,
    pub token_b: String,
    pub amount_a: String,
    /// Only used when the pool has no reserves to derive it from
    pub manual_amount_b: String,
    pub liquidity: String,
    pub pool: PoolSnapshot,
    pub loading: bool,
}

impl Default for LiquidityForm {
    fn default() -> Self {
        Self {
            mode: LiquidityMode::Add,
            token_a: "TmEth".to_string(),
            token_b: "OmUsd".to_string(),
            amount_a: String::new(),
            manual_amount_b: String::new(),
            liquidity: String::new(),
            pool: PoolSnapshot::default(),
            loading: false,
        }
    }
}

impl LiquidityForm {
    pub fn set_mode(&mut self, mode: LiquidityMode) {
        self.mode = mode;
    }

    /// New pair: inputs and the pool snapshot are stale
    pub fn set_tokens(&mut self, token_a: &str, token_b: &str) {
        self.token_a = token_a.to_string();
        self.token_b = token_b.to_string();
        self.amount_a.clear();
        self.manual_amount_b.clear();
        self.liquidity.clear();
        self.pool = PoolSnapshot::default();
    }

    pub fn set_pool(&mut self, pool: PoolSnapshot) {
        self.pool = pool;
    }

    pub fn set_amount_a(&mut self, amount: &str) {
        self.amount_a = amount.trim().to_string();
    }

    pub fn set_amount_b(&mut self, amount: &str) {
        self.manual_amount_b = amount.trim().to_string();
    }

    pub fn set_liquidity(&mut self, liquidity: &str) {
        self.liquidity = liquidity.trim().to_string();
    }

    /// Fill in the whole LP balance
    pub fn set_max_liquidity(&mut self) {
        self.liquidity = self.pool.lp_balance.normalize().to_string();
    }

    /// Amount B: the pool ratio applied to amount A, or the typed value for
    /// a pool without reserves
    pub fn amount_b(&self) -> Option<Decimal> {
        if self.pool.has_liquidity() {
            let amount_a = amount::parse_decimal(&self.amount_a).ok()?;
            return self.pool.paired_amount(amount_a);
        }
        amount::parse_decimal(&self.manual_amount_b)
            .ok()
            .filter(|b| *b > Decimal::ZERO)
    }

    pub fn amount_b_text(&self) -> String {
        self.amount_b().map(amount::format_display).unwrap_or_default()
    }

    pub fn button(&self, connected: bool, network_matched: bool) -> ButtonState {
        if !network_matched {
            return ButtonState::disabled("Wrong Network");
        }
        if !connected {
            return ButtonState::disabled("Connect Wallet");
        }
        if self.loading {
            return ButtonState::disabled("Processing...");
        }
        match self.mode {
            LiquidityMode::Add => {
                if !amount::is_positive(&self.amount_a) {
                    ButtonState::disabled("Enter Amount")
                } else if self.amount_b().is_none() {
                    ButtonState::disabled("Enter Amount")
                } else {
                    ButtonState::enabled("Add Liquidity")
                }
            }
            LiquidityMode::Remove => {
                let Some(liquidity) = amount::parse_decimal(&self.liquidity)
                    .ok()
                    .filter(|l| *l > Decimal::ZERO)
                else {
                    return ButtonState::disabled("Enter LP Amount");
                };
                if liquidity > self.pool.lp_balance {
                    ButtonState::disabled("Insufficient LP")
                } else {
                    ButtonState::enabled("Remove Liquidity")
                }
            }
        }
    }

    pub fn add_request(&self, tokens: &TokenList) -> Result<AddLiquidityRequest, Error> {
        let amount_b = self
            .amount_b()
            .ok_or_else(|| Error::InvalidAmount("Enter an amount for both tokens".to_string()))?;
        Ok(AddLiquidityRequest {
            token_a: tokens.require(&self.token_a)?.clone(),
            token_b: tokens.require(&self.token_b)?.clone(),
            amount_a: self.amount_a.clone(),
            amount_b: amount_b.normalize().to_string(),
        })
    }

    pub fn remove_request(&self, tokens: &TokenList) -> Result<RemoveLiquidityRequest, Error> {
        Ok(RemoveLiquidityRequest {
            token_a: tokens.require(&self.token_a)?.clone(),
            token_b: tokens.require(&self.token_b)?.clone(),
            liquidity: self.liquidity.clone(),
        })
    }

    /// Clear inputs after a confirmed transaction
    pub fn reset_after_success(&mut self) {
        self.amount_a.clear();
        self.manual_amount_b.clear();
        self.liquidity.clear();
    }
}
