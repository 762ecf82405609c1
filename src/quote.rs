//! Swap quotes
//!
//! `fetch_quote` prices a single-hop path through the router's
//! `getAmountsOut`; `QuoteDebouncer` coalesces rapid amount edits into one
//! request fired a fixed delay after the last edit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ethers::types::U256;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::amount;
use crate::config::{timing, TokenInfo};
use crate::error::Error;
use crate::gateway::DexContracts;

/// Inline message shown when the router cannot price a path
pub const NO_LIQUIDITY: &str = "No liquidity for this pair";

/// A priced swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: Decimal,
    /// Expected output, rounded to display precision
    pub amount_out: Decimal,
    pub amount_out_raw: U256,
    /// Output per unit of input
    pub exchange_rate: Decimal,
}

impl Quote {
    /// Percent by which this quote's rate falls short of the spot rate of
    /// a pool holding `reserve_in` and `reserve_out`. `None` for an empty pool.
    pub fn price_impact(&self, reserve_in: Decimal, reserve_out: Decimal) -> Option<Decimal> {
        if reserve_in.is_zero() || reserve_out.is_zero() || self.amount_in.is_zero() {
            return None;
        }
        let spot = reserve_out.checked_div(reserve_in)?;
        let execution = self.amount_out.checked_div(self.amount_in)?;
        let impact = (spot - execution)
            .checked_div(spot)?
            .checked_mul(Decimal::ONE_HUNDRED)?;
        Some(impact.max(Decimal::ZERO).round_dp(2))
    }
}

/// Quote state as seen by the swap form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuoteState {
    #[default]
    Idle,
    /// A request is in flight
    Pending,
    Ready(Quote),
    /// Pricing failed; the output field is cleared
    NoLiquidity(String),
}

impl QuoteState {
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteState::Ready(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QuoteState::NoLiquidity(message) => Some(message),
            _ => None,
        }
    }
}

/// Price `amount` of `from` in units of `to`
pub async fn fetch_quote(
    contracts: &dyn DexContracts,
    from: &TokenInfo,
    to: &TokenInfo,
    amount: &str,
) -> Result<Quote, Error> {
    if from.address == to.address {
        return Err(Error::InvalidInput("Select different tokens".to_string()));
    }
    let amount_in = amount::parse_decimal(amount)?;
    if amount_in <= Decimal::ZERO {
        return Err(Error::InvalidAmount("Amount must be greater than zero".to_string()));
    }
    let raw_in = amount::to_base_units(amount, from.decimals)?;

    tracing::debug!("Quoting {} {} -> {}", amount_in, from.symbol, to.symbol);
    let amounts = contracts
        .get_amounts_out(raw_in, vec![from.address, to.address])
        .await?;
    let amount_out_raw = amounts
        .last()
        .copied()
        .ok_or_else(|| Error::QuoteUnavailable("Router returned no amounts".to_string()))?;

    let amount_out = amount::round_display(amount::from_base_units(amount_out_raw, to.decimals)?);
    let exchange_rate = amount::round_display(amount_out / amount_in);

    Ok(Quote {
        amount_in,
        amount_out,
        amount_out_raw,
        exchange_rate,
    })
}

/// Debounced quote requests.
///
/// Each `request` supersedes the previous one: its timer is aborted and any
/// result it still produces is discarded by generation.
pub struct QuoteDebouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<QuoteState>>,
    task: Option<JoinHandle<()>>,
}

impl QuoteDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (state, _) = watch::channel(QuoteState::Idle);
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> QuoteState {
        self.state.borrow().clone()
    }

    /// Schedule a quote for `amount`. Empty, non-positive or same-token
    /// requests clear the quote instead.
    pub fn request(
        &mut self,
        contracts: Arc<dyn DexContracts>,
        from: TokenInfo,
        to: TokenInfo,
        amount: String,
    ) {
        self.abort_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !amount::is_positive(&amount) || from.address == to.address {
            self.state.send_replace(QuoteState::Idle);
            return;
        }

        // A quote for an earlier amount must not outlive the edit
        self.state.send_replace(QuoteState::Pending);

        let delay = self.delay;
        let current = self.generation.clone();
        let state = self.state.clone();

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }

            let next = match fetch_quote(contracts.as_ref(), &from, &to, &amount).await {
                Ok(quote) => QuoteState::Ready(quote),
                Err(e) => {
                    tracing::warn!("Quote error: {}", e);
                    QuoteState::NoLiquidity(NO_LIQUIDITY.to_string())
                }
            };

            if current.load(Ordering::SeqCst) == generation {
                state.send_replace(next);
            } else {
                tracing::debug!("Discarding stale quote (generation {})", generation);
            }
        }));
    }

    /// Drop any scheduled request and clear the quote
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(QuoteState::Idle);
    }

    /// Wait until the latest request settled into `Ready` or `NoLiquidity`
    pub async fn settled(&self) -> QuoteState {
        let mut rx = self.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            match state {
                QuoteState::Ready(_) | QuoteState::NoLiquidity(_) => return state,
                QuoteState::Idle if self.task.as_ref().map_or(true, |t| t.is_finished()) => {
                    return state
                }
                _ => {}
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }

    fn abort_pending(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for QuoteDebouncer {
    fn default() -> Self {
        Self::new(timing::QUOTE_DEBOUNCE)
    }
}

impl Drop for QuoteDebouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
