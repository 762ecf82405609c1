use rust_decimal::Decimal;

use crate::amount;
use crate::config::TokenList;
use crate::error::Error;
use crate::flows::SwapRequest;
use crate::quote::{QuoteState, NO_LIQUIDITY};
use crate::session::BalanceSnapshot;

use super::ButtonState;

/// Slippage presets offered next to the custom field
pub const SLIPPAGE_PRESETS: [Decimal; 3] = [
    Decimal::from_parts(1, 0, 0, false, 1),
    Decimal::from_parts(5, 0, 0, false, 1),
    Decimal::from_parts(10, 0, 0, false, 1),
];

/// Swap screen state
#[derive(Debug, Clone, PartialEq)]
pub struct SwapForm {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub slippage: Decimal,
    pub quote: QuoteState,
    pub loading: bool,
}

impl Default for SwapForm {
    fn default() -> Self {
        Self {
            from: "TmEth".to_string(),
            to: "OmUsd".to_string(),
            amount: String::new(),
            slippage: Decimal::new(5, 1),
            quote: QuoteState::Idle,
            loading: false,
        }
    }
}

impl SwapForm {
    pub fn with_slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = slippage;
        self
    }

    /// Changing either token clears the amount and quote
    pub fn set_from(&mut self, key: &str) {
        self.from = key.to_string();
        self.clear_inputs();
    }

    pub fn set_to(&mut self, key: &str) {
        self.to = key.to_string();
        self.clear_inputs();
    }

    /// Flip the direction of the swap
    pub fn switch_tokens(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.clear_inputs();
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.amount = amount.trim().to_string();
    }

    /// Accept a custom tolerance; anything unparsable falls back to 0.5%
    pub fn set_slippage(&mut self, input: &str) -> Result<Decimal, Error> {
        let parsed = amount::parse_decimal(input).unwrap_or(Decimal::new(5, 1));
        self.slippage = amount::validate_slippage(parsed)?;
        Ok(self.slippage)
    }

    /// Fill in 99.9% of the source balance
    pub fn set_max(&mut self, balances: &BalanceSnapshot) -> Option<Decimal> {
        let balance = balances.get(&self.from)?;
        if balance <= Decimal::ZERO {
            return None;
        }
        let max = amount::max_spendable(balance);
        self.amount = amount::format_display(max);
        Some(max)
    }

    /// Output field text
    pub fn output_text(&self) -> String {
        match &self.quote {
            QuoteState::Pending => "...".to_string(),
            QuoteState::Ready(quote) => amount::format_display(quote.amount_out),
            _ => String::new(),
        }
    }

    pub fn same_tokens(&self) -> bool {
        self.from.eq_ignore_ascii_case(&self.to)
    }

    /// Minimum received at the current slippage
    pub fn minimum_received(&self) -> Option<Decimal> {
        let quote = self.quote.quote()?;
        amount::minimum_output(quote.amount_out, self.slippage).ok()
    }

    pub fn button(&self, connected: bool, network_matched: bool) -> ButtonState {
        let text = if !connected {
            "Connect Wallet"
        } else if !network_matched {
            "Switch Network"
        } else if self.amount.is_empty() {
            "Enter Amount"
        } else if self.same_tokens() {
            "Select Different Tokens"
        } else if self.quote.error().is_some() {
            "No Liquidity"
        } else if self.loading {
            "Processing..."
        } else {
            "Swap"
        };

        let disabled = !connected
            || !network_matched
            || !amount::is_positive(&self.amount)
            || self.same_tokens()
            || self.loading
            || self.quote.quote().is_none();

        ButtonState {
            text: text.to_string(),
            disabled,
        }
    }

    /// Build the request the submit button sends
    pub fn request(&self, tokens: &TokenList) -> Result<SwapRequest, Error> {
        let quote = self
            .quote
            .quote()
            .ok_or_else(|| Error::QuoteUnavailable(NO_LIQUIDITY.to_string()))?;
        let request = SwapRequest {
            from: tokens.require(&self.from)?.clone(),
            to: tokens.require(&self.to)?.clone(),
            amount_in: self.amount.clone(),
            quoted_out: quote.amount_out,
            slippage: self.slippage,
        };
        request.validate()?;
        Ok(request)
    }

    /// Clear inputs after a confirmed swap
    pub fn reset_after_success(&mut self) {
        self.amount.clear();
        self.quote = QuoteState::Idle;
    }

    fn clear_inputs(&mut self) {
        self.amount.clear();
        self.quote = QuoteState::Idle;
    }
}
