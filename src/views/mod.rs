//! View models
//!
//! Front-end independent state behind each screen: what a button says,
//! whether it is enabled, which values are derived. Rendering lives in the
//! front end.

pub mod liquidity_form;
pub mod minter;
pub mod network_guard;
pub mod progress_view;
pub mod swap_form;

pub use liquidity_form::{LiquidityForm, LiquidityMode};
pub use minter::MinterView;
pub use network_guard::NetworkGuard;
pub use progress_view::{ProgressView, StepMark};
pub use swap_form::SwapForm;

use ethers::types::Address;

/// Label and enabled state of a form's primary button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub text: String,
    pub disabled: bool,
}

impl ButtonState {
    pub fn enabled(text: &str) -> Self {
        Self {
            text: text.to_string(),
            disabled: false,
        }
    }

    pub fn disabled(text: &str) -> Self {
        Self {
            text: text.to_string(),
            disabled: true,
        }
    }
}

/// `0x1234...abcd`
pub fn format_address(address: Address) -> String {
    let full = format!("{:?}", address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Local `HH:MM` of a unix timestamp
pub fn format_time(timestamp: u64) -> String {
    use chrono::TimeZone;

    chrono::Local
        .timestamp_opt(timestamp as i64, 0)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}
