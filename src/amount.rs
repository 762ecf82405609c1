//! Amount arithmetic
//!
//! Human-facing amounts are `rust_decimal::Decimal`; on-chain amounts are
//! `U256` base units. Conversion goes through `ethers::utils` so decimals
//! are handled exactly.

use std::str::FromStr;

use ethers::types::U256;
use ethers::utils::{format_units, parse_units};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::timing;
use crate::error::Error;

/// Decimal places shown for amounts and used for minimum outputs
pub const DISPLAY_DECIMALS: u32 = 6;

/// Percent of the desired amount accepted as a liquidity minimum
pub const LIQUIDITY_MIN_PERCENT: u64 = 95;

/// Share of a balance offered by the MAX button
const MAX_SPEND_PER_MILLE: i64 = 999;

/// Parse a user-entered amount into a positive decimal
pub fn parse_decimal(amount: &str) -> Result<Decimal, Error> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidAmount("Amount is empty".to_string()));
    }
    Decimal::from_str(trimmed)
        .map_err(|_| Error::InvalidAmount(format!("Invalid number format: {}", trimmed)))
}

/// True when `amount` parses to a strictly positive number
pub fn is_positive(amount: &str) -> bool {
    parse_decimal(amount)
        .map(|d| d > Decimal::ZERO)
        .unwrap_or(false)
}

/// Convert a human amount to base units
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, Error> {
    let value = parse_decimal(amount)?;
    if value.is_sign_negative() {
        return Err(Error::InvalidAmount("Amount must be positive".to_string()));
    }
    let normalized = value.normalize().to_string();
    let parsed = parse_units(&normalized, decimals as u32)
        .map_err(|e| Error::InvalidAmount(format!("{}: {}", normalized, e)))?;
    Ok(parsed.into())
}

/// Convert base units to a human amount
pub fn from_base_units(raw: U256, decimals: u8) -> Result<Decimal, Error> {
    let formatted = format_units(raw, decimals as u32)
        .map_err(|e| Error::InvalidAmount(e.to_string()))?;
    Decimal::from_str(&formatted)
        .map_err(|e| Error::InvalidAmount(format!("{}: {}", formatted, e)))
}

/// Round to the display precision
pub fn round_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Format with exactly six decimals
pub fn format_display(value: Decimal) -> String {
    format!("{:.6}", round_display(value))
}

/// Slippage tolerance must lie in [0.1, 50] percent
pub fn validate_slippage(slippage: Decimal) -> Result<Decimal, Error> {
    let min = Decimal::new(1, 1);
    let max = Decimal::from(50);
    if slippage < min || slippage > max {
        return Err(Error::InvalidInput(format!(
            "Slippage must be between {}% and {}%, got {}%",
            min, max, slippage
        )));
    }
    Ok(slippage)
}

/// Minimum acceptable swap output: `quoted * (100 - slippage) / 100`,
/// rounded to six decimals
pub fn minimum_output(quoted: Decimal, slippage: Decimal) -> Result<Decimal, Error> {
    let slippage = validate_slippage(slippage)?;
    let hundred = Decimal::from(100);
    Ok(round_display(quoted * (hundred - slippage) / hundred))
}

/// Liquidity minimum: 95% of the desired base-unit amount
pub fn liquidity_minimum(desired: U256) -> U256 {
    desired * U256::from(LIQUIDITY_MIN_PERCENT) / U256::from(100u64)
}

/// Router deadline for a call issued at `now_secs`
pub fn deadline(now_secs: u64) -> U256 {
    U256::from(now_secs + timing::DEADLINE_SECS)
}

/// Wall-clock unix seconds
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Deadline relative to the wall clock
pub fn deadline_from_now() -> U256 {
    deadline(unix_now())
}

/// Amount offered by the MAX button, leaving a small gas buffer
pub fn max_spendable(balance: Decimal) -> Decimal {
    round_display(balance * Decimal::new(MAX_SPEND_PER_MILLE, 3))
}

/// Second liquidity amount implied by the pool ratio
pub fn paired_amount(amount_a: Decimal, reserve_a: Decimal, reserve_b: Decimal) -> Option<Decimal> {
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return None;
    }
    Some(round_display(amount_a * reserve_b / reserve_a))
}

/// Sum that stops at `Decimal::MAX` instead of overflowing
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, |total, value| {
        total.checked_add(value).unwrap_or(if value.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_minimum_output_rounds_to_six_places() {
        // 20.123456 * 99.5 / 100 = 20.02283872
        let min = minimum_output(dec("20.123456"), dec("0.5")).unwrap();
        assert_eq!(min, dec("20.022839"));
        assert_eq!(format_display(min), "20.022839");
    }

    #[test]
    fn test_minimum_output_slippage_bounds() {
        assert_eq!(minimum_output(dec("100"), dec("0.1")).unwrap(), dec("99.9"));
        assert_eq!(minimum_output(dec("100"), dec("50")).unwrap(), dec("50"));
        assert!(minimum_output(dec("100"), dec("0.05")).is_err());
        assert!(minimum_output(dec("100"), dec("50.1")).is_err());
    }

    #[test]
    fn test_base_unit_conversion() {
        assert_eq!(to_base_units("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(
            to_base_units("10", 18).unwrap(),
            U256::from(10u64) * U256::exp10(18)
        );
        assert_eq!(
            from_base_units(U256::from(123_456_789u64), 8).unwrap(),
            dec("1.23456789")
        );
        assert!(to_base_units("-1", 6).is_err());
        assert!(to_base_units("abc", 6).is_err());
        assert!(to_base_units("", 6).is_err());
    }

    #[test]
    fn test_is_positive() {
        assert!(is_positive("0.0001"));
        assert!(!is_positive("0"));
        assert!(!is_positive("-3"));
        assert!(!is_positive(""));
        assert!(!is_positive("ten"));
    }

    #[test]
    fn test_liquidity_minimum_and_deadline() {
        assert_eq!(liquidity_minimum(U256::from(1000u64)), U256::from(950u64));
        assert_eq!(liquidity_minimum(U256::from(1u64)), U256::zero());
        assert_eq!(deadline(1_700_000_000), U256::from(1_700_000_600u64));
    }

    #[test]
    fn test_max_spendable_and_paired_amount() {
        assert_eq!(max_spendable(dec("100")), dec("99.9"));
        assert_eq!(
            paired_amount(dec("2"), dec("10"), dec("25")),
            Some(dec("5"))
        );
        assert_eq!(paired_amount(dec("2"), Decimal::ZERO, dec("25")), None);
    }

    #[test]
    fn test_saturating_sum() {
        assert_eq!(saturating_sum([dec("1.5"), dec("2")]), dec("3.5"));
        assert_eq!(saturating_sum([Decimal::MAX, Decimal::ONE]), Decimal::MAX);
        assert_eq!(saturating_sum(Vec::new()), Decimal::ZERO);
    }
}
