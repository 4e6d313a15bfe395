//! Decimal parsing and rendering helpers.
//!
//! Every monetary computation in the crate goes through `rust_decimal`;
//! binary floats never enter the value path. Rounding is half away from
//! zero throughout, and only rendering rounds.

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a decimal string, with the offending value in the error message.
pub fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim()).with_context(|| format!("Invalid decimal value: {value:?}"))
}

/// Round to two decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn pad_fraction_to_dp(s: &str, dp: u32) -> String {
    if dp == 0 {
        return s
            .split_once('.')
            .map(|(i, _)| i.to_string())
            .unwrap_or_else(|| s.to_string());
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    let mut out = String::with_capacity(int_part.len() + 1 + dp as usize);
    out.push_str(int_part);
    out.push('.');

    let mut written = 0usize;
    for ch in frac_part.chars().take(dp as usize) {
        out.push(ch);
        written += 1;
    }
    while written < dp as usize {
        out.push('0');
        written += 1;
    }

    out
}

/// Render with exactly `dp` decimal places, rounding half away from zero.
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    pad_fraction_to_dp(&rounded.normalize().to_string(), dp)
}

/// Two-decimal amount string, e.g. `110.00`.
pub fn format_amount(value: Decimal) -> String {
    format_fixed(value, 2)
}

/// Four-decimal unit-price string, e.g. `1.1000`.
pub fn format_price(value: Decimal) -> String {
    format_fixed(value, 4)
}

/// Percentage string with a trailing sign, e.g. `10.00%`.
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_fixed(value, 2))
}
