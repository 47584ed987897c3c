//! Decimal context shared by every price, quantity, and fee in the crate.
//!
//! All monetary arithmetic uses [`rust_decimal::Decimal`] — never floating
//! point. The context mirrors a 10-significant-digit decimal environment with
//! HALF-UP (midpoint away from zero) rounding; fees are externalized at a
//! fixed 8 decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::orderbook::OrderBookError;

/// Significant digits retained by context-aware arithmetic.
pub const PRECISION: u32 = 10;

/// Scale (decimal places) at which fees are externalized.
pub const FEE_SCALE: u32 = 8;

/// Rounding used throughout: midpoint rounds away from zero (HALF-UP).
pub const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Parse a decimal string from the wire into the fixed-precision context.
///
/// This is the single entry point for submitter-provided numbers, so the
/// precision policy has one home: the parsed value is clamped to 10
/// significant digits (HALF-UP) before any order is built from it. Invalid
/// input maps to [`OrderBookError::InvalidDecimal`].
pub fn parse(input: &str) -> Result<Decimal, OrderBookError> {
    input
        .trim()
        .parse::<Decimal>()
        .map(apply_precision)
        .map_err(|_| OrderBookError::InvalidDecimal(input.to_string()))
}

/// Clamp a computed value to the context precision (10 significant digits).
pub fn apply_precision(value: Decimal) -> Decimal {
    value
        .round_sf_with_strategy(PRECISION, ROUNDING)
        .unwrap_or(value)
}

/// Round a fee to its externalized scale of 8 decimal places, HALF-UP.
///
/// The result always carries exactly 8 decimal places so fees serialize in
/// the fixed form the wire contract shows (`"25.00000000"`).
pub fn round_fee(value: Decimal) -> Decimal {
    let mut fee = apply_precision(value).round_dp_with_strategy(FEE_SCALE, ROUNDING);
    fee.rescale(FEE_SCALE);
    fee
}
