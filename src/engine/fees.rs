//! Maker/taker fee calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::round_fee;

/// Pure maker/taker fee calculator.
///
/// `fee = price × quantity × rate`, computed in the crate's decimal context
/// and externalized at 8 decimal places. Defaults are 0.1% maker, 0.2%
/// taker. The calculator is read-only after construction and can be shared
/// freely across engines.
///
/// # Examples
///
/// ```
/// use matchbook_rs::FeeCalculator;
/// use rust_decimal::Decimal;
///
/// let fees = FeeCalculator::default();
/// let maker = fees.maker_fee(Decimal::from(50000), Decimal::new(5, 1));
/// assert_eq!(maker.to_string(), "25.00000000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeCalculator {
    /// Fee rate applied to the resting (maker) side.
    maker_rate: Decimal,
    /// Fee rate applied to the aggressive (taker) side.
    taker_rate: Decimal,
}

impl FeeCalculator {
    /// Default maker rate: 0.1%.
    pub const DEFAULT_MAKER_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);
    /// Default taker rate: 0.2%.
    pub const DEFAULT_TAKER_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 3);

    /// Create a calculator with explicit rates.
    #[must_use]
    pub fn new(maker_rate: Decimal, taker_rate: Decimal) -> Self {
        FeeCalculator {
            maker_rate,
            taker_rate,
        }
    }

    /// A calculator that charges nothing on either side.
    #[must_use]
    pub fn zero_fee() -> Self {
        FeeCalculator::new(Decimal::ZERO, Decimal::ZERO)
    }

    /// True when both rates are zero.
    #[must_use]
    pub fn is_zero_fee(&self) -> bool {
        self.maker_rate == Decimal::ZERO && self.taker_rate == Decimal::ZERO
    }

    /// The maker fee for a fill of `quantity` at `price`.
    #[must_use]
    pub fn maker_fee(&self, price: Decimal, quantity: Decimal) -> Decimal {
        round_fee(price * quantity * self.maker_rate)
    }

    /// The taker fee for a fill of `quantity` at `price`.
    #[must_use]
    pub fn taker_fee(&self, price: Decimal, quantity: Decimal) -> Decimal {
        round_fee(price * quantity * self.taker_rate)
    }

    /// Both fees for one fill, `(maker, taker)`.
    #[must_use]
    pub fn fees(&self, price: Decimal, quantity: Decimal) -> (Decimal, Decimal) {
        (
            self.maker_fee(price, quantity),
            self.taker_fee(price, quantity),
        )
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        FeeCalculator::new(Self::DEFAULT_MAKER_RATE, Self::DEFAULT_TAKER_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_rates_match_the_fee_table() {
        let fees = FeeCalculator::default();
        assert_eq!(FeeCalculator::DEFAULT_MAKER_RATE, dec!(0.001));
        assert_eq!(FeeCalculator::DEFAULT_TAKER_RATE, dec!(0.002));
        assert!(!fees.is_zero_fee());
    }

    #[test]
    fn maker_and_taker_fees_on_a_reference_trade() {
        // price 50000, qty 0.5: notional 25000.
        let fees = FeeCalculator::default();
        let (maker, taker) = fees.fees(dec!(50000), dec!(0.5));
        assert_eq!(maker.to_string(), "25.00000000");
        assert_eq!(taker.to_string(), "50.00000000");
    }

    #[test]
    fn custom_rates_apply_independently() {
        let fees = FeeCalculator::new(dec!(0.0005), dec!(0.003));
        assert_eq!(fees.maker_fee(dec!(1000), dec!(1)), dec!(0.50000000));
        assert_eq!(fees.taker_fee(dec!(1000), dec!(1)), dec!(3.00000000));
    }

    #[test]
    fn zero_fee_calculator_charges_nothing() {
        let fees = FeeCalculator::zero_fee();
        assert!(fees.is_zero_fee());
        assert_eq!(fees.maker_fee(dec!(50000), dec!(2)), Decimal::ZERO);
        assert_eq!(fees.taker_fee(dec!(50000), dec!(2)), Decimal::ZERO);
    }
}
