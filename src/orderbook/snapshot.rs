//! Order book snapshot types for market data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One aggregated price level: `(price, total_quantity)`.
///
/// Serializes as a two-element array of decimal strings, which is the wire
/// shape of every depth listing (snapshots and BBO updates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel(pub Decimal, pub Decimal);

impl DepthLevel {
    /// The level's price.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.0
    }

    /// Total remaining quantity resting at this price.
    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.1
    }
}

/// A consistent view of one book at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Capture time in milliseconds since the epoch.
    pub timestamp: u64,
    /// The snapshotted symbol.
    pub symbol: String,
    /// Bid levels, highest price first.
    pub bids: Vec<DepthLevel>,
    /// Ask levels, lowest price first.
    pub asks: Vec<DepthLevel>,
    /// Best bid price, when the bid side is non-empty.
    pub best_bid: Option<Decimal>,
    /// Best ask price, when the ask side is non-empty.
    pub best_ask: Option<Decimal>,
}

impl BookSnapshot {
    /// Best ask minus best bid, when both sides are populated.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Total quantity across the included bid levels.
    #[must_use]
    pub fn total_bid_quantity(&self) -> Decimal {
        self.bids.iter().map(DepthLevel::quantity).sum()
    }

    /// Total quantity across the included ask levels.
    #[must_use]
    pub fn total_ask_quantity(&self) -> Decimal {
        self.asks.iter().map(DepthLevel::quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn depth_levels_serialize_as_string_pairs() {
        let level = DepthLevel(dec!(50000), dec!(1.5));
        let json = serde_json::to_string(&level).unwrap();
        assert_eq!(json, r#"["50000","1.5"]"#);
    }

    #[test]
    fn snapshot_aggregates() {
        let snapshot = BookSnapshot {
            timestamp: 0,
            symbol: "BTC-USDT".to_string(),
            bids: vec![DepthLevel(dec!(49995), dec!(2)), DepthLevel(dec!(49990), dec!(1))],
            asks: vec![DepthLevel(dec!(50005), dec!(4))],
            best_bid: Some(dec!(49995)),
            best_ask: Some(dec!(50005)),
        };
        assert_eq!(snapshot.spread(), Some(dec!(10)));
        assert_eq!(snapshot.total_bid_quantity(), dec!(3));
        assert_eq!(snapshot.total_ask_quantity(), dec!(4));
    }
}
