//! Immutable trade records.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::orderbook::{OrderId, Side};
use crate::utils::current_time_millis;

/// Opaque trade identifier: a full 128-bit random id exposed as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(Uuid);

impl TradeId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        TradeId(Uuid::new_v4())
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One execution between a resting maker and an incoming taker.
///
/// Trades are value records: produced once per fill, never mutated, and
/// producing one never touches the book. The price is always the maker's
/// resting price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique trade identifier.
    pub trade_id: TradeId,
    /// Symbol the fill occurred on.
    pub symbol: String,
    /// Execution price — the maker's resting price.
    pub price: Decimal,
    /// Executed quantity.
    pub quantity: Decimal,
    /// Side of the incoming (aggressive) order.
    pub aggressor_side: Side,
    /// Id of the resting order that was consumed.
    pub maker_order_id: OrderId,
    /// Id of the incoming order.
    pub taker_order_id: OrderId,
    /// Execution time in milliseconds since the epoch.
    pub timestamp: u64,
    /// Fee charged to the maker.
    pub maker_fee: Decimal,
    /// Fee charged to the taker.
    pub taker_fee: Decimal,
}

impl Trade {
    /// Record a fill, stamping a fresh id and timestamp.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn record(
        symbol: &str,
        price: Decimal,
        quantity: Decimal,
        aggressor_side: Side,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_fee: Decimal,
        taker_fee: Decimal,
    ) -> Self {
        Trade {
            trade_id: TradeId::new(),
            symbol: symbol.to_string(),
            price,
            quantity,
            aggressor_side,
            maker_order_id,
            taker_order_id,
            timestamp: current_time_millis(),
            maker_fee,
            taker_fee,
        }
    }

    /// Notional value of the fill (`price × quantity`).
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}
