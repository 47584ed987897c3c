//! Order record and its supporting enums.
//!
//! An [`Order`] is a mutable record: the submitter owns it while it is being
//! processed, and exactly one price level owns it while it rests. Every
//! state-changing step goes through [`Order::apply_fill`] so the
//! `filled_quantity` / `remaining_quantity` pair stays consistent.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::OrderBookError;
use crate::utils::current_time_millis;

/// Which side of the book an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Buy (bid) side.
    Buy,
    /// Sell (ask) side.
    Sell,
}

impl Side {
    /// The opposite side — the one an aggressor of this side matches against.
    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for Side {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(OrderBookError::UnknownSide(other.to_string())),
        }
    }
}

/// The seven supported order types.
///
/// Stop variants are rewritten in place when their trigger fires:
/// `StopLoss` becomes `Market`, `StopLimit` and `TakeProfit` become `Limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute immediately at the best available prices; never rests.
    Market,
    /// Execute at the limit price or better; any remainder rests.
    Limit,
    /// Immediate-or-cancel: fill what is available, discard the rest.
    Ioc,
    /// Fill-or-kill: fill in full immediately or produce no trades at all.
    Fok,
    /// Stop-loss: becomes a market order once the trigger fires.
    StopLoss,
    /// Stop-limit: becomes a limit order once the trigger fires.
    StopLimit,
    /// Take-profit: becomes a limit order once the trigger fires.
    TakeProfit,
}

impl OrderType {
    /// True for the three latent stop variants.
    #[must_use]
    pub fn is_stop(self) -> bool {
        matches!(
            self,
            OrderType::StopLoss | OrderType::StopLimit | OrderType::TakeProfit
        )
    }

    /// True for types that cannot be accepted without a limit price.
    ///
    /// `TakeProfit` is included: it converts to `Limit` on trigger, and a
    /// limit order without a price is invalid.
    #[must_use]
    pub fn requires_price(self) -> bool {
        matches!(
            self,
            OrderType::Limit | OrderType::StopLimit | OrderType::TakeProfit
        )
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Ioc => "ioc",
            OrderType::Fok => "fok",
            OrderType::StopLoss => "stop_loss",
            OrderType::StopLimit => "stop_limit",
            OrderType::TakeProfit => "take_profit",
        };
        write!(f, "{token}")
    }
}

impl FromStr for OrderType {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            "ioc" => Ok(OrderType::Ioc),
            "fok" => Ok(OrderType::Fok),
            "stop_loss" => Ok(OrderType::StopLoss),
            "stop_limit" => Ok(OrderType::StopLimit),
            "take_profit" => Ok(OrderType::TakeProfit),
            other => Err(OrderBookError::UnknownOrderType(other.to_string())),
        }
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, not yet accepted by an engine.
    Pending,
    /// Resting in the book (or the stop book) with its full quantity.
    Open,
    /// Some quantity filled, some still live.
    PartiallyFilled,
    /// Fully filled. Terminal.
    Filled,
    /// Cancelled explicitly or by IOC/FOK discipline. Terminal.
    Cancelled,
    /// Failed validation or found no liquidity. Terminal.
    Rejected,
}

impl OrderStatus {
    /// Terminal states never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Open => "open",
            OrderStatus::PartiallyFilled => "partially_filled",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Rejected => "rejected",
        };
        write!(f, "{token}")
    }
}

/// Opaque order identifier, unique for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        OrderId(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(OrderId)
            .map_err(|_| OrderBookError::InvalidOrderId(s.to_string()))
    }
}

/// A single order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier.
    pub order_id: OrderId,
    /// Trading symbol this order belongs to.
    pub symbol: String,
    /// Order type; stop variants are rewritten when their trigger fires.
    pub order_type: OrderType,
    /// Buy or sell.
    pub side: Side,
    /// Original submitted quantity. Immutable once accepted.
    pub quantity: Decimal,
    /// Limit price. Required for limit-like types.
    pub price: Option<Decimal>,
    /// Trigger price. Required for stop variants.
    pub stop_price: Option<Decimal>,
    /// Acceptance time in milliseconds since the epoch.
    pub timestamp: u64,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Quantity filled so far. Monotonically non-decreasing.
    pub filled_quantity: Decimal,
    /// `quantity - filled_quantity`, maintained on every fill.
    pub remaining_quantity: Decimal,
}

impl Order {
    /// Create and validate a new order in `Pending` state.
    pub fn new(
        symbol: impl Into<String>,
        order_type: OrderType,
        side: Side,
        quantity: Decimal,
        price: Option<Decimal>,
        stop_price: Option<Decimal>,
    ) -> Result<Self, OrderBookError> {
        let order = Order {
            order_id: OrderId::new(),
            symbol: symbol.into(),
            order_type,
            side,
            quantity,
            price,
            stop_price,
            timestamp: current_time_millis(),
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: quantity,
        };
        order.validate()?;
        Ok(order)
    }

    /// Validate the order parameters.
    ///
    /// Quantity must be positive; limit-like types need a price; stop
    /// variants need a stop price.
    pub fn validate(&self) -> Result<(), OrderBookError> {
        if self.quantity <= Decimal::ZERO {
            return Err(OrderBookError::InvalidQuantity(self.quantity));
        }
        if self.order_type.requires_price() && self.price.is_none() {
            return Err(OrderBookError::MissingPrice(self.order_type));
        }
        if self.order_type.is_stop() && self.stop_price.is_none() {
            return Err(OrderBookError::MissingStopPrice(self.order_type));
        }
        Ok(())
    }

    /// Apply a fill, updating quantities and status.
    ///
    /// The fill quantity is always `min(taker.remaining, maker.remaining)`
    /// upstream, so the remainder can reach zero but never go below it.
    pub fn apply_fill(&mut self, fill_quantity: Decimal) {
        self.filled_quantity += fill_quantity;
        self.remaining_quantity -= fill_quantity;
        assert!(
            self.remaining_quantity >= Decimal::ZERO,
            "order {} overfilled: remaining {}",
            self.order_id,
            self.remaining_quantity
        );

        if self.remaining_quantity == Decimal::ZERO {
            self.status = OrderStatus::Filled;
        } else if self.filled_quantity > Decimal::ZERO {
            self.status = OrderStatus::PartiallyFilled;
        }
    }

    /// Rewrite a triggered stop order into its aggressive form.
    ///
    /// `StopLoss` becomes `Market` with its price cleared; `StopLimit` and
    /// `TakeProfit` become `Limit` at their existing price.
    pub fn convert_triggered(&mut self) {
        match self.order_type {
            OrderType::StopLoss => {
                self.order_type = OrderType::Market;
                self.price = None;
            }
            OrderType::StopLimit | OrderType::TakeProfit => {
                self.order_type = OrderType::Limit;
            }
            _ => {}
        }
    }

    /// True when the order executes at any price: market orders, and
    /// priceless IOC/FOK orders.
    #[must_use]
    pub fn is_marketable_at_any_price(&self) -> bool {
        self.order_type == OrderType::Market || self.price.is_none()
    }
}
