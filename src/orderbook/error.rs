//! Order book error types.

use rust_decimal::Decimal;
use thiserror::Error;

use super::order::{OrderId, OrderType, Side};

/// Errors surfaced by the order book and matching engine.
///
/// Validation and lookup failures are recoverable and reported to the
/// submitter. Invariant violations (a retained empty level, a negative level
/// total) are not represented here: they are defects and abort the engine.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum OrderBookError {
    /// Order quantity was zero or negative.
    #[error("order quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    /// A limit-like order arrived without a limit price.
    #[error("{0} orders require a price")]
    MissingPrice(OrderType),

    /// A stop variant arrived without a stop price.
    #[error("{0} orders require a stop price")]
    MissingStopPrice(OrderType),

    /// A wire decimal failed to parse.
    #[error("invalid decimal value: {0:?}")]
    InvalidDecimal(String),

    /// A wire order id failed to parse.
    #[error("invalid order id: {0:?}")]
    InvalidOrderId(String),

    /// A wire side token was not `buy` / `sell`.
    #[error("unknown side: {0:?}")]
    UnknownSide(String),

    /// A wire order-type token did not name a supported type.
    #[error("unknown order type: {0:?}")]
    UnknownOrderType(String),

    /// An order with this id is already resting.
    #[error("duplicate order id: {0}")]
    DuplicateOrder(OrderId),

    /// A market order found no liquidity at all.
    #[error("insufficient liquidity for {side} market order: requested {requested}")]
    InsufficientLiquidity {
        /// Side of the rejected market order.
        side: Side,
        /// Quantity the order asked for.
        requested: Decimal,
    },

    /// The order was submitted to an engine for a different symbol.
    #[error("symbol mismatch: order is for {order_symbol:?}, engine owns {engine_symbol:?}")]
    SymbolMismatch {
        /// Symbol carried by the order.
        order_symbol: String,
        /// Symbol the engine was built for.
        engine_symbol: String,
    },
}
