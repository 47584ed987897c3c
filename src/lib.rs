//! # Matchbook: a limit-order-book matching core
//!
//! A single-venue continuous limit-order-book matching core written in Rust.
//! Each trading symbol is owned by one [`MatchingEngine`] that maintains a
//! two-sided price-indexed book, matches incoming orders under strict
//! price-time priority, and publishes a trade stream and best-bid/offer
//! snapshots after every state-changing event.
//!
//! ## Key properties
//!
//! - **Price-time priority**: levels are consumed best price first, FIFO
//!   within a price. Execution always happens at the maker's resting price,
//!   so a taker never trades through the best quoted price.
//! - **Seven order types**: market, limit, immediate-or-cancel,
//!   fill-or-kill, stop-loss, stop-limit, and take-profit. Fill-or-kill is
//!   atomic by pre-computation — a failed FOK leaves the book untouched and
//!   produces no trades. Stops rest in a dedicated trigger-price book and
//!   are re-evaluated on every BBO change.
//! - **Fixed-precision decimals**: every price, quantity, and fee is a
//!   [`rust_decimal::Decimal`]; fees round HALF-UP and serialize as strings.
//! - **Single writer per symbol**: all mutation for one symbol serializes on
//!   its engine's lock; engines for different symbols run in parallel.
//!   Event emission is non-blocking.
//!
//! ## Architecture
//!
//! ```text
//! Submitter ──▶ EngineManager ──▶ MatchingEngine(symbol) ──▶ OrderBook ──▶ PriceLevel
//!                                        │
//!                                        ├──▶ FeeCalculator (pure)
//!                                        └──▶ EventSink (trade, bbo update)
//! ```
//!
//! ## Quick start
//!
//! ```
//! use matchbook_rs::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let engine = MatchingEngine::new("BTC-USDT");
//!
//! let mut bid = Order::new(
//!     "BTC-USDT",
//!     OrderType::Limit,
//!     Side::Buy,
//!     dec!(1),
//!     Some(dec!(50000)),
//!     None,
//! )?;
//! assert!(engine.process(&mut bid)?.is_empty());
//!
//! let mut ask = Order::new(
//!     "BTC-USDT",
//!     OrderType::Limit,
//!     Side::Sell,
//!     dec!(1),
//!     Some(dec!(50000)),
//!     None,
//! )?;
//! let trades = engine.process(&mut ask)?;
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].price, dec!(50000));
//! # Ok::<(), matchbook_rs::OrderBookError>(())
//! ```

pub mod decimal;
pub mod engine;
pub mod orderbook;
pub mod prelude;
mod utils;

pub use engine::{
    BBO_DEPTH, BboQuote, BboUpdate, ChannelSink, EngineConfig, EngineManager, EventSink,
    EventSinkError, ExchangeState, FeeCalculator, MarketEvent, MatchingEngine, MemorySink,
    NullSink, OrderAck, OrderRequest, PersistenceError, PersistenceManager, SymbolState, Trade,
    TradeId,
};
pub use orderbook::{
    BookSnapshot, DepthLevel, Order, OrderBook, OrderBookError, OrderId, OrderStatus, OrderType,
    PriceLevel, Side,
};
