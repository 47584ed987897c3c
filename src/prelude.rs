//! Prelude module that re-exports commonly used types and traits.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use matchbook_rs::prelude::*;
//! ```

// Core order book types
pub use crate::orderbook::{
    BookSnapshot, DepthLevel, Order, OrderBook, OrderBookError, OrderId, OrderStatus, OrderType,
    PriceLevel, Side,
};

// Engine and management types
pub use crate::engine::{EngineConfig, EngineManager, FeeCalculator, MatchingEngine};

// Trade and event types
pub use crate::engine::{
    BboUpdate, ChannelSink, EventSink, EventSinkError, MarketEvent, MemorySink, NullSink, Trade,
    TradeId,
};

// Wire boundary types
pub use crate::engine::{OrderAck, OrderRequest};

// Persistence types
pub use crate::engine::{BboQuote, ExchangeState, PersistenceError, PersistenceManager, SymbolState};

// Utility functions
pub use crate::utils::current_time_millis;
