//! Per-symbol matching engines and their collaborators: fees, trades,
//! events, stop handling, multi-symbol management, and persistence.

mod config;
mod events;
mod fees;
mod manager;
mod matching;
mod persistence;
mod stops;
mod trade;

pub use config::EngineConfig;
pub use events::{
    BBO_DEPTH, BboUpdate, ChannelSink, EventSink, EventSinkError, MarketEvent, MemorySink,
    NullSink,
};
pub use fees::FeeCalculator;
pub use manager::{EngineManager, OrderAck, OrderRequest};
pub use persistence::{BboQuote, ExchangeState, PersistenceError, PersistenceManager, SymbolState};
pub use trade::{Trade, TradeId};

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::orderbook::{BookSnapshot, Order, OrderBook, OrderBookError, OrderId, OrderStatus};
use crate::utils::current_time_millis;
use stops::StopBook;

/// The matching engine for one symbol.
///
/// All order flow for the symbol serializes on the engine's exclusive lock:
/// `process` and `cancel` are the only mutating entry points, and nothing
/// inside the critical section blocks on I/O — events are handed to the sink,
/// which must not block (see [`EventSink`]).
///
/// Different symbols run on independent engines and may execute in parallel;
/// the fee calculator and sink are shared, read-only collaborators.
pub struct MatchingEngine {
    symbol: String,
    fees: FeeCalculator,
    sink: Arc<dyn EventSink>,
    state: Mutex<EngineState>,
}

pub(crate) struct EngineState {
    pub(crate) book: OrderBook,
    pub(crate) stops: StopBook,
}

impl MatchingEngine {
    /// Create an engine with default fees and no event sink.
    #[must_use]
    pub fn new(symbol: &str) -> Self {
        MatchingEngine::with_sink(symbol, FeeCalculator::default(), Arc::new(NullSink))
    }

    /// Create an engine with an explicit fee calculator and event sink.
    #[must_use]
    pub fn with_sink(symbol: &str, fees: FeeCalculator, sink: Arc<dyn EventSink>) -> Self {
        info!(%symbol, "initialized matching engine");
        MatchingEngine {
            symbol: symbol.to_string(),
            fees,
            sink,
            state: Mutex::new(EngineState {
                book: OrderBook::new(symbol),
                stops: StopBook::new(),
            }),
        }
    }

    /// The symbol this engine owns.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The engine's fee calculator.
    #[must_use]
    pub fn fees(&self) -> &FeeCalculator {
        &self.fees
    }

    /// Process an incoming order, returning every trade it produced —
    /// including trades from stop orders its book impact triggered.
    ///
    /// The order is mutated in place: on return it carries its final status
    /// and fill quantities as of this call. Validation failures mark it
    /// `Rejected` and surface the error with the book untouched; a duplicate
    /// id is surfaced without any state change.
    pub fn process(&self, order: &mut Order) -> Result<Vec<Trade>, OrderBookError> {
        if order.symbol != self.symbol {
            order.status = OrderStatus::Rejected;
            return Err(OrderBookError::SymbolMismatch {
                order_symbol: order.symbol.clone(),
                engine_symbol: self.symbol.clone(),
            });
        }
        if let Err(err) = order.validate() {
            order.status = OrderStatus::Rejected;
            return Err(err);
        }

        let mut state = self.lock_state();
        if state.book.contains(order.order_id) || state.stops.contains(order.order_id) {
            return Err(OrderBookError::DuplicateOrder(order.order_id));
        }

        let result = if order.order_type.is_stop() {
            self.enter_stop(&mut state, order)
        } else {
            self.execute_aggressive(&mut state, order)
        };

        let mut trades = match result {
            Ok(trades) => trades,
            Err(err) => {
                info!(
                    symbol = %self.symbol,
                    order_id = %order.order_id,
                    status = %order.status,
                    %err,
                    "order not accepted"
                );
                return Err(err);
            }
        };

        // Fills and newly rested orders can move the BBO, which can fire
        // resting stops; drain until a pass triggers nothing.
        trades.extend(self.drain_triggered_stops(&mut state));

        info!(
            symbol = %self.symbol,
            order_id = %order.order_id,
            status = %order.status,
            trades = trades.len(),
            "processed order"
        );
        Ok(trades)
    }

    /// Cancel a resting order (in the book or the stop book) by id.
    ///
    /// Returns the cancelled order, or `None` for an unknown id — a soft
    /// failure with no state change. A book cancel changes visible depth and
    /// is followed by a BBO update. Removing liquidity only moves the BBO
    /// away from resting stop triggers, so no stop re-evaluation is needed.
    pub fn cancel(&self, order_id: OrderId) -> Option<Order> {
        let mut state = self.lock_state();
        if let Some(order) = state.book.remove_order(order_id) {
            info!(symbol = %self.symbol, %order_id, "cancelled resting order");
            self.emit_bbo(&state.book);
            return Some(order);
        }
        let stop = state.stops.remove(order_id);
        if stop.is_some() {
            info!(symbol = %self.symbol, %order_id, "cancelled resting stop order");
        }
        stop
    }

    /// A consistent snapshot of the book, at most `depth` levels per side.
    #[must_use]
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let state = self.lock_state();
        let (bids, asks) = state.book.depth(depth);
        let (best_bid, best_ask) = state.book.bbo();
        BookSnapshot {
            timestamp: current_time_millis(),
            symbol: self.symbol.clone(),
            bids,
            asks,
            best_bid,
            best_ask,
        }
    }

    /// Look up a resting order (book or stop book) by id.
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        let state = self.lock_state();
        state
            .book
            .get_order(order_id)
            .cloned()
            .or_else(|| state.stops.get(order_id).cloned())
    }

    /// Every order currently resting in the book or the stop book.
    ///
    /// Used by persistence; all returned orders have status `Open` or
    /// `PartiallyFilled`.
    #[must_use]
    pub fn resting_orders(&self) -> Vec<Order> {
        let state = self.lock_state();
        state
            .book
            .orders()
            .cloned()
            .chain(state.stops.orders().cloned())
            .collect()
    }

    /// Reinstate a recovered order without matching it.
    ///
    /// Stop variants go back to the stop book; everything else rests in the
    /// order book at its limit price.
    pub fn restore_order(&self, order: Order) -> Result<(), OrderBookError> {
        order.validate()?;
        let mut state = self.lock_state();
        if state.book.contains(order.order_id) || state.stops.contains(order.order_id) {
            return Err(OrderBookError::DuplicateOrder(order.order_id));
        }
        if order.order_type.is_stop() {
            state.stops.add(order)
        } else {
            state.book.add_order(order)
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        // A poisoned lock means an invariant panic already happened; the
        // engine must not keep trading on corrupt state.
        self.state.lock().expect("engine state lock poisoned")
    }
}
