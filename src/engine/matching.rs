//! Aggressive-order execution: the matching loop and per-type
//! post-conditions.

use rust_decimal::Decimal;
use tracing::{error, trace};

use super::events::{BBO_DEPTH, BboUpdate, MarketEvent};
use super::trade::Trade;
use super::{EngineState, MatchingEngine};
use crate::orderbook::{Order, OrderBook, OrderBookError, OrderStatus, OrderType};
use crate::utils::current_time_millis;

impl MatchingEngine {
    /// Run one aggressive order against the book: match what crosses, apply
    /// the order type's post-conditions, and publish market data.
    ///
    /// Called with the engine lock held, for submitted orders and for stop
    /// orders whose trigger fired.
    pub(super) fn execute_aggressive(
        &self,
        state: &mut EngineState,
        order: &mut Order,
    ) -> Result<Vec<Trade>, OrderBookError> {
        // Fill-or-kill is atomic: pre-compute the immediately fillable
        // quantity and walk away before any fill if it falls short. No fill
        // is ever applied that would need rolling back.
        if order.order_type == OrderType::Fok {
            let fillable = state
                .book
                .fillable_quantity(order.side, order.price, order.quantity);
            if fillable < order.quantity {
                trace!(
                    order_id = %order.order_id,
                    requested = %order.quantity,
                    %fillable,
                    "fill-or-kill not satisfiable, cancelling"
                );
                order.status = OrderStatus::Cancelled;
                return Ok(Vec::new());
            }
        }

        let mut trades = Vec::new();
        if state.book.can_match(order) {
            trades = self.run_matching_loop(&mut state.book, order);
        }

        match order.order_type {
            OrderType::Limit if order.remaining_quantity > Decimal::ZERO => {
                state.book.add_order(order.clone())?;
                // Mirror the resting status onto the caller's copy.
                order.status = if order.filled_quantity > Decimal::ZERO {
                    OrderStatus::PartiallyFilled
                } else {
                    OrderStatus::Open
                };
            }
            OrderType::Market if order.filled_quantity == Decimal::ZERO => {
                order.status = OrderStatus::Rejected;
                return Err(OrderBookError::InsufficientLiquidity {
                    side: order.side,
                    requested: order.quantity,
                });
            }
            OrderType::Ioc if order.remaining_quantity > Decimal::ZERO => {
                // Never rests: the unfilled remainder is discarded.
                order.status = OrderStatus::Cancelled;
            }
            // A market remainder keeps `PartiallyFilled` from the fills it
            // took; it never rests either, the book is simply left alone.
            _ => {}
        }

        if !trades.is_empty() || order.order_type == OrderType::Limit {
            self.emit_bbo(&state.book);
        }
        Ok(trades)
    }

    /// Consume the opposite side best-price-first until the taker is
    /// exhausted or nothing crosses any more.
    fn run_matching_loop(&self, book: &mut OrderBook, taker: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();
        let book_side = taker.side.opposite();

        while taker.remaining_quantity > Decimal::ZERO && book.can_match(taker) {
            let Some(maker) = book.peek_top(book_side) else {
                break;
            };
            let fill = taker.remaining_quantity.min(maker.remaining_quantity);

            let Some(maker_fill) = book.fill_top(book_side, fill) else {
                break;
            };
            taker.apply_fill(fill);

            // Execution at the maker's resting price: the taker never trades
            // through the best quoted price.
            let (maker_fee, taker_fee) = self.fees().fees(maker_fill.price, fill);
            let trade = Trade::record(
                self.symbol(),
                maker_fill.price,
                fill,
                taker.side,
                maker_fill.order_id,
                taker.order_id,
                maker_fee,
                taker_fee,
            );
            trace!(
                trade_id = %trade.trade_id,
                price = %trade.price,
                quantity = %trade.quantity,
                "trade executed"
            );
            self.publish(MarketEvent::Trade(trade.clone()));
            trades.push(trade);
        }

        trades
    }

    /// Hand an event to the sink. Sink failures are logged and swallowed so
    /// they never disturb matching.
    pub(super) fn publish(&self, event: MarketEvent) {
        if let Err(err) = self.sink.publish(event) {
            error!(symbol = %self.symbol, %err, "event sink rejected event");
        }
    }

    /// Publish a top-of-book refresh for the current book state.
    pub(super) fn emit_bbo(&self, book: &OrderBook) {
        let (bids, asks) = book.depth(BBO_DEPTH);
        let (best_bid, best_ask) = book.bbo();
        self.publish(MarketEvent::BboUpdate(BboUpdate {
            timestamp: current_time_millis(),
            symbol: self.symbol.to_string(),
            best_bid,
            best_ask,
            best_bid_quantity: book.best_bid_quantity(),
            best_ask_quantity: book.best_ask_quantity(),
            bids,
            asks,
        }));
    }
}
