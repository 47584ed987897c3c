//! Resting stop orders and their trigger evaluation.
//!
//! Stops do not live in the order book: they rest in a dedicated
//! [`StopBook`] keyed by trigger price per side, and every operation that can
//! move the BBO re-evaluates them. A triggered stop is rewritten into its
//! aggressive form and run through the normal matching path, which can move
//! the BBO again — draining repeats until a pass triggers nothing.

use std::collections::{BTreeMap, HashMap, VecDeque};

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::trade::Trade;
use super::{EngineState, MatchingEngine};
use crate::orderbook::{Order, OrderBookError, OrderId, OrderStatus, Side};

/// Resting stop orders for one symbol, keyed by trigger price.
///
/// Buy stops fire when the best ask falls to or below their trigger; sell
/// stops fire when the best bid rises to or above theirs. Within one trigger
/// price, stops fire in arrival order.
#[derive(Debug, Default)]
pub(crate) struct StopBook {
    buy: BTreeMap<Decimal, VecDeque<Order>>,
    sell: BTreeMap<Decimal, VecDeque<Order>>,
    locations: HashMap<OrderId, (Decimal, Side)>,
}

impl StopBook {
    pub(crate) fn new() -> Self {
        StopBook::default()
    }

    pub(crate) fn contains(&self, order_id: OrderId) -> bool {
        self.locations.contains_key(&order_id)
    }

    pub(crate) fn get(&self, order_id: OrderId) -> Option<&Order> {
        let (trigger, side) = self.locations.get(&order_id)?;
        self.side(*side)
            .get(trigger)
            .and_then(|queue| queue.iter().find(|o| o.order_id == order_id))
    }

    /// Rest a stop order, keyed by its trigger price.
    pub(crate) fn add(&mut self, mut order: Order) -> Result<(), OrderBookError> {
        let trigger = order
            .stop_price
            .ok_or(OrderBookError::MissingStopPrice(order.order_type))?;
        order.status = OrderStatus::Open;
        self.locations.insert(order.order_id, (trigger, order.side));
        let side = order.side;
        self.side_mut(side).entry(trigger).or_default().push_back(order);
        Ok(())
    }

    /// Remove a resting stop by id, marking it `Cancelled`.
    pub(crate) fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let (trigger, side) = self.locations.remove(&order_id)?;
        let queue = self.side_mut(side).get_mut(&trigger)?;
        let position = queue.iter().position(|o| o.order_id == order_id)?;
        let mut order = queue.remove(position)?;
        if queue.is_empty() {
            self.side_mut(side).remove(&trigger);
        }
        order.status = OrderStatus::Cancelled;
        Some(order)
    }

    /// Iterate every resting stop, buys first.
    pub(crate) fn orders(&self) -> impl Iterator<Item = &Order> {
        self.buy
            .values()
            .chain(self.sell.values())
            .flat_map(VecDeque::iter)
    }

    /// Remove and return every stop whose trigger condition holds against
    /// the given BBO, nearest trigger first, FIFO within one trigger price.
    pub(crate) fn take_triggered(
        &mut self,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
    ) -> Vec<Order> {
        let mut triggered = Vec::new();

        if let Some(ask) = best_ask {
            // Buy stops with trigger >= best ask, nearest (lowest) first.
            let keys: Vec<Decimal> = self.buy.range(ask..).map(|(k, _)| *k).collect();
            for key in keys {
                if let Some(queue) = self.buy.remove(&key) {
                    for order in &queue {
                        self.locations.remove(&order.order_id);
                    }
                    triggered.extend(queue);
                }
            }
        }

        if let Some(bid) = best_bid {
            // Sell stops with trigger <= best bid, nearest (highest) first.
            let keys: Vec<Decimal> = self.sell.range(..=bid).map(|(k, _)| *k).collect();
            for key in keys.into_iter().rev() {
                if let Some(queue) = self.sell.remove(&key) {
                    for order in &queue {
                        self.locations.remove(&order.order_id);
                    }
                    triggered.extend(queue);
                }
            }
        }

        triggered
    }

    fn side(&self, side: Side) -> &BTreeMap<Decimal, VecDeque<Order>> {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, VecDeque<Order>> {
        match side {
            Side::Buy => &mut self.buy,
            Side::Sell => &mut self.sell,
        }
    }
}

impl MatchingEngine {
    /// Handle a newly submitted stop order: execute it immediately when its
    /// trigger already holds, otherwise rest it in the stop book.
    pub(super) fn enter_stop(
        &self,
        state: &mut EngineState,
        order: &mut Order,
    ) -> Result<Vec<Trade>, OrderBookError> {
        let (best_bid, best_ask) = state.book.bbo();
        if stop_condition_holds(order, best_bid, best_ask) {
            order.convert_triggered();
            return self.execute_aggressive(state, order);
        }

        state.stops.add(order.clone())?;
        order.status = OrderStatus::Open;
        info!(
            symbol = %self.symbol(),
            order_id = %order.order_id,
            stop_price = %order.stop_price.unwrap_or_default(),
            "stop order resting"
        );
        Ok(Vec::new())
    }

    /// Fire every stop whose trigger now holds, repeating until a pass
    /// triggers nothing. Returns all trades the fired stops produced.
    pub(super) fn drain_triggered_stops(&self, state: &mut EngineState) -> Vec<Trade> {
        let mut trades = Vec::new();
        loop {
            let (best_bid, best_ask) = state.book.bbo();
            let batch = state.stops.take_triggered(best_bid, best_ask);
            if batch.is_empty() {
                break;
            }
            for mut stop in batch {
                info!(
                    symbol = %self.symbol(),
                    order_id = %stop.order_id,
                    "stop order triggered"
                );
                stop.convert_triggered();
                match self.execute_aggressive(state, &mut stop) {
                    Ok(stop_trades) => trades.extend(stop_trades),
                    Err(err) => {
                        // A converted market stop can find an empty book;
                        // the stop ends rejected and matching moves on.
                        warn!(
                            symbol = %self.symbol(),
                            order_id = %stop.order_id,
                            %err,
                            "triggered stop order could not execute"
                        );
                    }
                }
            }
        }
        trades
    }
}

/// Whether a stop order's trigger condition holds against the current BBO.
fn stop_condition_holds(
    order: &Order,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
) -> bool {
    let Some(stop_price) = order.stop_price else {
        return false;
    };
    match order.side {
        Side::Buy => best_ask.is_some_and(|ask| ask <= stop_price),
        Side::Sell => best_bid.is_some_and(|bid| bid >= stop_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::OrderType;
    use rust_decimal_macros::dec;

    fn stop(side: Side, trigger: Decimal) -> Order {
        Order::new(
            "BTC-USDT",
            OrderType::StopLoss,
            side,
            dec!(1),
            None,
            Some(trigger),
        )
        .unwrap()
    }

    #[test]
    fn resting_stop_is_open_and_locatable() {
        let mut stops = StopBook::new();
        let order = stop(Side::Buy, dec!(50000));
        let id = order.order_id;
        stops.add(order).unwrap();

        assert!(stops.contains(id));
        assert_eq!(stops.get(id).unwrap().status, OrderStatus::Open);
    }

    #[test]
    fn buy_stops_trigger_when_ask_reaches_them() {
        let mut stops = StopBook::new();
        stops.add(stop(Side::Buy, dec!(50000))).unwrap();
        stops.add(stop(Side::Buy, dec!(50100))).unwrap();
        stops.add(stop(Side::Buy, dec!(49000))).unwrap();

        let triggered = stops.take_triggered(None, Some(dec!(49500)));
        let triggers: Vec<Decimal> = triggered.iter().map(|o| o.stop_price.unwrap()).collect();
        // Nearest trigger first; the 49000 stop stays latent.
        assert_eq!(triggers, vec![dec!(50000), dec!(50100)]);
        assert_eq!(stops.orders().count(), 1);
    }

    #[test]
    fn sell_stops_trigger_when_bid_reaches_them() {
        let mut stops = StopBook::new();
        stops.add(stop(Side::Sell, dec!(50000))).unwrap();
        stops.add(stop(Side::Sell, dec!(49900))).unwrap();
        stops.add(stop(Side::Sell, dec!(51000))).unwrap();

        let triggered = stops.take_triggered(Some(dec!(50000)), None);
        let triggers: Vec<Decimal> = triggered.iter().map(|o| o.stop_price.unwrap()).collect();
        assert_eq!(triggers, vec![dec!(50000), dec!(49900)]);
    }

    #[test]
    fn fifo_within_one_trigger_price() {
        let mut stops = StopBook::new();
        let first = stop(Side::Buy, dec!(50000));
        let second = stop(Side::Buy, dec!(50000));
        let first_id = first.order_id;
        let second_id = second.order_id;
        stops.add(first).unwrap();
        stops.add(second).unwrap();

        let triggered = stops.take_triggered(None, Some(dec!(50000)));
        assert_eq!(triggered[0].order_id, first_id);
        assert_eq!(triggered[1].order_id, second_id);
    }

    #[test]
    fn cancel_removes_resting_stop() {
        let mut stops = StopBook::new();
        let order = stop(Side::Sell, dec!(48000));
        let id = order.order_id;
        stops.add(order).unwrap();

        let removed = stops.remove(id).unwrap();
        assert_eq!(removed.status, OrderStatus::Cancelled);
        assert!(stops.remove(id).is_none());
        assert!(stops.orders().next().is_none());
    }
}
