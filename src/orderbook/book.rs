//! Core order book: two price-ordered sides plus an id index.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::trace;

use super::error::OrderBookError;
use super::level::PriceLevel;
use super::order::{Order, OrderId, OrderStatus, Side};
use super::snapshot::DepthLevel;

/// Outcome of consuming quantity from the head maker at the top of a side.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MakerFill {
    /// Id of the maker order that was (partially) consumed.
    pub order_id: OrderId,
    /// The maker's resting price — the execution price.
    pub price: Decimal,
}

/// A two-sided limit order book for one symbol.
///
/// Both sides are ordered maps keyed by price. Bids iterate in reverse
/// (highest first), asks forward (lowest first), so the best of either side
/// is an O(log P) end lookup. `order_locations` maps an order id to the
/// `(price, side)` of the level that owns it, giving O(1) average
/// cancellation without searching the sides.
///
/// The book is not internally synchronized: the engine that owns it
/// serializes every mutation behind its lock.
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
    order_locations: HashMap<OrderId, (Decimal, Side)>,
}

impl OrderBook {
    /// Create an empty book for `symbol`.
    #[must_use]
    pub fn new(symbol: &str) -> Self {
        OrderBook {
            symbol: symbol.to_string(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_locations: HashMap::new(),
        }
    }

    /// The symbol this book belongs to.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Highest resting buy price, if any.
    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest resting sell price, if any.
    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Best bid and offer.
    #[must_use]
    pub fn bbo(&self) -> (Option<Decimal>, Option<Decimal>) {
        (self.best_bid(), self.best_ask())
    }

    /// Best price on one side: the highest bid or the lowest ask.
    #[must_use]
    pub fn best_of(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Buy => self.best_bid(),
            Side::Sell => self.best_ask(),
        }
    }

    /// Total resting quantity at the best bid; zero when the side is empty.
    #[must_use]
    pub fn best_bid_quantity(&self) -> Decimal {
        self.bids
            .values()
            .next_back()
            .map(PriceLevel::total_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Total resting quantity at the best ask; zero when the side is empty.
    #[must_use]
    pub fn best_ask_quantity(&self) -> Decimal {
        self.asks
            .values()
            .next()
            .map(PriceLevel::total_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Midpoint of the BBO, when both sides are populated.
    #[must_use]
    pub fn mid_price(&self) -> Option<Decimal> {
        match self.bbo() {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Best ask minus best bid, when both sides are populated.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match self.bbo() {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Top `depth` levels per side, best price outward, as
    /// `(price, total_quantity)` pairs.
    #[must_use]
    pub fn depth(&self, depth: usize) -> (Vec<DepthLevel>, Vec<DepthLevel>) {
        let bids = self
            .bids
            .values()
            .rev()
            .take(depth)
            .map(|level| DepthLevel(level.price(), level.total_quantity()))
            .collect();
        let asks = self
            .asks
            .values()
            .take(depth)
            .map(|level| DepthLevel(level.price(), level.total_quantity()))
            .collect();
        (bids, asks)
    }

    /// Number of resting orders across both sides.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.order_locations.len()
    }

    /// True when neither side holds any orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Look up a resting order by id.
    #[must_use]
    pub fn get_order(&self, order_id: OrderId) -> Option<&Order> {
        let (price, side) = self.order_locations.get(&order_id)?;
        self.side(*side)
            .get(price)
            .and_then(|level| level.iter().find(|o| o.order_id == order_id))
    }

    /// True when an order with this id rests in the book.
    #[must_use]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.order_locations.contains_key(&order_id)
    }

    /// Iterate every resting order, bids first. Order within a level is FIFO.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flat_map(PriceLevel::iter)
    }

    /// Insert a resting order into its side's level, creating the level on
    /// demand.
    ///
    /// Rejects duplicate ids without touching the book. A fresh order is
    /// marked `Open`; one that already carries fills keeps
    /// `PartiallyFilled`.
    pub fn add_order(&mut self, mut order: Order) -> Result<(), OrderBookError> {
        if self.order_locations.contains_key(&order.order_id) {
            return Err(OrderBookError::DuplicateOrder(order.order_id));
        }
        let price = order
            .price
            .ok_or(OrderBookError::MissingPrice(order.order_type))?;

        order.status = if order.filled_quantity > Decimal::ZERO {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Open
        };

        trace!(
            symbol = %self.symbol,
            order_id = %order.order_id,
            side = %order.side,
            %price,
            quantity = %order.remaining_quantity,
            "resting order"
        );

        self.order_locations
            .insert(order.order_id, (price, order.side));
        let side = order.side;
        self.side_mut(side)
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .add(order);
        Ok(())
    }

    /// Remove an order by id, marking it `Cancelled`.
    ///
    /// Drops the order's level when it becomes empty. Returns `None` (and
    /// changes nothing) for unknown ids.
    pub fn remove_order(&mut self, order_id: OrderId) -> Option<Order> {
        let (price, side) = self.order_locations.remove(&order_id)?;
        let level = self.side_mut(side).get_mut(&price)?;
        let mut order = level.remove(order_id)?;
        if level.is_empty() {
            self.side_mut(side).remove(&price);
        }
        order.status = OrderStatus::Cancelled;
        trace!(symbol = %self.symbol, %order_id, "order removed from book");
        Some(order)
    }

    /// True when the order would execute immediately against the opposite
    /// side: a top of book exists there, and the order is marketable at any
    /// price or its limit crosses that top.
    #[must_use]
    pub fn can_match(&self, order: &Order) -> bool {
        let Some(opposite_top) = self.best_of(order.side.opposite()) else {
            return false;
        };
        if order.is_marketable_at_any_price() {
            return true;
        }
        // The `else` above guarantees a price here.
        let limit = order.price.unwrap_or_default();
        match order.side {
            Side::Buy => limit >= opposite_top,
            Side::Sell => limit <= opposite_top,
        }
    }

    /// Quantity immediately fillable for an aggressor of `taker_side`
    /// within `limit`, walking the opposite side best-price outward.
    ///
    /// Stops early once `target` is reached; used by the fill-or-kill
    /// pre-check so no fill is ever applied that would need rolling back.
    #[must_use]
    pub fn fillable_quantity(
        &self,
        taker_side: Side,
        limit: Option<Decimal>,
        target: Decimal,
    ) -> Decimal {
        let mut available = Decimal::ZERO;
        let book_side = taker_side.opposite();
        let levels: Box<dyn Iterator<Item = &PriceLevel>> = match book_side {
            Side::Buy => Box::new(self.bids.values().rev()),
            Side::Sell => Box::new(self.asks.values()),
        };
        for level in levels {
            if let Some(limit) = limit {
                let crosses = match taker_side {
                    Side::Buy => level.price() <= limit,
                    Side::Sell => level.price() >= limit,
                };
                if !crosses {
                    break;
                }
            }
            available += level.total_quantity();
            if available >= target {
                break;
            }
        }
        available
    }

    /// The head maker at the top of `book_side`, if the side is non-empty.
    #[must_use]
    pub(crate) fn peek_top(&self, book_side: Side) -> Option<&Order> {
        let price = self.best_of(book_side)?;
        self.side(book_side).get(&price).and_then(PriceLevel::peek)
    }

    /// Consume `quantity` from the head maker at the top of `book_side`.
    ///
    /// Applies the fill to the maker, keeps the level total in sync, pops the
    /// maker once exhausted, and drops the level the moment it empties — no
    /// empty level survives this call. The caller guarantees `quantity` does
    /// not exceed the head maker's remainder.
    pub(crate) fn fill_top(&mut self, book_side: Side, quantity: Decimal) -> Option<MakerFill> {
        let price = self.best_of(book_side)?;
        let levels = match book_side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels.get_mut(&price)?;

        let maker = level.peek_mut()?;
        let maker_id = maker.order_id;
        maker.apply_fill(quantity);
        let maker_done = maker.status == OrderStatus::Filled;
        level.adjust(quantity);

        if maker_done {
            level.pop_head();
        }
        if level.is_empty() {
            levels.remove(&price);
        }
        if maker_done {
            self.order_locations.remove(&maker_id);
        }

        Some(MakerFill {
            order_id: maker_id,
            price,
        })
    }

    fn side(&self, side: Side) -> &BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}
