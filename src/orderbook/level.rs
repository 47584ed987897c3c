//! A single price level: a FIFO queue of resting orders.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use super::order::{Order, OrderId};

/// All resting orders at one price, in strict arrival order, with a cached
/// total of their remaining quantities.
///
/// The cache is updated on every mutation; `total_quantity` always equals the
/// sum of `remaining_quantity` over the queued orders. A negative total means
/// the book is corrupt and aborts the process rather than trade on bad state.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Decimal,
    orders: VecDeque<Order>,
    total_quantity: Decimal,
}

impl PriceLevel {
    /// Create an empty level at `price`.
    #[must_use]
    pub fn new(price: Decimal) -> Self {
        PriceLevel {
            price,
            orders: VecDeque::new(),
            total_quantity: Decimal::ZERO,
        }
    }

    /// The price shared by every order in this level.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Cached sum of remaining quantities.
    #[must_use]
    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
    }

    /// Number of resting orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// True when no orders rest here. Empty levels must be dropped from the
    /// book immediately.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Append an order at the back of the queue.
    pub fn add(&mut self, order: Order) {
        self.total_quantity += order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// The head of the queue — the next maker at this price.
    #[must_use]
    pub fn peek(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub(crate) fn peek_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    /// Remove and return the head of the queue, shrinking the cached total by
    /// its remaining quantity.
    pub fn pop_head(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.debit(order.remaining_quantity);
        Some(order)
    }

    /// Remove a specific order by id. Returns `None` (and changes nothing)
    /// when the id is not queued here.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| o.order_id == order_id)?;
        let order = self.orders.remove(position)?;
        self.debit(order.remaining_quantity);
        Some(order)
    }

    /// Shrink the cached total after the head order was partially consumed.
    pub(crate) fn adjust(&mut self, consumed: Decimal) {
        self.debit(consumed);
    }

    /// Iterate the queue in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    fn debit(&mut self, amount: Decimal) {
        self.total_quantity -= amount;
        assert!(
            self.total_quantity >= Decimal::ZERO,
            "price level {} total quantity went negative ({})",
            self.price,
            self.total_quantity
        );
    }
}
