//! Property tests: universal invariants under random order flow.

use std::collections::HashMap;

use matchbook_rs::prelude::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

const SYMBOL: &str = "BTC-USDT";

#[derive(Debug, Clone)]
enum Op {
    Submit {
        sell: bool,
        kind: u8,
        price: u32,
        qty: u32,
    },
    Cancel(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), 0u8..4, 95u32..=105, 1u32..=4).prop_map(
            |(sell, kind, price, qty)| Op::Submit {
                sell,
                kind,
                price,
                qty,
            }
        ),
        1 => (0usize..32).prop_map(Op::Cancel),
    ]
}

fn build_order(sell: bool, kind: u8, price: u32, qty: u32) -> Order {
    let side = if sell { Side::Sell } else { Side::Buy };
    let price = Decimal::from(price);
    let qty = Decimal::from(qty);
    let (order_type, price) = match kind {
        0 => (OrderType::Limit, Some(price)),
        1 => (OrderType::Ioc, Some(price)),
        2 => (OrderType::Fok, Some(price)),
        _ => (OrderType::Market, None),
    };
    Order::new(SYMBOL, order_type, side, qty, price, None).unwrap()
}

/// Recompute per-level totals from the resting orders themselves and compare
/// against the snapshot's cached totals.
fn assert_book_consistent(engine: &MatchingEngine) {
    let snapshot = engine.snapshot(1000);

    // Non-crossing between operations.
    if let (Some(bid), Some(ask)) = (snapshot.best_bid, snapshot.best_ask) {
        assert!(bid < ask, "book crossed: best bid {bid} >= best ask {ask}");
    }

    // Strict price monotonicity, best price outward.
    for pair in snapshot.bids.windows(2) {
        assert!(pair[0].price() > pair[1].price(), "bids not descending");
    }
    for pair in snapshot.asks.windows(2) {
        assert!(pair[0].price() < pair[1].price(), "asks not ascending");
    }

    // Level totals equal the independently recomputed sums, and no level is
    // empty or non-positive.
    let mut recomputed: HashMap<(Side, Decimal), Decimal> = HashMap::new();
    for order in engine.resting_orders() {
        let price = order.price.expect("resting order without price");
        *recomputed.entry((order.side, price)).or_default() += order.remaining_quantity;
    }
    let levels: Vec<(Side, &DepthLevel)> = snapshot
        .bids
        .iter()
        .map(|level| (Side::Buy, level))
        .chain(snapshot.asks.iter().map(|level| (Side::Sell, level)))
        .collect();
    assert_eq!(levels.len(), recomputed.len(), "level count drifted");
    for (side, level) in levels {
        assert!(level.quantity() > Decimal::ZERO, "empty level retained");
        assert_eq!(
            recomputed.get(&(side, level.price())).copied(),
            Some(level.quantity()),
            "cached level total drifted at {} {}",
            side,
            level.price()
        );
    }
}

proptest! {
    /// Invariants that must hold after every single operation.
    #[test]
    fn book_invariants_hold_under_random_flow(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let engine = MatchingEngine::new(SYMBOL);
        let mut resting_ids: Vec<OrderId> = Vec::new();
        let mut fills_by_order: HashMap<OrderId, Decimal> = HashMap::new();

        for op in ops {
            match op {
                Op::Submit { sell, kind, price, qty } => {
                    let mut order = build_order(sell, kind, price, qty);
                    let submitted_qty = order.quantity;
                    let id = order.order_id;
                    match engine.process(&mut order) {
                        Ok(trades) => {
                            // Conservation on the taker side: the fills the
                            // call reports equal the trades it returned.
                            let taker_sum: Decimal = trades
                                .iter()
                                .filter(|t| t.taker_order_id == id)
                                .map(|t| t.quantity)
                                .sum();
                            prop_assert_eq!(taker_sum, order.filled_quantity);
                            prop_assert_eq!(
                                order.filled_quantity + order.remaining_quantity,
                                submitted_qty
                            );
                            prop_assert!(order.remaining_quantity >= Decimal::ZERO);

                            // No trade-through: a taker's executions move
                            // strictly outward from the best price.
                            let prices: Vec<Decimal> =
                                trades.iter().map(|t| t.price).collect();
                            for pair in prices.windows(2) {
                                if sell {
                                    prop_assert!(pair[0] >= pair[1]);
                                } else {
                                    prop_assert!(pair[0] <= pair[1]);
                                }
                            }
                            if let Some(limit) = order.price {
                                for trade in &trades {
                                    if sell {
                                        prop_assert!(trade.price >= limit);
                                    } else {
                                        prop_assert!(trade.price <= limit);
                                    }
                                }
                            }

                            for trade in &trades {
                                *fills_by_order.entry(trade.maker_order_id).or_default() +=
                                    trade.quantity;
                                *fills_by_order.entry(trade.taker_order_id).or_default() +=
                                    trade.quantity;
                            }

                            // IOC, FOK, and market orders never rest; a
                            // market remainder stays partially filled but is
                            // absent from the book.
                            if matches!(
                                order.order_type,
                                OrderType::Ioc | OrderType::Fok | OrderType::Market
                            ) {
                                prop_assert!(engine.order(id).is_none());
                            }
                            if order.order_type == OrderType::Limit
                                && matches!(
                                    order.status,
                                    OrderStatus::Open | OrderStatus::PartiallyFilled
                                )
                            {
                                resting_ids.push(id);
                            }
                        }
                        Err(OrderBookError::InsufficientLiquidity { .. }) => {
                            prop_assert_eq!(order.status, OrderStatus::Rejected);
                            prop_assert!(engine.order(id).is_none());
                        }
                        Err(err) => {
                            prop_assert!(false, "unexpected engine error: {}", err);
                        }
                    }
                }
                Op::Cancel(choice) => {
                    if resting_ids.is_empty() {
                        continue;
                    }
                    let id = resting_ids.remove(choice % resting_ids.len());
                    if let Some(cancelled) = engine.cancel(id) {
                        prop_assert_eq!(cancelled.status, OrderStatus::Cancelled);
                    }
                    // Cancel is idempotent: a second attempt finds nothing.
                    prop_assert!(engine.cancel(id).is_none());
                    prop_assert!(engine.order(id).is_none());
                }
            }

            assert_book_consistent(&engine);
        }

        // Conservation on the maker side: every order still resting carries
        // exactly its submitted quantity minus its accumulated fills.
        for order in engine.resting_orders() {
            let filled = fills_by_order
                .get(&order.order_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            prop_assert_eq!(order.remaining_quantity, order.quantity - filled);
            prop_assert_eq!(order.filled_quantity, filled);
        }
    }

    /// A failed fill-or-kill produces no trades and leaves the book
    /// byte-identical.
    #[test]
    fn fok_shortfall_is_atomic(
        makers in prop::collection::vec((95u32..=105, 1u32..=3), 0..6),
        fok_price in 95u32..=105,
        fok_qty in 1u32..=20,
    ) {
        let engine = MatchingEngine::new(SYMBOL);
        for (price, qty) in makers {
            let _ = engine.process(&mut build_order(true, 0, price, qty));
        }
        let before = engine.snapshot(1000);

        let mut fok = build_order(false, 2, fok_price, fok_qty);
        let trades = engine.process(&mut fok).unwrap();

        if fok.status == OrderStatus::Cancelled {
            prop_assert!(trades.is_empty());
            prop_assert_eq!(fok.filled_quantity, Decimal::ZERO);
            let after = engine.snapshot(1000);
            prop_assert_eq!(before.bids, after.bids);
            prop_assert_eq!(before.asks, after.asks);
        } else {
            // Satisfied in full, never partially.
            prop_assert_eq!(fok.status, OrderStatus::Filled);
            prop_assert_eq!(fok.remaining_quantity, Decimal::ZERO);
        }
    }

    /// Makers at one price are consumed in strict arrival order.
    #[test]
    fn fifo_holds_at_a_single_price(
        maker_qtys in prop::collection::vec(1u32..=3, 1..6),
        taker_qty in 1u32..=18,
    ) {
        let engine = MatchingEngine::new(SYMBOL);
        let mut maker_ids = Vec::new();
        for qty in &maker_qtys {
            let mut maker = build_order(true, 0, 100, *qty);
            maker_ids.push(maker.order_id);
            engine.process(&mut maker).unwrap();
        }

        let mut taker = build_order(false, 1, 100, taker_qty);
        let trades = engine.process(&mut taker).unwrap();

        // Trades consume makers in the order they arrived, each exhausted
        // before the next is touched.
        let consumed: Vec<OrderId> = trades.iter().map(|t| t.maker_order_id).collect();
        let expected: Vec<OrderId> = maker_ids.iter().copied().take(consumed.len()).collect();
        prop_assert_eq!(consumed, expected);
    }
}
