//! Multi-symbol engine management and the submitter wire boundary.
//!
//! The manager owns one [`MatchingEngine`] per symbol, created on first use
//! and wired to the shared fee schedule and event sink. `submit` and
//! `cancel` are the wire-facing entry points: they parse decimal strings and
//! lowercase enum tokens, rejecting anything unknown before it reaches an
//! engine.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use super::MatchingEngine;
use super::config::EngineConfig;
use super::events::{EventSink, MarketEvent, NullSink};
use crate::decimal;
use crate::orderbook::{BookSnapshot, Order, OrderBookError, OrderId, OrderStatus};

/// An order submission as it arrives from the wire: enum tokens and decimals
/// are still strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Trading symbol, e.g. `BTC-USDT`.
    pub symbol: String,
    /// Order type token: `market`, `limit`, `ioc`, `fok`, `stop_loss`,
    /// `stop_limit`, or `take_profit`.
    pub order_type: String,
    /// Side token: `buy` or `sell`.
    pub side: String,
    /// Quantity as a decimal string.
    pub quantity: String,
    /// Limit price as a decimal string, for limit-like types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Trigger price as a decimal string, for stop variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
}

impl OrderRequest {
    /// Parse the request into a validated [`Order`], rejecting unknown
    /// tokens and malformed decimals.
    pub fn parse(&self) -> Result<Order, OrderBookError> {
        let order_type = self.order_type.parse()?;
        let side = self.side.parse()?;
        let quantity = decimal::parse(&self.quantity)?;
        let price = self.price.as_deref().map(decimal::parse).transpose()?;
        let stop_price = self.stop_price.as_deref().map(decimal::parse).transpose()?;
        Order::new(&self.symbol, order_type, side, quantity, price, stop_price)
    }
}

/// The submitter-facing acknowledgement for one processed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Identifier assigned to the order.
    pub order_id: OrderId,
    /// Final status as of the call's return.
    pub status: OrderStatus,
    /// Quantity filled by the call.
    pub filled_quantity: Decimal,
    /// Quantity still unfilled.
    pub remaining_quantity: Decimal,
    /// Acceptance timestamp in milliseconds since the epoch.
    pub timestamp: u64,
}

impl From<&Order> for OrderAck {
    fn from(order: &Order) -> Self {
        OrderAck {
            order_id: order.order_id,
            status: order.status,
            filled_quantity: order.filled_quantity,
            remaining_quantity: order.remaining_quantity,
            timestamp: order.timestamp,
        }
    }
}

/// Owns every per-symbol engine and routes order flow to them.
///
/// Engines are created lazily and share one fee schedule and one event sink.
/// The registry itself is concurrent: submissions for different symbols
/// proceed in parallel, each serialized only by its own engine's lock.
pub struct EngineManager {
    engines: DashMap<String, Arc<MatchingEngine>>,
    config: EngineConfig,
    sink: Arc<dyn EventSink>,
}

impl EngineManager {
    /// Create a manager with explicit configuration and event sink.
    #[must_use]
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Self {
        EngineManager {
            engines: DashMap::new(),
            config,
            sink,
        }
    }

    /// A manager with default configuration that discards events.
    #[must_use]
    pub fn with_defaults() -> Self {
        EngineManager::new(EngineConfig::default(), Arc::new(NullSink))
    }

    /// The configuration shared by every engine this manager creates.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The engine for `symbol`, created on first use.
    #[must_use]
    pub fn engine(&self, symbol: &str) -> Arc<MatchingEngine> {
        let entry = self.engines.entry(symbol.to_string()).or_insert_with(|| {
            Arc::new(MatchingEngine::with_sink(
                symbol,
                self.config.fee_calculator(),
                Arc::clone(&self.sink),
            ))
        });
        Arc::clone(entry.value())
    }

    /// The engine for `symbol`, if one exists.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<Arc<MatchingEngine>> {
        self.engines
            .get(symbol)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Every symbol with an engine.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.engines.iter().map(|entry| entry.key().clone()).collect()
    }

    /// True when an engine exists for `symbol`.
    #[must_use]
    pub fn has_engine(&self, symbol: &str) -> bool {
        self.engines.contains_key(symbol)
    }

    /// Number of live engines.
    #[must_use]
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Drop the engine for `symbol`, returning it if it existed.
    pub fn remove_engine(&self, symbol: &str) -> Option<Arc<MatchingEngine>> {
        let removed = self.engines.remove(symbol).map(|(_, engine)| engine);
        if removed.is_some() {
            info!(%symbol, "removed matching engine");
        }
        removed
    }

    /// Parse and process one wire submission.
    ///
    /// Returns the acknowledgement contract: id, final status, and fill
    /// quantities as of this call. Trades flow to the event sink.
    pub fn submit(&self, request: &OrderRequest) -> Result<OrderAck, OrderBookError> {
        let mut order = request.parse()?;
        let engine = self.engine(&request.symbol);
        engine.process(&mut order)?;
        Ok(OrderAck::from(&order))
    }

    /// Cancel an order by symbol and wire order id.
    ///
    /// `None` when the symbol has no engine or the id is not resting.
    pub fn cancel(&self, symbol: &str, order_id: &str) -> Result<Option<Order>, OrderBookError> {
        let order_id: OrderId = order_id.parse()?;
        Ok(self.get(symbol).and_then(|engine| engine.cancel(order_id)))
    }

    /// A consistent snapshot for `symbol`, capped at the configured depth.
    #[must_use]
    pub fn snapshot(&self, symbol: &str, depth: usize) -> Option<BookSnapshot> {
        let depth = depth.min(self.config.snapshot_depth);
        self.get(symbol).map(|engine| engine.snapshot(depth))
    }

    /// Spawn a consumer that drains a [`ChannelSink`](super::ChannelSink)
    /// receiver and logs every delivery, so emission never blocks matching.
    pub fn spawn_event_logger(
        mut receiver: UnboundedReceiver<MarketEvent>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("market event processor started");
            while let Some(event) = receiver.recv().await {
                match event {
                    MarketEvent::Trade(trade) => info!(
                        symbol = %trade.symbol,
                        trade_id = %trade.trade_id,
                        price = %trade.price,
                        quantity = %trade.quantity,
                        aggressor = %trade.aggressor_side,
                        "trade"
                    ),
                    MarketEvent::BboUpdate(update) => info!(
                        symbol = %update.symbol,
                        best_bid = ?update.best_bid,
                        best_ask = ?update.best_ask,
                        "bbo update"
                    ),
                }
            }
            info!("market event processor stopped");
        })
    }
}

impl Default for EngineManager {
    fn default() -> Self {
        EngineManager::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_request(symbol: &str, side: &str, price: &str, quantity: &str) -> OrderRequest {
        OrderRequest {
            symbol: symbol.to_string(),
            order_type: "limit".to_string(),
            side: side.to_string(),
            quantity: quantity.to_string(),
            price: Some(price.to_string()),
            stop_price: None,
        }
    }

    #[test]
    fn engines_are_created_lazily_and_reused() {
        let manager = EngineManager::with_defaults();
        assert_eq!(manager.engine_count(), 0);

        let first = manager.engine("BTC-USDT");
        let second = manager.engine("BTC-USDT");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.engine_count(), 1);
        assert!(manager.has_engine("BTC-USDT"));
        assert!(!manager.has_engine("ETH-USDT"));
    }

    #[test]
    fn submit_parses_and_routes_to_the_symbol_engine() {
        let manager = EngineManager::with_defaults();
        let ack = manager
            .submit(&limit_request("BTC-USDT", "buy", "50000", "1.5"))
            .unwrap();
        assert_eq!(ack.status, OrderStatus::Open);
        assert_eq!(ack.remaining_quantity.to_string(), "1.5");

        let snapshot = manager.snapshot("BTC-USDT", 10).unwrap();
        assert_eq!(snapshot.best_bid.map(|p| p.to_string()), Some("50000".to_string()));
    }

    #[test]
    fn submit_clamps_wire_decimals_to_context_precision() {
        let manager = EngineManager::with_defaults();
        let ack = manager
            .submit(&limit_request("BTC-USDT", "buy", "50000.123456789012", "1"))
            .unwrap();
        assert_eq!(ack.status, OrderStatus::Open);

        // The resting price carries at most 10 significant digits.
        let snapshot = manager.snapshot("BTC-USDT", 10).unwrap();
        assert_eq!(
            snapshot.best_bid.map(|p| p.to_string()),
            Some("50000.12346".to_string())
        );
    }

    #[test]
    fn submit_rejects_unknown_tokens() {
        let manager = EngineManager::with_defaults();
        let mut request = limit_request("BTC-USDT", "buy", "50000", "1");
        request.order_type = "trailing_stop".to_string();
        assert!(matches!(
            manager.submit(&request),
            Err(OrderBookError::UnknownOrderType(_))
        ));

        let mut request = limit_request("BTC-USDT", "buy", "50000", "1");
        request.side = "hold".to_string();
        assert!(matches!(
            manager.submit(&request),
            Err(OrderBookError::UnknownSide(_))
        ));

        let request = limit_request("BTC-USDT", "buy", "50000", "a lot");
        assert!(matches!(
            manager.submit(&request),
            Err(OrderBookError::InvalidDecimal(_))
        ));
        // Nothing rested from the rejected submissions.
        assert_eq!(manager.engine("BTC-USDT").snapshot(10).bids.len(), 0);
    }

    #[test]
    fn cancel_round_trips_through_the_wire_id() {
        let manager = EngineManager::with_defaults();
        let ack = manager
            .submit(&limit_request("BTC-USDT", "sell", "50000", "1"))
            .unwrap();

        let cancelled = manager
            .cancel("BTC-USDT", &ack.order_id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.order_id, ack.order_id);
        assert!(manager.cancel("BTC-USDT", &ack.order_id.to_string()).unwrap().is_none());
        assert!(manager.cancel("ETH-USDT", &ack.order_id.to_string()).unwrap().is_none());
    }
}
