//! Market-data events and the sink they are published through.
//!
//! The engine publishes two event families after every state-changing
//! operation: one `Trade` per fill, then a single `BboUpdate` for the
//! operation. Sinks must never block the matching path — the provided
//! [`ChannelSink`] hands events to an unbounded in-memory channel whose
//! consumer runs elsewhere.

use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::trade::Trade;
use crate::orderbook::DepthLevel;

/// Number of levels per side carried by a BBO update.
pub const BBO_DEPTH: usize = 10;

/// Top-of-book update published after a state-changing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BboUpdate {
    /// Publication time in milliseconds since the epoch.
    pub timestamp: u64,
    /// The symbol whose book changed.
    pub symbol: String,
    /// Best bid price, when the bid side is non-empty.
    pub best_bid: Option<Decimal>,
    /// Best ask price, when the ask side is non-empty.
    pub best_ask: Option<Decimal>,
    /// Total quantity at the best bid; zero when empty.
    pub best_bid_quantity: Decimal,
    /// Total quantity at the best ask; zero when empty.
    pub best_ask_quantity: Decimal,
    /// Top bid levels, highest price first.
    pub bids: Vec<DepthLevel>,
    /// Top ask levels, lowest price first.
    pub asks: Vec<DepthLevel>,
}

/// An event published by an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A single execution.
    Trade(Trade),
    /// A top-of-book refresh.
    BboUpdate(BboUpdate),
}

/// Failure to hand an event to a sink.
///
/// Sink failures are logged by the engine and never propagate into the
/// matching loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EventSinkError {
    /// The consumer side of the sink is gone.
    #[error("event channel closed")]
    ChannelClosed,
}

/// Destination for engine events.
///
/// Implementations must be thread-safe: engines for different symbols may
/// publish concurrently. `publish` must not block.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn publish(&self, event: MarketEvent) -> Result<(), EventSinkError>;
}

/// A sink that discards every event. Useful for benchmarks and tools that
/// only need the synchronous results of `process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: MarketEvent) -> Result<(), EventSinkError> {
        Ok(())
    }
}

/// A sink backed by an unbounded in-memory channel.
///
/// Publishing never blocks; the paired receiver is drained by a consumer
/// task (see `EngineManager::spawn_event_logger` for the built-in one).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<MarketEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    #[must_use]
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<MarketEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelSink { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: MarketEvent) -> Result<(), EventSinkError> {
        self.sender
            .send(event)
            .map_err(|_| EventSinkError::ChannelClosed)
    }
}

/// A sink that records every event in memory, in publication order.
///
/// Intended for tests and small tools that inspect the event stream after
/// the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MarketEvent>>,
}

impl MemorySink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// All recorded events, in publication order.
    #[must_use]
    pub fn events(&self) -> Vec<MarketEvent> {
        self.events.lock().expect("event buffer lock poisoned").clone()
    }

    /// Recorded trade events only, in publication order.
    #[must_use]
    pub fn trades(&self) -> Vec<Trade> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MarketEvent::Trade(trade) => Some(trade),
                MarketEvent::BboUpdate(_) => None,
            })
            .collect()
    }

    /// Recorded BBO updates only, in publication order.
    #[must_use]
    pub fn bbo_updates(&self) -> Vec<BboUpdate> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MarketEvent::BboUpdate(update) => Some(update),
                MarketEvent::Trade(_) => None,
            })
            .collect()
    }

    /// Drop every recorded event.
    pub fn clear(&self) {
        self.events.lock().expect("event buffer lock poisoned").clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: MarketEvent) -> Result<(), EventSinkError> {
        self.events
            .lock()
            .expect("event buffer lock poisoned")
            .push(event);
        Ok(())
    }
}
