//! Order book state persistence and recovery.
//!
//! State is a single JSON document: a timestamp plus, per symbol, the BBO
//! quote and every resting order with decimals as strings and enums as their
//! lowercase tokens. Recovery reinstates only open and partially filled
//! orders, skipping (and logging) anything individually corrupt.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use super::manager::EngineManager;
use crate::orderbook::{Order, OrderStatus};
use crate::utils::current_time_millis;

/// Failure while saving or loading exchange state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    /// The state file could not be read or written.
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The state document could not be serialized or deserialized.
    #[error("state serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The BBO pair stored alongside each symbol's orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BboQuote {
    /// Best bid at capture time, when the bid side was non-empty.
    pub best_bid: Option<Decimal>,
    /// Best ask at capture time, when the ask side was non-empty.
    pub best_ask: Option<Decimal>,
}

/// Persisted state of one symbol's book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolState {
    /// The symbol.
    pub symbol: String,
    /// BBO at capture time.
    pub bbo: BboQuote,
    /// Every resting order, including latent stops.
    pub orders: Vec<Order>,
}

/// The full persisted exchange state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeState {
    /// Capture time in milliseconds since the epoch.
    pub timestamp: u64,
    /// Per-symbol state, keyed by symbol.
    pub order_books: BTreeMap<String, SymbolState>,
}

/// Saves and restores exchange state through a JSON file.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    state_file: PathBuf,
}

impl PersistenceManager {
    /// Create a manager that reads and writes `state_file`.
    #[must_use]
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        PersistenceManager {
            state_file: state_file.into(),
        }
    }

    /// The file this manager reads and writes.
    #[must_use]
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Capture the current state of every engine the manager owns.
    #[must_use]
    pub fn capture(manager: &EngineManager) -> ExchangeState {
        let mut order_books = BTreeMap::new();
        for symbol in manager.symbols() {
            let Some(engine) = manager.get(&symbol) else {
                continue;
            };
            let snapshot = engine.snapshot(1);
            let orders: Vec<Order> = engine
                .resting_orders()
                .into_iter()
                .filter(|order| {
                    matches!(
                        order.status,
                        OrderStatus::Open | OrderStatus::PartiallyFilled
                    )
                })
                .collect();
            order_books.insert(
                symbol.clone(),
                SymbolState {
                    symbol,
                    bbo: BboQuote {
                        best_bid: snapshot.best_bid,
                        best_ask: snapshot.best_ask,
                    },
                    orders,
                },
            );
        }
        ExchangeState {
            timestamp: current_time_millis(),
            order_books,
        }
    }

    /// Capture and write the full exchange state.
    pub fn save(&self, manager: &EngineManager) -> Result<(), PersistenceError> {
        let state = Self::capture(manager);
        let document = serde_json::to_string_pretty(&state)?;
        fs::write(&self.state_file, document)?;
        info!(state_file = %self.state_file.display(), "exchange state saved");
        Ok(())
    }

    /// Read the state document, or `None` when no file exists yet.
    pub fn load(&self) -> Result<Option<ExchangeState>, PersistenceError> {
        match fs::read_to_string(&self.state_file) {
            Ok(document) => Ok(Some(serde_json::from_str(&document)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    state_file = %self.state_file.display(),
                    "state file not found, starting fresh"
                );
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load the state file and reinstate its orders, returning how many were
    /// restored. Missing file restores nothing.
    pub fn restore(&self, manager: &EngineManager) -> Result<usize, PersistenceError> {
        match self.load()? {
            Some(state) => Ok(Self::restore_state(manager, state)),
            None => Ok(0),
        }
    }

    /// Reinstate a loaded state document into the manager's engines.
    ///
    /// Only open and partially filled orders come back; an order that fails
    /// to reinstate is logged and skipped, never fatal.
    pub fn restore_state(manager: &EngineManager, state: ExchangeState) -> usize {
        let mut restored = 0;
        for (symbol, symbol_state) in state.order_books {
            let engine = manager.engine(&symbol);
            let mut count = 0;
            for order in symbol_state.orders {
                if !matches!(
                    order.status,
                    OrderStatus::Open | OrderStatus::PartiallyFilled
                ) {
                    continue;
                }
                let order_id = order.order_id;
                match engine.restore_order(order) {
                    Ok(()) => count += 1,
                    Err(err) => {
                        error!(%symbol, %order_id, %err, "skipping unrestorable order");
                    }
                }
            }
            info!(%symbol, orders = count, "restored order book");
            restored += count;
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_file_loads_as_fresh_start() {
        let persistence = PersistenceManager::new("/nonexistent/never/state.json");
        assert!(persistence.load().unwrap().is_none());
    }
}
