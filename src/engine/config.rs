//! Engine configuration knobs.

use std::path::PathBuf;

use rust_decimal::Decimal;

use super::fees::FeeCalculator;

/// Tunable parameters shared by every engine a manager creates.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Fee rate charged to makers. Default 0.1%.
    pub maker_fee_rate: Decimal,
    /// Fee rate charged to takers. Default 0.2%.
    pub taker_fee_rate: Decimal,
    /// Upper bound on the number of levels per side a snapshot exposes.
    pub snapshot_depth: usize,
    /// Where the persistence manager reads and writes exchange state.
    pub state_file: PathBuf,
}

impl EngineConfig {
    /// Default cap on snapshot depth.
    pub const DEFAULT_SNAPSHOT_DEPTH: usize = 1000;
    /// Default state file name.
    pub const DEFAULT_STATE_FILE: &'static str = "order_book_state.json";

    /// Build the fee calculator these settings describe.
    #[must_use]
    pub fn fee_calculator(&self) -> FeeCalculator {
        FeeCalculator::new(self.maker_fee_rate, self.taker_fee_rate)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            maker_fee_rate: FeeCalculator::DEFAULT_MAKER_RATE,
            taker_fee_rate: FeeCalculator::DEFAULT_TAKER_RATE,
            snapshot_depth: Self::DEFAULT_SNAPSHOT_DEPTH,
            state_file: PathBuf::from(Self::DEFAULT_STATE_FILE),
        }
    }
}
