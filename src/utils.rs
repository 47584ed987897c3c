//! Small shared utilities.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Used for order acceptance timestamps, trade timestamps, and snapshot
/// stamps. Ordering within one engine never depends on this value alone:
/// FIFO position under the engine lock breaks ties.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
