//! Reconciliation of punches against the schedule.
//!
//! Produces the six attendance exception kinds for a day, plus per-agent
//! hour summaries. Nothing here writes to the stores.

mod cache;
mod engine;
mod intervals;
mod matching;

pub use cache::ExceptionCache;
pub use engine::{ExceptionFilter, ReconciliationEngine, ReconciliationSettings};
pub use intervals::{AlternationGap, WorkInterval, alternation_gaps, local_time, pair_punches};
