//! Punch ledger and attendance state machine.

mod clock;
mod punches;
mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use punches::{ManualPunch, PunchEdit, PunchLedger, RecordPunch};
pub use state::{TRANSITIONS, expected_punch, transition};
