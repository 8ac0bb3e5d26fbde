//! The two-state punch state machine.
//!
//! ```text
//!   OUT --CLOCK_IN--> IN
//!   IN  --CLOCK_OUT-> OUT
//! ```
//!
//! Any other (state, punch) pair is rejected.

use crate::models::{AttendanceState, PunchType};

/// Every permitted transition as `(from, punch, to)`.
pub const TRANSITIONS: [(AttendanceState, PunchType, AttendanceState); 2] = [
    (AttendanceState::Out, PunchType::ClockIn, AttendanceState::In),
    (AttendanceState::In, PunchType::ClockOut, AttendanceState::Out),
];

/// Returns the state reached by applying `punch` in `from`, or `None` if the
/// transition is not permitted.
///
/// # Example
///
/// ```
/// use attendance_engine::ledger::transition;
/// use attendance_engine::models::{AttendanceState, PunchType};
///
/// assert_eq!(
///     transition(AttendanceState::Out, PunchType::ClockIn),
///     Some(AttendanceState::In)
/// );
/// assert_eq!(transition(AttendanceState::In, PunchType::ClockIn), None);
/// ```
pub fn transition(from: AttendanceState, punch: PunchType) -> Option<AttendanceState> {
    TRANSITIONS
        .iter()
        .find(|(state, p, _)| *state == from && *p == punch)
        .map(|(_, _, to)| *to)
}

/// Returns the punch type that is valid in `state`.
pub fn expected_punch(state: AttendanceState) -> PunchType {
    match state {
        AttendanceState::Out => PunchType::ClockIn,
        AttendanceState::In => PunchType::ClockOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_clock_in() {
        assert_eq!(
            transition(AttendanceState::Out, PunchType::ClockIn),
            Some(AttendanceState::In)
        );
    }

    #[test]
    fn test_in_clock_out() {
        assert_eq!(
            transition(AttendanceState::In, PunchType::ClockOut),
            Some(AttendanceState::Out)
        );
    }

    #[test]
    fn test_rejected_transitions() {
        assert_eq!(transition(AttendanceState::In, PunchType::ClockIn), None);
        assert_eq!(transition(AttendanceState::Out, PunchType::ClockOut), None);
    }

    #[test]
    fn test_expected_punch_agrees_with_table() {
        for state in [AttendanceState::Out, AttendanceState::In] {
            assert!(transition(state, expected_punch(state)).is_some());
        }
    }
}
