//! Pairing punches into worked intervals.
//!
//! Everything here works in site-local wall-clock time, since schedules are
//! expressed that way.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::ledger::{expected_punch, transition};
use crate::models::{AttendanceState, Punch, PunchType};

/// Converts a UTC instant to site-local wall-clock time.
pub fn local_time(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    at.with_timezone(&offset).naive_local()
}

/// A clock-in and the clock-out that ended it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkInterval {
    /// Local clock-in time.
    pub start: NaiveDateTime,
    /// Local clock-out time, or `None` while still clocked in.
    pub end: Option<NaiveDateTime>,
    /// The clock-in punch.
    pub clock_in_id: Uuid,
    /// The clock-out punch, if any.
    pub clock_out_id: Option<Uuid>,
}

impl WorkInterval {
    /// The end used for overlap arithmetic: the clock-out, or `now` while
    /// still clocked in. Never earlier than the start.
    pub fn effective_end(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.end.unwrap_or(now).max(self.start)
    }

    /// Minutes worked inside `[from, to)`.
    pub fn minutes_within(&self, from: NaiveDateTime, to: NaiveDateTime, now: NaiveDateTime) -> i64 {
        let start = self.start.max(from);
        let end = self.effective_end(now).min(to);
        if end > start {
            (end - start).num_minutes()
        } else {
            0
        }
    }
}

/// Pairs a chronological punch sequence into intervals.
///
/// A clock-in is closed by the next clock-out. When two clock-ins are
/// adjacent the newer one starts the interval and the older is dropped; a
/// clock-out with no pending clock-in is dropped. A trailing clock-in yields
/// an interval with no end.
///
/// # Example
///
/// ```
/// use attendance_engine::reconciliation::pair_punches;
/// # use attendance_engine::models::{Punch, PunchType, VerificationMethod};
/// # use chrono::{FixedOffset, TimeZone, Utc};
/// # use uuid::Uuid;
/// # fn punch(punch_type: PunchType, hour: u32) -> Punch {
/// #     let at = Utc.with_ymd_and_hms(2026, 1, 15, hour, 0, 0).unwrap();
/// #     Punch {
/// #         id: Uuid::new_v4(), enrollment_id: Uuid::nil(), punch_type, punch_time: at,
/// #         verification_method: VerificationMethod::PinFallback, face_confidence: None,
/// #         latitude: None, longitude: None, accuracy: None, is_manual: false,
/// #         manual_note: None, edited_by_id: None, edited_at: None,
/// #         original_punch_time: None, user_agent: None, ip_address: None, created_at: at,
/// #     }
/// # }
///
/// let punches = vec![
///     punch(PunchType::ClockIn, 9),
///     punch(PunchType::ClockOut, 12),
///     punch(PunchType::ClockIn, 13),
/// ];
/// let intervals = pair_punches(&punches, FixedOffset::east_opt(0).unwrap());
/// assert_eq!(intervals.len(), 2);
/// assert!(intervals[0].end.is_some());
/// assert!(intervals[1].end.is_none());
/// ```
pub fn pair_punches(punches: &[Punch], offset: FixedOffset) -> Vec<WorkInterval> {
    let mut intervals = Vec::new();
    let mut pending: Option<&Punch> = None;

    for punch in punches {
        match punch.punch_type {
            PunchType::ClockIn => pending = Some(punch),
            PunchType::ClockOut => {
                if let Some(clock_in) = pending.take() {
                    intervals.push(WorkInterval {
                        start: local_time(clock_in.punch_time, offset),
                        end: Some(local_time(punch.punch_time, offset)),
                        clock_in_id: clock_in.id,
                        clock_out_id: Some(punch.id),
                    });
                }
            }
        }
    }

    if let Some(clock_in) = pending {
        intervals.push(WorkInterval {
            start: local_time(clock_in.punch_time, offset),
            end: None,
            clock_in_id: clock_in.id,
            clock_out_id: None,
        });
    }

    intervals
}

/// A break in clock-in/clock-out alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternationGap {
    /// The punch type that should have come before `punch_id`.
    pub missing: PunchType,
    /// The punch that revealed the gap.
    pub punch_id: Uuid,
    /// Its local time.
    pub punch_time: NaiveDateTime,
    /// The preceding punch, if any.
    pub previous: Option<(PunchType, NaiveDateTime)>,
}

impl AlternationGap {
    /// Human-readable description for reports.
    pub fn describe(&self) -> String {
        let at = self.punch_time.format("%Y-%m-%d %H:%M");
        match self.previous {
            Some((previous, previous_at)) => format!(
                "{} at {} follows {} at {} with no {} in between",
                self.missing.counterpart(),
                at,
                previous,
                previous_at.format("%Y-%m-%d %H:%M"),
                self.missing
            ),
            None => format!(
                "{} at {} has no preceding {}",
                self.missing.counterpart(),
                at,
                self.missing
            ),
        }
    }
}

/// Finds every alternation gap in a chronological punch sequence.
pub fn alternation_gaps(punches: &[Punch], offset: FixedOffset) -> Vec<AlternationGap> {
    let mut gaps = Vec::new();
    let mut previous: Option<&Punch> = None;

    for punch in punches {
        let state = AttendanceState::after(previous.map(|p| p.punch_type));
        if transition(state, punch.punch_type).is_none() {
            gaps.push(AlternationGap {
                missing: expected_punch(state),
                punch_id: punch.id,
                punch_time: local_time(punch.punch_time, offset),
                previous: previous
                    .map(|p| (p.punch_type, local_time(p.punch_time, offset))),
            });
        }
        previous = Some(punch);
    }

    gaps
}
