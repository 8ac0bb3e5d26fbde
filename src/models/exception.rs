//! Attendance exception models.
//!
//! Exceptions are derived values produced by reconciliation. They are never
//! stored and have no identity beyond a single report.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AgentRef, PunchType};

/// The six exception categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// Clocked in before the scheduled start.
    ArrivedEarly,
    /// Clocked in after the scheduled start.
    ArrivedLate,
    /// Clocked out before the scheduled end.
    LeftEarly,
    /// Clocked out (or still working) after the scheduled end.
    LeftLate,
    /// No worked interval overlapped a scheduled entry.
    NoShow,
    /// The punch sequence is missing a clock-in or clock-out.
    MissedPunch,
}

/// An arrival deviation for one scheduled entry.
///
/// `minutes_diff` is `actual - scheduled`: positive when late, negative when
/// early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalException {
    /// The agent concerned.
    pub agent: AgentRef,
    /// The schedule entry that was compared.
    pub schedule_entry_id: Uuid,
    /// The activity scheduled for the entry.
    pub activity_type_id: Uuid,
    /// Scheduled start, site-local.
    pub scheduled: NaiveDateTime,
    /// Actual start of the matched interval, site-local.
    pub actual: NaiveDateTime,
    /// Signed difference in whole minutes.
    pub minutes_diff: i64,
}

/// A departure deviation for one scheduled entry.
///
/// `minutes_diff` is `actual - scheduled`: positive when the agent stayed
/// longer, negative when they left early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureException {
    /// The agent concerned.
    pub agent: AgentRef,
    /// The schedule entry that was compared.
    pub schedule_entry_id: Uuid,
    /// The activity scheduled for the entry.
    pub activity_type_id: Uuid,
    /// Scheduled end, site-local.
    pub scheduled: NaiveDateTime,
    /// Actual end of the matched interval (or the reconciliation time if the
    /// agent has not clocked out), site-local.
    pub actual: NaiveDateTime,
    /// Signed difference in whole minutes.
    pub minutes_diff: i64,
    /// True if no clock-out has been recorded yet.
    pub still_clocked_in: bool,
}

/// A scheduled entry with no overlapping worked time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoShowException {
    /// The agent concerned.
    pub agent: AgentRef,
    /// The schedule entry that was missed.
    pub schedule_entry_id: Uuid,
    /// The activity scheduled for the entry.
    pub activity_type_id: Uuid,
    /// Scheduled start, site-local.
    pub scheduled_start: NaiveDateTime,
    /// Scheduled end, site-local.
    pub scheduled_end: NaiveDateTime,
}

/// A gap in the clock-in/clock-out alternation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedPunchException {
    /// The agent concerned.
    pub agent: AgentRef,
    /// The enrollment whose ledger has the gap.
    pub enrollment_id: Uuid,
    /// The punch type that should have been recorded.
    pub missing: PunchType,
    /// The punch that revealed the gap.
    pub punch_id: Uuid,
    /// Time of that punch, site-local.
    pub punch_time: NaiveDateTime,
    /// Human-readable explanation for supervisors.
    pub message: String,
}

/// Any one exception, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttendanceException {
    /// See [`ExceptionKind::ArrivedEarly`].
    ArrivedEarly(ArrivalException),
    /// See [`ExceptionKind::ArrivedLate`].
    ArrivedLate(ArrivalException),
    /// See [`ExceptionKind::LeftEarly`].
    LeftEarly(DepartureException),
    /// See [`ExceptionKind::LeftLate`].
    LeftLate(DepartureException),
    /// See [`ExceptionKind::NoShow`].
    NoShow(NoShowException),
    /// See [`ExceptionKind::MissedPunch`].
    MissedPunch(MissedPunchException),
}

impl AttendanceException {
    /// Returns the kind of this exception.
    pub fn kind(&self) -> ExceptionKind {
        match self {
            AttendanceException::ArrivedEarly(_) => ExceptionKind::ArrivedEarly,
            AttendanceException::ArrivedLate(_) => ExceptionKind::ArrivedLate,
            AttendanceException::LeftEarly(_) => ExceptionKind::LeftEarly,
            AttendanceException::LeftLate(_) => ExceptionKind::LeftLate,
            AttendanceException::NoShow(_) => ExceptionKind::NoShow,
            AttendanceException::MissedPunch(_) => ExceptionKind::MissedPunch,
        }
    }

    /// Returns the agent this exception concerns.
    pub fn agent(&self) -> &AgentRef {
        match self {
            AttendanceException::ArrivedEarly(e) | AttendanceException::ArrivedLate(e) => &e.agent,
            AttendanceException::LeftEarly(e) | AttendanceException::LeftLate(e) => &e.agent,
            AttendanceException::NoShow(e) => &e.agent,
            AttendanceException::MissedPunch(e) => &e.agent,
        }
    }
}

/// The full exception report for one date, split by kind.
///
/// Each list is ordered by agent name, ties broken by time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionSet {
    /// The reconciled date.
    pub date: NaiveDate,
    /// Early arrivals.
    pub arrived_early: Vec<ArrivalException>,
    /// Late arrivals.
    pub arrived_late: Vec<ArrivalException>,
    /// Early departures.
    pub left_early: Vec<DepartureException>,
    /// Late departures.
    pub left_late: Vec<DepartureException>,
    /// No-shows.
    pub no_show: Vec<NoShowException>,
    /// Alternation gaps.
    pub missed_punch: Vec<MissedPunchException>,
}

impl ExceptionSet {
    /// Creates an empty report for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            arrived_early: Vec::new(),
            arrived_late: Vec::new(),
            left_early: Vec::new(),
            left_late: Vec::new(),
            no_show: Vec::new(),
            missed_punch: Vec::new(),
        }
    }

    /// Files an exception into the list for its kind.
    pub fn push(&mut self, exception: AttendanceException) {
        match exception {
            AttendanceException::ArrivedEarly(e) => self.arrived_early.push(e),
            AttendanceException::ArrivedLate(e) => self.arrived_late.push(e),
            AttendanceException::LeftEarly(e) => self.left_early.push(e),
            AttendanceException::LeftLate(e) => self.left_late.push(e),
            AttendanceException::NoShow(e) => self.no_show.push(e),
            AttendanceException::MissedPunch(e) => self.missed_punch.push(e),
        }
    }

    /// Orders every list by agent name, then agent id, then time.
    pub fn sort(&mut self) {
        fn key(agent: &AgentRef, at: NaiveDateTime) -> (String, Uuid, NaiveDateTime) {
            (agent.name.clone(), agent.agent_id, at)
        }
        self.arrived_early
            .sort_by_cached_key(|e| key(&e.agent, e.scheduled));
        self.arrived_late
            .sort_by_cached_key(|e| key(&e.agent, e.scheduled));
        self.left_early
            .sort_by_cached_key(|e| key(&e.agent, e.scheduled));
        self.left_late
            .sort_by_cached_key(|e| key(&e.agent, e.scheduled));
        self.no_show
            .sort_by_cached_key(|e| key(&e.agent, e.scheduled_start));
        self.missed_punch
            .sort_by_cached_key(|e| key(&e.agent, e.punch_time));
    }

    /// Returns the number of exceptions of `kind`.
    pub fn count(&self, kind: ExceptionKind) -> usize {
        match kind {
            ExceptionKind::ArrivedEarly => self.arrived_early.len(),
            ExceptionKind::ArrivedLate => self.arrived_late.len(),
            ExceptionKind::LeftEarly => self.left_early.len(),
            ExceptionKind::LeftLate => self.left_late.len(),
            ExceptionKind::NoShow => self.no_show.len(),
            ExceptionKind::MissedPunch => self.missed_punch.len(),
        }
    }

    /// Returns the number of exceptions raised for one agent.
    pub fn count_for_agent(&self, agent_id: Uuid) -> usize {
        let arrivals = self
            .arrived_early
            .iter()
            .chain(&self.arrived_late)
            .filter(|e| e.agent.agent_id == agent_id)
            .count();
        let departures = self
            .left_early
            .iter()
            .chain(&self.left_late)
            .filter(|e| e.agent.agent_id == agent_id)
            .count();
        let no_shows = self
            .no_show
            .iter()
            .filter(|e| e.agent.agent_id == agent_id)
            .count();
        let missed = self
            .missed_punch
            .iter()
            .filter(|e| e.agent.agent_id == agent_id)
            .count();
        arrivals + departures + no_shows + missed
    }

    /// Returns the total number of exceptions.
    pub fn len(&self) -> usize {
        self.arrived_early.len()
            + self.arrived_late.len()
            + self.left_early.len()
            + self.left_late.len()
            + self.no_show.len()
            + self.missed_punch.len()
    }

    /// Returns true if no exception was found.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scheduled versus worked time for one agent on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDaySummary {
    /// The agent summarised.
    pub agent: AgentRef,
    /// The summarised date.
    pub date: NaiveDate,
    /// Number of valid schedule entries.
    pub scheduled_entries: usize,
    /// Total scheduled hours.
    pub scheduled_hours: Decimal,
    /// Total clocked hours falling on the date.
    pub worked_hours: Decimal,
    /// Number of exceptions raised for the agent.
    pub exception_count: usize,
}
