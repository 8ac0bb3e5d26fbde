//! Daily reconciliation of schedules against punches.
//!
//! Reconciliation is a pure read: for the same stores, date, filter, and
//! `now` it always produces the same report.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Agent, AgentDaySummary, ArrivalException, AttendanceException, DepartureException,
    ExceptionSet, MissedPunchException, NoShowException, Punch, ScheduleEntry,
};
use crate::store::{AgentDirectory, EnrollmentStore, PunchStore, ScheduleStore};

use super::intervals::{WorkInterval, alternation_gaps, local_time, pair_punches};
use super::matching::match_entries;

/// Restricts a report to one agent and/or one department.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionFilter {
    /// Only this agent.
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    /// Only agents in this department.
    #[serde(default)]
    pub department_id: Option<Uuid>,
}

impl ExceptionFilter {
    /// A filter matching every agent.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching one agent.
    pub fn agent(agent_id: Uuid) -> Self {
        Self {
            agent_id: Some(agent_id),
            department_id: None,
        }
    }

    /// A filter matching one department.
    pub fn department(department_id: Uuid) -> Self {
        Self {
            agent_id: None,
            department_id: Some(department_id),
        }
    }
}

/// Thresholds used by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationSettings {
    /// Deltas strictly below this many minutes are on time.
    pub tolerance_minutes: i64,
    /// Minutes after a scheduled start before a no-show is reported.
    pub no_show_grace_minutes: i64,
    /// The site's wall-clock offset from UTC.
    pub site_offset: FixedOffset,
}

impl From<&EngineConfig> for ReconciliationSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tolerance_minutes: config.tolerance_minutes,
            no_show_grace_minutes: config.no_show_grace_minutes,
            site_offset: config.site_offset(),
        }
    }
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// One agent's inputs for a day.
struct AgentDay {
    agent: Agent,
    enrollment_id: Option<Uuid>,
    entries: Vec<ScheduleEntry>,
    punches: Vec<Punch>,
}

/// Computes attendance exceptions and daily summaries.
pub struct ReconciliationEngine {
    agents: Arc<dyn AgentDirectory>,
    enrollments: Arc<dyn EnrollmentStore>,
    punches: Arc<dyn PunchStore>,
    schedule: Arc<dyn ScheduleStore>,
    settings: ReconciliationSettings,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

fn hours(minutes: i64) -> Decimal {
    (Decimal::from(minutes) / Decimal::from(60)).round_dp(2)
}

impl ReconciliationEngine {
    /// Creates an engine over the given stores.
    pub fn new(
        agents: Arc<dyn AgentDirectory>,
        enrollments: Arc<dyn EnrollmentStore>,
        punches: Arc<dyn PunchStore>,
        schedule: Arc<dyn ScheduleStore>,
        settings: ReconciliationSettings,
    ) -> Self {
        Self {
            agents,
            enrollments,
            punches,
            schedule,
            settings,
        }
    }

    /// Returns the thresholds in use.
    pub fn settings(&self) -> &ReconciliationSettings {
        &self.settings
    }

    /// Computes every exception on `date` for the agents matched by `filter`.
    ///
    /// Schedule entries and punches are compared in site-local time.
    /// Exceptions in each list are ordered by agent name, then time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the filter names an unknown agent or department.
    pub fn compute_exceptions(
        &self,
        date: NaiveDate,
        filter: &ExceptionFilter,
        now: DateTime<Utc>,
    ) -> EngineResult<ExceptionSet> {
        let now_local = local_time(now, self.settings.site_offset);
        let mut set = ExceptionSet::new(date);

        for day in self.load_days(date, filter)? {
            self.reconcile_agent(&day, date, now_local, &mut set);
        }

        set.sort();
        info!(
            date = %date,
            agent_id = ?filter.agent_id,
            department_id = ?filter.department_id,
            exceptions = set.len(),
            "Exceptions computed"
        );
        Ok(set)
    }

    /// Summarizes scheduled and worked hours per agent on `date`.
    ///
    /// Worked time counts intervals clipped to the day and to `now`. Agents
    /// with neither schedule nor worked time are omitted.
    pub fn daily_summary(
        &self,
        date: NaiveDate,
        filter: &ExceptionFilter,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<AgentDaySummary>> {
        let now_local = local_time(now, self.settings.site_offset);
        let (day_start, day_end) = day_bounds(date);
        let mut summaries = Vec::new();

        for day in self.load_days(date, filter)? {
            let scheduled_minutes: i64 = day.entries.iter().map(|e| e.scheduled_minutes()).sum();
            let worked_minutes: i64 = pair_punches(&day.punches, self.settings.site_offset)
                .iter()
                .map(|interval| interval.minutes_within(day_start, day_end, now_local))
                .sum();
            if day.entries.is_empty() && worked_minutes == 0 {
                continue;
            }

            let mut exceptions = ExceptionSet::new(date);
            self.reconcile_agent(&day, date, now_local, &mut exceptions);

            summaries.push(AgentDaySummary {
                agent: day.agent.as_ref_label(),
                date,
                scheduled_entries: day.entries.len(),
                scheduled_hours: hours(scheduled_minutes),
                worked_hours: hours(worked_minutes),
                exception_count: exceptions.len(),
            });
        }

        summaries.sort_by(|a, b| {
            a.agent
                .name
                .cmp(&b.agent.name)
                .then(a.agent.agent_id.cmp(&b.agent.agent_id))
        });
        Ok(summaries)
    }

    fn agents_in_scope(&self, filter: &ExceptionFilter) -> EngineResult<Vec<Agent>> {
        if let Some(department_id) = filter.department_id {
            self.agents
                .get_department(department_id)?
                .ok_or_else(|| EngineError::not_found("Department", department_id))?;
        }

        let agents = match filter.agent_id {
            Some(agent_id) => vec![
                self.agents
                    .get_agent(agent_id)?
                    .ok_or_else(|| EngineError::not_found("Agent", agent_id))?,
            ],
            None => self.agents.list_agents()?,
        };

        Ok(agents
            .into_iter()
            .filter(|agent| {
                filter
                    .department_id
                    .is_none_or(|department| agent.department_id == Some(department))
            })
            .collect())
    }

    fn load_days(&self, date: NaiveDate, filter: &ExceptionFilter) -> EngineResult<Vec<AgentDay>> {
        let agents = self.agents_in_scope(filter)?;

        let mut schedule: HashMap<Uuid, Vec<ScheduleEntry>> = HashMap::new();
        for entry in self.schedule.schedule_for(date, filter.agent_id)? {
            schedule.entry(entry.agent_id).or_default().push(entry);
        }

        let mut days = Vec::with_capacity(agents.len());
        for agent in agents {
            let entries = schedule.remove(&agent.id).unwrap_or_default();
            let enrollment = self.enrollments.enrollment_for_agent(agent.id)?;
            let punches = match &enrollment {
                Some(enrollment) => self.punches.list_for_enrollment(enrollment.id)?,
                None => Vec::new(),
            };
            days.push(AgentDay {
                agent,
                enrollment_id: enrollment.map(|e| e.id),
                entries,
                punches,
            });
        }
        Ok(days)
    }

    /// Returns the delta in whole minutes, or `None` if it is within tolerance.
    fn significant(&self, delta: Duration) -> Option<i64> {
        let minutes = delta.num_minutes();
        if minutes == 0 || minutes.abs() < self.settings.tolerance_minutes {
            None
        } else {
            Some(minutes)
        }
    }

    fn reconcile_agent(
        &self,
        day: &AgentDay,
        date: NaiveDate,
        now_local: NaiveDateTime,
        set: &mut ExceptionSet,
    ) {
        let agent = day.agent.as_ref_label();
        let (day_start, day_end) = day_bounds(date);

        let intervals: Vec<WorkInterval> = pair_punches(&day.punches, self.settings.site_offset)
            .into_iter()
            .filter(|i| i.start < day_end && i.effective_end(now_local) > day_start)
            .collect();

        let mut entries: Vec<(&ScheduleEntry, (NaiveDateTime, NaiveDateTime))> = Vec::new();
        for entry in &day.entries {
            match entry.span() {
                Some(span) => entries.push((entry, span)),
                None => warn!(
                    schedule_entry_id = %entry.id,
                    agent_id = %entry.agent_id,
                    start = %entry.start_time,
                    end = %entry.end_time,
                    "Skipping schedule entry that ends before it starts"
                ),
            }
        }
        entries.sort_by_key(|(entry, span)| (span.0, entry.id));

        let spans: Vec<_> = entries.iter().map(|(_, span)| *span).collect();
        let matches = match_entries(&spans, &intervals, day_end, now_local);
        debug!(
            agent_id = %agent.agent_id,
            entries = entries.len(),
            intervals = intervals.len(),
            matched = matches.iter().filter(|m| m.is_some()).count(),
            "Reconciling agent"
        );

        for ((entry, (start, end)), matched) in entries.iter().zip(matches) {
            let Some(matched) = matched else {
                let grace = Duration::minutes(self.settings.no_show_grace_minutes);
                if date <= now_local.date() && now_local > *start + grace {
                    set.push(AttendanceException::NoShow(NoShowException {
                        agent: agent.clone(),
                        schedule_entry_id: entry.id,
                        activity_type_id: entry.activity_type_id,
                        scheduled_start: *start,
                        scheduled_end: *end,
                    }));
                }
                continue;
            };

            if let Some(minutes) = self.significant(matched.actual_start - *start) {
                let exception = ArrivalException {
                    agent: agent.clone(),
                    schedule_entry_id: entry.id,
                    activity_type_id: entry.activity_type_id,
                    scheduled: *start,
                    actual: matched.actual_start,
                    minutes_diff: minutes,
                };
                set.push(if minutes > 0 {
                    AttendanceException::ArrivedLate(exception)
                } else {
                    AttendanceException::ArrivedEarly(exception)
                });
            }

            if matched.open && now_local < *end {
                continue;
            }
            let actual_end = matched.actual_end.unwrap_or(now_local);
            if let Some(minutes) = self.significant(actual_end - *end) {
                let exception = DepartureException {
                    agent: agent.clone(),
                    schedule_entry_id: entry.id,
                    activity_type_id: entry.activity_type_id,
                    scheduled: *end,
                    actual: actual_end,
                    minutes_diff: minutes,
                    still_clocked_in: matched.actual_end.is_none(),
                };
                set.push(if minutes > 0 {
                    AttendanceException::LeftLate(exception)
                } else {
                    AttendanceException::LeftEarly(exception)
                });
            }
        }

        if let Some(enrollment_id) = day.enrollment_id {
            for gap in alternation_gaps(&day.punches, self.settings.site_offset) {
                if gap.punch_time.date() != date {
                    continue;
                }
                set.push(AttendanceException::MissedPunch(MissedPunchException {
                    agent: agent.clone(),
                    enrollment_id,
                    missing: gap.missing,
                    punch_id: gap.punch_id,
                    punch_time: gap.punch_time,
                    message: gap.describe(),
                }));
            }
        }
    }
}
