//! Storage interfaces consumed by the engine.
//!
//! The agent directory, enrollment store, punch ledger storage, and schedule
//! store are owned by surrounding subsystems. The engine reaches them through
//! these traits so it can run against a database or against
//! [`InMemoryStore`] in tests and the demo server.

mod memory;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{Agent, Department, Enrollment, Punch, ScheduleEntry};

pub use memory::InMemoryStore;

/// Read access to agents and departments.
pub trait AgentDirectory: Send + Sync {
    /// Looks up one agent.
    fn get_agent(&self, id: Uuid) -> EngineResult<Option<Agent>>;
    /// Lists every agent.
    fn list_agents(&self) -> EngineResult<Vec<Agent>>;
    /// Looks up one department.
    fn get_department(&self, id: Uuid) -> EngineResult<Option<Department>>;
}

/// Access to enrollment records.
pub trait EnrollmentStore: Send + Sync {
    /// Looks up one enrollment.
    fn get_enrollment(&self, id: Uuid) -> EngineResult<Option<Enrollment>>;
    /// Looks up the enrollment of an agent.
    fn enrollment_for_agent(&self, agent_id: Uuid) -> EngineResult<Option<Enrollment>>;
    /// Replaces the reference face descriptor, returning the updated record.
    fn replace_descriptor(&self, id: Uuid, descriptor: Vec<f32>) -> EngineResult<Enrollment>;
}

/// Persistence for punches.
///
/// Every list method returns punches in chronological order (see
/// [`sort_chronologically`]).
pub trait PunchStore: Send + Sync {
    /// Looks up one punch.
    fn get_punch(&self, id: Uuid) -> EngineResult<Option<Punch>>;
    /// Lists the full ledger of one enrollment.
    fn list_for_enrollment(&self, enrollment_id: Uuid) -> EngineResult<Vec<Punch>>;
    /// Lists punches of every enrollment with `from <= punch_time < to`.
    fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> EngineResult<Vec<Punch>>;
    /// Appends `punch` only if the enrollment's latest punch is still
    /// `expected_latest`; otherwise fails with `StateConflict`.
    fn append(&self, punch: Punch, expected_latest: Option<Uuid>) -> EngineResult<Punch>;
    /// Inserts `punch` without a sequence check.
    fn insert(&self, punch: Punch) -> EngineResult<Punch>;
    /// Replaces a stored punch.
    fn update(&self, punch: Punch) -> EngineResult<Punch>;
    /// Removes a punch, returning it.
    fn delete(&self, id: Uuid) -> EngineResult<Punch>;

    /// Returns the enrollment's most recent punch by `punch_time`.
    fn latest_for_enrollment(&self, enrollment_id: Uuid) -> EngineResult<Option<Punch>> {
        Ok(self.list_for_enrollment(enrollment_id)?.pop())
    }
}

/// Read access to schedule entries.
pub trait ScheduleStore: Send + Sync {
    /// Lists the entries on `date`, optionally for one agent, ordered by
    /// agent then start time.
    fn schedule_for(&self, date: NaiveDate, agent_id: Option<Uuid>)
    -> EngineResult<Vec<ScheduleEntry>>;
}

/// Orders punches by `punch_time`, breaking ties by creation time then id.
pub fn sort_chronologically(punches: &mut [Punch]) {
    punches.sort_by(|a, b| {
        a.punch_time
            .cmp(&b.punch_time)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}
