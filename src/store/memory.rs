//! In-memory implementation of every storage trait.
//!
//! Used by the demo server and by tests. Besides the read paths the engine
//! needs, it offers the create/update/delete operations the surrounding CRUD
//! layer would normally own, so callers can seed and mutate fixtures.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::SeedData;
use crate::error::{EngineError, EngineResult};
use crate::models::{Agent, Department, Enrollment, Punch, ScheduleEntry};

use super::{AgentDirectory, EnrollmentStore, PunchStore, ScheduleStore, sort_chronologically};

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    departments: RwLock<HashMap<Uuid, Department>>,
    agents: RwLock<HashMap<Uuid, Agent>>,
    enrollments: RwLock<HashMap<Uuid, Enrollment>>,
    schedule: RwLock<HashMap<Uuid, ScheduleEntry>>,
    punches: RwLock<HashMap<Uuid, Punch>>,
}

fn read<T>(lock: &RwLock<T>) -> EngineResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|e| EngineError::Storage {
        message: format!("lock poisoned: {}", e),
    })
}

fn write<T>(lock: &RwLock<T>) -> EngineResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|e| EngineError::Storage {
        message: format!("lock poisoned: {}", e),
    })
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with seed data.
    pub fn from_seed(seed: SeedData) -> EngineResult<Self> {
        let store = Self::new();
        for department in seed.departments {
            store.create_department(department)?;
        }
        for agent in seed.agents {
            store.create_agent(agent)?;
        }
        for enrollment in seed.enrollments {
            store.create_enrollment(enrollment)?;
        }
        for entry in seed.schedule {
            store.create_schedule_entry(entry)?;
        }
        Ok(store)
    }

    /// Adds a department.
    pub fn create_department(&self, department: Department) -> EngineResult<Department> {
        write(&self.departments)?.insert(department.id, department.clone());
        Ok(department)
    }

    /// Adds an agent.
    pub fn create_agent(&self, agent: Agent) -> EngineResult<Agent> {
        let mut agents = write(&self.agents)?;
        if agents.contains_key(&agent.id) {
            return Err(EngineError::validation(
                "id",
                format!("agent {} already exists", agent.id),
            ));
        }
        agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    /// Replaces an agent record.
    pub fn update_agent(&self, agent: Agent) -> EngineResult<Agent> {
        let mut agents = write(&self.agents)?;
        match agents.get_mut(&agent.id) {
            Some(existing) => {
                *existing = agent.clone();
                Ok(agent)
            }
            None => Err(EngineError::not_found("Agent", agent.id)),
        }
    }

    /// Removes an agent.
    pub fn delete_agent(&self, id: Uuid) -> EngineResult<Agent> {
        write(&self.agents)?
            .remove(&id)
            .ok_or_else(|| EngineError::not_found("Agent", id))
    }

    /// Adds an enrollment. An agent may hold at most one.
    pub fn create_enrollment(&self, enrollment: Enrollment) -> EngineResult<Enrollment> {
        let mut enrollments = write(&self.enrollments)?;
        if enrollments
            .values()
            .any(|e| e.agent_id == enrollment.agent_id && e.id != enrollment.id)
        {
            return Err(EngineError::validation(
                "agent_id",
                format!("agent {} is already enrolled", enrollment.agent_id),
            ));
        }
        enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    /// Removes an enrollment.
    pub fn delete_enrollment(&self, id: Uuid) -> EngineResult<Enrollment> {
        write(&self.enrollments)?
            .remove(&id)
            .ok_or_else(|| EngineError::not_found("Enrollment", id))
    }

    /// Adds a schedule entry.
    pub fn create_schedule_entry(&self, entry: ScheduleEntry) -> EngineResult<ScheduleEntry> {
        write(&self.schedule)?.insert(entry.id, entry.clone());
        Ok(entry)
    }

    /// Replaces a schedule entry.
    pub fn update_schedule_entry(&self, entry: ScheduleEntry) -> EngineResult<ScheduleEntry> {
        let mut schedule = write(&self.schedule)?;
        match schedule.get_mut(&entry.id) {
            Some(existing) => {
                *existing = entry.clone();
                Ok(entry)
            }
            None => Err(EngineError::not_found("ScheduleEntry", entry.id)),
        }
    }

    /// Removes a schedule entry.
    pub fn delete_schedule_entry(&self, id: Uuid) -> EngineResult<ScheduleEntry> {
        write(&self.schedule)?
            .remove(&id)
            .ok_or_else(|| EngineError::not_found("ScheduleEntry", id))
    }

    fn latest_locked(punches: &HashMap<Uuid, Punch>, enrollment_id: Uuid) -> Option<Punch> {
        let mut ledger: Vec<Punch> = punches
            .values()
            .filter(|p| p.enrollment_id == enrollment_id)
            .cloned()
            .collect();
        sort_chronologically(&mut ledger);
        ledger.pop()
    }
}

impl AgentDirectory for InMemoryStore {
    fn get_agent(&self, id: Uuid) -> EngineResult<Option<Agent>> {
        Ok(read(&self.agents)?.get(&id).cloned())
    }

    fn list_agents(&self) -> EngineResult<Vec<Agent>> {
        let mut agents: Vec<Agent> = read(&self.agents)?.values().cloned().collect();
        agents.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(agents)
    }

    fn get_department(&self, id: Uuid) -> EngineResult<Option<Department>> {
        Ok(read(&self.departments)?.get(&id).cloned())
    }
}

impl EnrollmentStore for InMemoryStore {
    fn get_enrollment(&self, id: Uuid) -> EngineResult<Option<Enrollment>> {
        Ok(read(&self.enrollments)?.get(&id).cloned())
    }

    fn enrollment_for_agent(&self, agent_id: Uuid) -> EngineResult<Option<Enrollment>> {
        Ok(read(&self.enrollments)?
            .values()
            .find(|e| e.agent_id == agent_id)
            .cloned())
    }

    fn replace_descriptor(&self, id: Uuid, descriptor: Vec<f32>) -> EngineResult<Enrollment> {
        let mut enrollments = write(&self.enrollments)?;
        let enrollment = enrollments
            .get_mut(&id)
            .ok_or_else(|| EngineError::not_found("Enrollment", id))?;
        enrollment.reference_descriptor = Some(descriptor);
        Ok(enrollment.clone())
    }
}

impl PunchStore for InMemoryStore {
    fn get_punch(&self, id: Uuid) -> EngineResult<Option<Punch>> {
        Ok(read(&self.punches)?.get(&id).cloned())
    }

    fn list_for_enrollment(&self, enrollment_id: Uuid) -> EngineResult<Vec<Punch>> {
        let mut ledger: Vec<Punch> = read(&self.punches)?
            .values()
            .filter(|p| p.enrollment_id == enrollment_id)
            .cloned()
            .collect();
        sort_chronologically(&mut ledger);
        Ok(ledger)
    }

    fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> EngineResult<Vec<Punch>> {
        let mut punches: Vec<Punch> = read(&self.punches)?
            .values()
            .filter(|p| p.punch_time >= from && p.punch_time < to)
            .cloned()
            .collect();
        sort_chronologically(&mut punches);
        Ok(punches)
    }

    fn append(&self, punch: Punch, expected_latest: Option<Uuid>) -> EngineResult<Punch> {
        let mut punches = write(&self.punches)?;
        let actual_latest = Self::latest_locked(&punches, punch.enrollment_id).map(|p| p.id);
        if actual_latest != expected_latest {
            return Err(EngineError::StateConflict {
                enrollment_id: punch.enrollment_id,
            });
        }
        punches.insert(punch.id, punch.clone());
        Ok(punch)
    }

    fn insert(&self, punch: Punch) -> EngineResult<Punch> {
        write(&self.punches)?.insert(punch.id, punch.clone());
        Ok(punch)
    }

    fn update(&self, punch: Punch) -> EngineResult<Punch> {
        let mut punches = write(&self.punches)?;
        match punches.get_mut(&punch.id) {
            Some(existing) => {
                *existing = punch.clone();
                Ok(punch)
            }
            None => Err(EngineError::not_found("Punch", punch.id)),
        }
    }

    fn delete(&self, id: Uuid) -> EngineResult<Punch> {
        write(&self.punches)?
            .remove(&id)
            .ok_or_else(|| EngineError::not_found("Punch", id))
    }

    fn latest_for_enrollment(&self, enrollment_id: Uuid) -> EngineResult<Option<Punch>> {
        let punches = read(&self.punches)?;
        Ok(Self::latest_locked(&punches, enrollment_id))
    }
}

impl ScheduleStore for InMemoryStore {
    fn schedule_for(
        &self,
        date: NaiveDate,
        agent_id: Option<Uuid>,
    ) -> EngineResult<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = read(&self.schedule)?
            .values()
            .filter(|e| e.date == date && agent_id.is_none_or(|id| e.agent_id == id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.agent_id
                .cmp(&b.agent_id)
                .then(a.start_time.cmp(&b.start_time))
                .then(a.id.cmp(&b.id))
        });
        Ok(entries)
    }
}
