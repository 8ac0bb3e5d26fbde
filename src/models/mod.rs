//! Core data models for the Attendance Engine.
//!
//! This module contains the domain models shared by the identity verifier,
//! the punch ledger, and the reconciliation engine.

mod agent;
mod enrollment;
mod exception;
mod punch;
mod schedule;

pub use agent::{Agent, AgentRef, AgentStatus, Department};
pub use enrollment::Enrollment;
pub use exception::{
    AgentDaySummary, ArrivalException, AttendanceException, DepartureException, ExceptionKind,
    ExceptionSet, MissedPunchException, NoShowException,
};
pub use punch::{AttendanceState, Location, Punch, PunchType, RequestMetadata, VerificationMethod};
pub use schedule::ScheduleEntry;
