//! HTTP API module for the Attendance Engine.
//!
//! This module provides the REST endpoints used by kiosks to punch and by
//! supervisors to correct punches and review attendance exceptions.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    DeletePunchQuery, DescriptorRequest, EditPunchRequest, ManualPunchRequest, PunchQuery,
    PunchRequest, ReportQuery, ScheduleQuery,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
