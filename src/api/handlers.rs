//! HTTP request handlers for the Attendance Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::ledger::{PunchEdit, RecordPunch};
use crate::models::{Enrollment, RequestMetadata};

use super::request::{
    DeletePunchQuery, DescriptorRequest, EditPunchRequest, ManualPunchRequest, PunchQuery,
    PunchRequest, ReportQuery, ScheduleQuery,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/schedule", get(schedule_handler))
        .route(
            "/punches",
            get(list_punches_handler).post(record_punch_handler),
        )
        .route("/punches/manual", post(manual_punch_handler))
        .route(
            "/punches/:id",
            patch(edit_punch_handler).delete(delete_punch_handler),
        )
        .route("/exceptions", get(exceptions_handler))
        .route("/summary", get(summary_handler))
        .route("/status", get(status_handler))
        .route(
            "/enrollments/:id/descriptor",
            put(replace_descriptor_handler),
        )
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(status: StatusCode, error: ApiError) -> Response {
    json_response(status, error)
}

fn engine_error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        retryable = err.is_retryable(),
        "Request failed"
    );
    let api_error: ApiErrorResponse = err.into();
    error_response(api_error.status, api_error.error)
}

fn respond<T: Serialize>(correlation_id: Uuid, status: StatusCode, result: EngineResult<T>) -> Response {
    match result {
        Ok(body) => json_response(status, body),
        Err(err) => engine_error_response(correlation_id, err),
    }
}

fn json_rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    error_response(StatusCode::BAD_REQUEST, error)
}

fn query_rejection_response(correlation_id: Uuid, rejection: QueryRejection) -> Response {
    let body_text = rejection.body_text();
    warn!(
        correlation_id = %correlation_id,
        error = %body_text,
        "Query string rejected"
    );
    error_response(
        StatusCode::BAD_REQUEST,
        ApiError::validation_error(body_text),
    )
}

fn path_rejection_response(correlation_id: Uuid, rejection: PathRejection) -> Response {
    let body_text = rejection.body_text();
    warn!(
        correlation_id = %correlation_id,
        error = %body_text,
        "Path parameter rejected"
    );
    error_response(
        StatusCode::BAD_REQUEST,
        ApiError::validation_error(body_text),
    )
}

/// Reads audit metadata from the kiosk's request headers.
fn request_metadata(headers: &HeaderMap) -> RequestMetadata {
    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };
    RequestMetadata {
        user_agent: header_text(header::USER_AGENT.as_str()).map(str::to_string),
        ip_address: header_text("x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string()),
    }
}

fn find_enrollment(state: &AppState, enrollment_id: Uuid) -> EngineResult<Enrollment> {
    state
        .enrollments()
        .get_enrollment(enrollment_id)?
        .ok_or_else(|| EngineError::not_found("Enrollment", enrollment_id))
}

/// Handler for GET /health.
async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
    )
}

/// Handler for GET /schedule.
async fn schedule_handler(
    State(state): State<AppState>,
    query: Result<Query<ScheduleQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection_response(correlation_id, rejection),
    };

    let result = state.schedule().schedule_for(query.date, query.agent_id);
    if let Ok(entries) = &result {
        info!(
            correlation_id = %correlation_id,
            date = %query.date,
            entries = entries.len(),
            "Schedule listed"
        );
    }
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for GET /punches.
///
/// Lists one enrollment's ledger, or every punch in a `[from, to)` range.
async fn list_punches_handler(
    State(state): State<AppState>,
    query: Result<Query<PunchQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection_response(correlation_id, rejection),
    };

    let result = match (query.enrollment_id, query.from, query.to) {
        (Some(enrollment_id), _, _) => state.ledger().punches_for_enrollment(enrollment_id),
        (None, Some(from), Some(to)) => state.ledger().punches_between(from, to),
        _ => Err(EngineError::validation(
            "enrollment_id",
            "provide enrollment_id, or both from and to",
        )),
    };
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for POST /punches.
///
/// Verifies the kiosk credential against the enrollment, then records the
/// punch at the server's current time.
async fn record_punch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PunchRequest>, JsonRejection>,
) -> Response {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing punch request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = find_enrollment(&state, request.enrollment_id).and_then(|enrollment| {
        let evidence = state.verifier().verify(&enrollment, &request.credential)?;
        state.ledger().record_punch(RecordPunch {
            enrollment_id: enrollment.id,
            punch_type: request.punch_type,
            evidence,
            location: request.location,
            metadata: request_metadata(&headers),
        })
    });

    match result {
        Ok(punch) => {
            state.cache().clear();
            info!(
                correlation_id = %correlation_id,
                enrollment_id = %punch.enrollment_id,
                punch_id = %punch.id,
                punch_type = %punch.punch_type,
                duration_us = start_time.elapsed().as_micros(),
                "Punch request completed"
            );
            json_response(StatusCode::CREATED, punch)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for PATCH /punches/:id.
async fn edit_punch_handler(
    State(state): State<AppState>,
    punch_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EditPunchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let punch_id = match punch_id {
        Ok(Path(id)) => id,
        Err(rejection) => return path_rejection_response(correlation_id, rejection),
    };
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let result = state.ledger().edit_punch(PunchEdit {
        punch_id,
        new_time: request.punch_time,
        note: request.note,
        editor_id: request.editor_id,
    });
    if result.is_ok() {
        state.cache().clear();
    }
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for POST /punches/manual.
async fn manual_punch_handler(
    State(state): State<AppState>,
    payload: Result<Json<ManualPunchRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    let result = state.ledger().create_manual_punch(request.into());
    if result.is_ok() {
        state.cache().clear();
    }
    respond(correlation_id, StatusCode::CREATED, result)
}

/// Handler for DELETE /punches/:id.
async fn delete_punch_handler(
    State(state): State<AppState>,
    punch_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<DeletePunchQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let punch_id = match punch_id {
        Ok(Path(id)) => id,
        Err(rejection) => return path_rejection_response(correlation_id, rejection),
    };
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection_response(correlation_id, rejection),
    };

    let result = state.ledger().delete_manual_punch(punch_id, query.editor_id);
    if result.is_ok() {
        state.cache().clear();
    }
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for GET /exceptions.
async fn exceptions_handler(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection_response(correlation_id, rejection),
    };

    let date = query.date;
    let filter = query.filter();
    let start_time = Instant::now();
    let result = state.cache().get_or_compute(date, &filter, || {
        state.engine().compute_exceptions(date, &filter, state.now())
    });

    if let Ok(set) = &result {
        info!(
            correlation_id = %correlation_id,
            date = %date,
            exceptions = set.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Exception report served"
        );
    }
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for GET /summary.
async fn summary_handler(
    State(state): State<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return query_rejection_response(correlation_id, rejection),
    };

    let date = query.date;
    let result = state
        .engine()
        .daily_summary(date, &query.filter(), state.now());
    respond(correlation_id, StatusCode::OK, result)
}

/// Handler for GET /status.
async fn status_handler(State(state): State<AppState>) -> Response {
    let correlation_id = Uuid::new_v4();
    respond(correlation_id, StatusCode::OK, state.ledger().status_board())
}

/// Handler for PUT /enrollments/:id/descriptor.
async fn replace_descriptor_handler(
    State(state): State<AppState>,
    enrollment_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<DescriptorRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let enrollment_id = match enrollment_id {
        Ok(Path(id)) => id,
        Err(rejection) => return path_rejection_response(correlation_id, rejection),
    };
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection_response(correlation_id, rejection),
    };

    if request.descriptor.is_empty() || request.descriptor.iter().any(|v| !v.is_finite()) {
        return engine_error_response(
            correlation_id,
            EngineError::validation("descriptor", "must be a non-empty list of finite numbers"),
        );
    }

    let dimensions = request.descriptor.len();
    let result = state
        .enrollments()
        .replace_descriptor(enrollment_id, request.descriptor);
    if result.is_ok() {
        info!(
            correlation_id = %correlation_id,
            enrollment_id = %enrollment_id,
            dimensions,
            "Reference descriptor replaced"
        );
    }
    respond(correlation_id, StatusCode::OK, result)
}
