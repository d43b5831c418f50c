use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use canopy_core::error::{CoreError, GrowError};
use canopy_db::RepoError;
use serde::Serialize;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Every variant renders as [`ErrorBody`]: a message, a stable machine code
/// and, for Grow rule violations, the structured facts a client needs to
/// recover (e.g. the tray's occupancy on `CAPACITY_EXCEEDED`).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A Grow rule violation (capacity, tags, lifecycle, harvest stages).
    #[error(transparent)]
    Grow(#[from] GrowError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Field-level request validation failures.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Grow(e) => AppError::Grow(e),
            RepoError::Core(e) => AppError::Core(e),
            RepoError::Database(e) => AppError::Database(e),
        }
    }
}

/// JSON shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    fn internal() -> Self {
        Self::new("INTERNAL_ERROR", "An internal error occurred")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Core(core) => core_error(core),
            AppError::Grow(grow) => (
                grow_status(grow),
                ErrorBody {
                    error: grow.to_string(),
                    code: grow.code(),
                    details: grow_details(grow),
                },
            ),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", errors.to_string()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new("BAD_REQUEST", msg.clone()))
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn core_error(err: &CoreError) -> (StatusCode, ErrorBody) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("NOT_FOUND", format!("{entity} with id {id} not found")),
        ),
        CoreError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("VALIDATION_ERROR", msg.clone()),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new("CONFLICT", msg.clone())),
        CoreError::Unauthorized(msg) => (
            StatusCode::UNAUTHORIZED,
            ErrorBody::new("UNAUTHORIZED", msg.clone()),
        ),
        CoreError::Forbidden(msg) => {
            (StatusCode::FORBIDDEN, ErrorBody::new("FORBIDDEN", msg.clone()))
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
        }
    }
}

/// HTTP status for a Grow rule violation.
///
/// Conflicts with current state are 409, unknown plants and tags are 404 and
/// malformed input is 422.
fn grow_status(err: &GrowError) -> StatusCode {
    match err {
        GrowError::CapacityExceeded { .. }
        | GrowError::TagNotAvailable { .. }
        | GrowError::TagAlreadyAssigned { .. }
        | GrowError::InvalidTagTransition { .. }
        | GrowError::PlantNotActive { .. }
        | GrowError::PlantAlreadyTagged { .. }
        | GrowError::PlantAlreadyBatched { .. }
        | GrowError::PlantNotFlowering { .. }
        | GrowError::InvalidHarvestTransition { .. } => StatusCode::CONFLICT,
        GrowError::TagNotFound(_) | GrowError::PlantNotFound(_) => StatusCode::NOT_FOUND,
        GrowError::InvalidTagFormat { .. }
        | GrowError::BatchStrainMismatch { .. }
        | GrowError::EmptyObservation
        | GrowError::InvalidWeight { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Machine-readable facts behind a conflict, for clients that re-fetch and
/// retry rather than parse the message.
fn grow_details(err: &GrowError) -> Option<Value> {
    let details = match err {
        GrowError::CapacityExceeded {
            tray_id,
            capacity,
            occupancy,
        } => json!({ "tray_id": tray_id, "capacity": capacity, "occupancy": occupancy }),
        GrowError::TagNotAvailable { tag, status } | GrowError::TagAlreadyAssigned { tag, status } => {
            json!({ "tag": tag, "status": status })
        }
        GrowError::InvalidTagFormat { tag, issue } => json!({ "tag": tag, "issue": issue }),
        GrowError::PlantNotActive { plant_id, status } => {
            json!({ "plant_id": plant_id, "status": status })
        }
        GrowError::BatchStrainMismatch {
            batch_strain_id,
            plant_strain_id,
        } => json!({ "batch_strain_id": batch_strain_id, "plant_strain_id": plant_strain_id }),
        GrowError::PlantNotFlowering { plant_id, phase } => {
            json!({ "plant_id": plant_id, "growth_phase": phase })
        }
        GrowError::InvalidHarvestTransition { status, action } => {
            json!({ "status": status, "action": action })
        }
        _ => return None,
    };
    Some(details)
}

/// Classify a sqlx error into an HTTP status and body.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Deadlocks and serialization failures map to 409 `CONCURRENT_UPDATE`.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, ErrorBody) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("NOT_FOUND", "Resource not found"),
        ),
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                && db_err.constraint().is_some_and(|c| c.starts_with("uq_")) =>
        {
            let constraint = db_err.constraint().unwrap_or_default();
            (
                StatusCode::CONFLICT,
                ErrorBody::new(
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                ),
            )
        }
        // Deadlock or serialization failure: the request lost a race and may be retried.
        sqlx::Error::Database(db_err)
            if matches!(db_err.code().as_deref(), Some("40P01" | "40001")) =>
        {
            tracing::warn!(error = %db_err, "Transaction aborted by a concurrent writer");
            (
                StatusCode::CONFLICT,
                ErrorBody::new("CONCURRENT_UPDATE", "Concurrent update, please retry"),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
        }
    }
}
