//! Handlers for facilities and their occupancy roll-up.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::facility::{CreateFacility, UpdateFacility};
use canopy_db::repositories::{FacilityRepo, StatsRepo};
use validator::Validate;

use super::{load_facility, not_found};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/facilities
///
/// Admins see every facility; everyone else sees only their own.
pub async fn list_facilities(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let facilities = FacilityRepo::list(&state.pool).await?;
    let visible: Vec<_> = facilities
        .into_iter()
        .filter(|f| auth.ensure_facility(f.id).is_ok())
        .collect();

    Ok(Json(DataResponse { data: visible }))
}

/// POST /api/v1/facilities
pub async fn create_facility(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateFacility>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let facility = FacilityRepo::create(&state.pool, &input).await?;

    tracing::info!(facility_id = facility.id, user_id = admin.user_id, "Facility created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: facility })))
}

/// GET /api/v1/facilities/{id}
pub async fn get_facility(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let facility = load_facility(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: facility }))
}

/// PUT /api/v1/facilities/{id}
pub async fn update_facility(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateFacility>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let facility = FacilityRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("facility", id))?;

    tracing::info!(facility_id = id, user_id = admin.user_id, "Facility updated");

    Ok(Json(DataResponse { data: facility }))
}

/// GET /api/v1/facilities/{id}/stats
///
/// Capacity and utilization for the facility and each of its rooms,
/// recomputed from live plant rows.
pub async fn facility_stats(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, id).await?;
    let stats = StatsRepo::facility_stats(&state.pool, id).await?;
    Ok(Json(DataResponse { data: stats }))
}
