//! Handlers for the plant lifecycle: placement, movement, growth phase,
//! METRC tagging, retirement and observations.
//!
//! Reads need any role in the plant's facility; writes need `grower` or
//! `admin`. Rule violations come back as the domain error code, e.g.
//! `409 CAPACITY_EXCEEDED` or `409 TAG_NOT_AVAILABLE`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::plant::{
    ChangePhase, CreatePlant, MovePlant, PlantListParams, QuickEntry, RetirePlant, TagPlant,
};
use canopy_db::models::plant_event::CreateObservation;
use canopy_db::repositories::{PlantEventRepo, PlantRepo};
use validator::Validate;

use super::{authorize_tray, load_facility, load_plant};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireGrower};
use crate::query::{LookupParams, PaginationParams};
use crate::response::{DataResponse, Page};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/facilities/{id}/plants
///
/// Filters: `status`, `growth_phase`, `room_id`, `tray_id`, `strain_id`,
/// `plant_batch_id`, plus `limit` / `offset`.
pub async fn list_plants(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Query(params): Query<PlantListParams>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let items = PlantRepo::list(&state.pool, facility_id, &params).await?;
    let total_count = PlantRepo::count(&state.pool, facility_id, &params).await?;

    Ok(Json(DataResponse {
        data: Page { items, total_count },
    }))
}

/// GET /api/v1/facilities/{id}/plants/lookup?q=
///
/// Find a plant by its internal uid or METRC label.
pub async fn lookup_plant(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Query(params): Query<LookupParams>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let plant = PlantRepo::lookup(&state.pool, facility_id, &params.q).await?;
    Ok(Json(DataResponse { data: plant }))
}

/// GET /api/v1/plants/{id}
pub async fn get_plant(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let plant = load_plant(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: plant }))
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// POST /api/v1/plants
pub async fn create_plant(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Json(input): Json<CreatePlant>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    authorize_tray(&state, &auth, input.tray_id).await?;
    let plant = PlantRepo::create(&state.pool, &input, Some(auth.user_id)).await?;

    tracing::info!(
        plant_id = plant.id,
        tray_id = input.tray_id,
        user_id = auth.user_id,
        "Plant created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: plant })))
}

/// POST /api/v1/plants/quick-entry
///
/// Create and tag one plant per suffix. Always 200: the per-item report
/// says which items failed and why.
pub async fn quick_entry(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Json(input): Json<QuickEntry>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    authorize_tray(&state, &auth, input.tray_id).await?;
    let report = PlantRepo::quick_entry(&state.pool, &input, Some(auth.user_id)).await?;

    tracing::info!(
        tray_id = input.tray_id,
        succeeded = report.succeeded,
        failed = report.failed,
        user_id = auth.user_id,
        "Quick entry completed",
    );

    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/plants/{id}/move
pub async fn move_plant(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MovePlant>,
) -> AppResult<impl IntoResponse> {
    load_plant(&state, &auth, id).await?;
    let outcome = PlantRepo::move_to(&state.pool, id, input.tray_id, Some(auth.user_id)).await?;

    if outcome.moved {
        tracing::info!(plant_id = id, tray_id = input.tray_id, user_id = auth.user_id, "Plant moved");
    }

    Ok(Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/plants/{id}/phase
pub async fn change_phase(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ChangePhase>,
) -> AppResult<impl IntoResponse> {
    load_plant(&state, &auth, id).await?;
    let plant =
        PlantRepo::change_phase(&state.pool, id, input.growth_phase, Some(auth.user_id)).await?;

    tracing::info!(
        plant_id = id,
        phase = %plant.growth_phase,
        user_id = auth.user_id,
        "Plant phase changed",
    );

    Ok(Json(DataResponse { data: plant }))
}

/// POST /api/v1/plants/{id}/tag
///
/// Assign an available METRC tag. With `reassign: true` the plant's
/// current tag is superseded in the same transaction.
pub async fn tag_plant(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TagPlant>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_plant(&state, &auth, id).await?;
    let plant =
        PlantRepo::tag(&state.pool, id, &input.tag, input.reassign, Some(auth.user_id)).await?;

    tracing::info!(
        plant_id = id,
        tag = plant.metrc_label.as_deref().unwrap_or_default(),
        reassign = input.reassign,
        user_id = auth.user_id,
        "Plant tagged",
    );

    Ok(Json(DataResponse { data: plant }))
}

/// POST /api/v1/plants/{id}/retire
///
/// Destroy or remove an active plant. Frees its tray slot and consumes its
/// tag.
pub async fn retire_plant(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RetirePlant>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_plant(&state, &auth, id).await?;
    let plant = PlantRepo::retire(
        &state.pool,
        id,
        input.status,
        input.reason.as_deref(),
        Some(auth.user_id),
    )
    .await?;

    tracing::info!(plant_id = id, status = %plant.status, user_id = auth.user_id, "Plant retired");

    Ok(Json(DataResponse { data: plant }))
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// GET /api/v1/plants/{id}/observations
pub async fn list_observations(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    load_plant(&state, &auth, id).await?;
    let events = PlantEventRepo::list_for_plant(&state.pool, id, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: events }))
}

/// POST /api/v1/plants/{id}/observations
///
/// Needs notes or at least one photo URL (see `POST /photos`). Allowed on
/// retired plants too.
pub async fn add_observation(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateObservation>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_plant(&state, &auth, id).await?;
    let event = PlantEventRepo::add_observation(&state.pool, id, &input, Some(auth.user_id)).await?;

    tracing::info!(plant_id = id, event_id = event.id, user_id = auth.user_id, "Observation added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}
