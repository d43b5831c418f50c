//! Handlers for the harvest workflow.
//!
//! Each recording endpoint advances (or checks) the harvest's stage. An
//! out-of-order call fails with `409 INVALID_HARVEST_TRANSITION`; weights
//! that are negative or not finite fail with `422 INVALID_WEIGHT`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::harvest::{
    AddHarvestPlants, CreateHarvest, HarvestListParams, HarvestNote, RecordStrainWeight,
    RecordWaste, RecordWetWeight, StartDrying,
};
use canopy_db::repositories::HarvestRepo;
use validator::Validate;

use super::{load_facility, load_harvest, load_room, not_found};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth, RequireGrower};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/facilities/{id}/harvests?status=
pub async fn list_harvests(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Query(params): Query<HarvestListParams>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let harvests = HarvestRepo::list(&state.pool, facility_id, &params).await?;
    Ok(Json(DataResponse { data: harvests }))
}

/// GET /api/v1/facilities/{id}/flower-inventory
///
/// Flower and shake grams per strain over every harvest that recorded them.
pub async fn flower_inventory(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let inventory = HarvestRepo::flower_inventory(&state.pool, facility_id).await?;
    Ok(Json(DataResponse { data: inventory }))
}

/// GET /api/v1/harvests/{id}
///
/// The harvest with its plants and per-strain weights (with warnings).
pub async fn get_harvest(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let detail = HarvestRepo::detail(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("harvest", id))?;
    Ok(Json(DataResponse { data: detail }))
}

/// GET /api/v1/harvests/{id}/plants
pub async fn list_harvest_plants(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let plants = HarvestRepo::plants(&state.pool, id).await?;
    Ok(Json(DataResponse { data: plants }))
}

// ---------------------------------------------------------------------------
// Creation and membership
// ---------------------------------------------------------------------------

/// POST /api/v1/facilities/{id}/harvests
///
/// Harvest active flowering plants: each leaves its tray, becomes
/// `harvested` and consumes its METRC tag.
pub async fn create_harvest(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Json(input): Json<CreateHarvest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_facility(&state, &auth, facility_id).await?;
    let harvest = HarvestRepo::create(&state.pool, facility_id, &input, Some(auth.user_id)).await?;

    tracing::info!(
        harvest_id = harvest.id,
        facility_id,
        plant_count = input.plant_ids.len(),
        user_id = auth.user_id,
        "Harvest created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: harvest })))
}

/// POST /api/v1/harvests/{id}/plants
pub async fn add_harvest_plants(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddHarvestPlants>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_harvest(&state, &auth, id).await?;
    let harvest = HarvestRepo::add_plants(&state.pool, id, &input.plant_ids, Some(auth.user_id)).await?;

    tracing::info!(
        harvest_id = id,
        plant_count = input.plant_ids.len(),
        user_id = auth.user_id,
        "Plants added to harvest",
    );

    Ok(Json(DataResponse { data: harvest }))
}

// ---------------------------------------------------------------------------
// Stage recording
// ---------------------------------------------------------------------------

/// POST /api/v1/harvests/{id}/wet-weight
pub async fn record_wet_weight(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RecordWetWeight>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let harvest =
        HarvestRepo::record_wet_weight(&state.pool, id, input.wet_weight_grams, Some(auth.user_id))
            .await?;

    tracing::info!(harvest_id = id, grams = input.wet_weight_grams, user_id = auth.user_id, "Wet weight recorded");

    Ok(Json(DataResponse { data: harvest }))
}

/// POST /api/v1/harvests/{id}/start-drying
pub async fn start_drying(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StartDrying>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    if let Some(room_id) = input.drying_room_id {
        load_room(&state, &auth, room_id).await?;
    }
    let harvest =
        HarvestRepo::start_drying(&state.pool, id, input.drying_room_id, Some(auth.user_id)).await?;

    tracing::info!(harvest_id = id, drying_room_id = ?input.drying_room_id, user_id = auth.user_id, "Drying started");

    Ok(Json(DataResponse { data: harvest }))
}

/// POST /api/v1/harvests/{id}/strain-weights
///
/// Record any subset of wet/dry/flower/shake/waste grams for one strain.
/// Stored values are kept for fields that are omitted.
pub async fn record_strain_weight(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RecordStrainWeight>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let weight = HarvestRepo::record_strain_weight(&state.pool, id, &input, Some(auth.user_id)).await?;

    tracing::info!(
        harvest_id = id,
        strain_id = input.strain_id,
        warnings = weight.warnings.len(),
        user_id = auth.user_id,
        "Strain weight recorded",
    );

    Ok(Json(DataResponse { data: weight }))
}

/// POST /api/v1/harvests/{id}/waste
///
/// Waste accumulates across calls and is allowed at any stage.
pub async fn record_waste(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RecordWaste>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_harvest(&state, &auth, id).await?;
    let harvest = HarvestRepo::record_waste(
        &state.pool,
        id,
        input.waste_weight_grams,
        input.notes,
        Some(auth.user_id),
    )
    .await?;

    tracing::info!(harvest_id = id, total_waste = harvest.waste_weight_grams, user_id = auth.user_id, "Waste recorded");

    Ok(Json(DataResponse { data: harvest }))
}

/// POST /api/v1/harvests/{id}/finish-drying
pub async fn finish_drying(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let harvest = HarvestRepo::finish_drying(&state.pool, id, Some(auth.user_id)).await?;

    tracing::info!(harvest_id = id, user_id = auth.user_id, "Drying finished");

    Ok(Json(DataResponse { data: harvest }))
}

/// POST /api/v1/harvests/{id}/start-trimming
pub async fn start_trimming(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let harvest = HarvestRepo::start_trimming(&state.pool, id, Some(auth.user_id)).await?;

    tracing::info!(harvest_id = id, user_id = auth.user_id, "Trimming started");

    Ok(Json(DataResponse { data: harvest }))
}

/// POST /api/v1/harvests/{id}/finish-trimming
pub async fn finish_trimming(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let harvest = HarvestRepo::finish_trimming(&state.pool, id, Some(auth.user_id)).await?;

    tracing::info!(harvest_id = id, user_id = auth.user_id, "Trimming finished");

    Ok(Json(DataResponse { data: harvest }))
}

/// POST /api/v1/harvests/{id}/finish-curing
pub async fn finish_curing(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &auth, id).await?;
    let harvest = HarvestRepo::finish_curing(&state.pool, id, Some(auth.user_id)).await?;

    tracing::info!(harvest_id = id, user_id = auth.user_id, "Curing finished");

    Ok(Json(DataResponse { data: harvest }))
}

// ---------------------------------------------------------------------------
// Review and notes
// ---------------------------------------------------------------------------

/// POST /api/v1/harvests/{id}/review
///
/// Admin only. A harvest can be reviewed once.
pub async fn mark_reviewed(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_harvest(&state, &admin, id).await?;
    let harvest = HarvestRepo::mark_reviewed(&state.pool, id, Some(admin.user_id)).await?;

    tracing::info!(harvest_id = id, user_id = admin.user_id, "Harvest reviewed");

    Ok(Json(DataResponse { data: harvest }))
}

/// POST /api/v1/harvests/{id}/notes
pub async fn add_harvest_note(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<HarvestNote>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_harvest(&state, &auth, id).await?;
    let event = HarvestRepo::add_note(&state.pool, id, &input.notes, Some(auth.user_id)).await?;

    tracing::info!(harvest_id = id, event_id = event.id, user_id = auth.user_id, "Harvest note added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}
