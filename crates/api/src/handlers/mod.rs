//! HTTP handlers, one module per resource.
//!
//! Every entity belongs to exactly one facility. The loaders below fetch the
//! entity (404 when missing) and check that the caller may see its facility
//! (403 otherwise) before a handler touches it.

pub mod audit;
pub mod batch;
pub mod facility;
pub mod harvest;
pub mod metrc_tag;
pub mod photos;
pub mod plant;
pub mod spatial;
pub mod strain;

use canopy_core::error::{CoreError, GrowError};
use canopy_core::types::DbId;
use canopy_db::models::batch::BatchSummary;
use canopy_db::models::facility::Facility;
use canopy_db::models::harvest::Harvest;
use canopy_db::models::plant::Plant;
use canopy_db::models::room::Room;
use canopy_db::repositories::{
    BatchRepo, FacilityRepo, HarvestRepo, PlantRepo, RackRepo, RoomRepo, TrayRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub(crate) fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

pub(crate) async fn load_facility(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
) -> AppResult<Facility> {
    auth.ensure_facility(id)?;
    FacilityRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("facility", id))
}

pub(crate) async fn load_room(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Room> {
    let room = RoomRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("room", id))?;
    auth.ensure_facility(room.facility_id)?;
    Ok(room)
}

/// Check access to a rack, returning its facility.
pub(crate) async fn authorize_rack(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<DbId> {
    let facility_id = RackRepo::facility_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("rack", id))?;
    auth.ensure_facility(facility_id)?;
    Ok(facility_id)
}

/// Check access to a tray, returning its facility.
pub(crate) async fn authorize_tray(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<DbId> {
    let facility_id = TrayRepo::facility_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("tray", id))?;
    auth.ensure_facility(facility_id)?;
    Ok(facility_id)
}

pub(crate) async fn load_plant(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Plant> {
    let plant = PlantRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Grow(GrowError::PlantNotFound(id.to_string())))?;
    auth.ensure_facility(plant.facility_id)?;
    Ok(plant)
}

pub(crate) async fn load_batch(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
) -> AppResult<BatchSummary> {
    let batch = BatchRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("batch", id))?;
    auth.ensure_facility(batch.batch.facility_id)?;
    Ok(batch)
}

pub(crate) async fn load_harvest(
    state: &AppState,
    auth: &AuthUser,
    id: DbId,
) -> AppResult<Harvest> {
    let harvest = HarvestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("harvest", id))?;
    auth.ensure_facility(harvest.facility_id)?;
    Ok(harvest)
}
