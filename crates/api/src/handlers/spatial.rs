//! Handlers for the spatial hierarchy: rooms, racks and trays.
//!
//! Layout changes are admin-only. Reads are open to every member of the
//! owning facility and always carry live occupancy figures.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::rack::CreateRack;
use canopy_db::models::room::{CreateRoom, RoomWithStats, UpdateRoom};
use canopy_db::models::tray::{CreateTray, UpdateTray};
use canopy_db::repositories::{RackRepo, RoomRepo, StatsRepo, TrayRepo};
use validator::Validate;

use super::{authorize_rack, authorize_tray, load_facility, load_room, not_found};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// GET /api/v1/facilities/{id}/rooms
pub async fn list_rooms(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let rooms = RoomRepo::list_by_facility(&state.pool, facility_id).await?;
    Ok(Json(DataResponse { data: rooms }))
}

/// POST /api/v1/facilities/{id}/rooms
pub async fn create_room(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Json(input): Json<CreateRoom>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_facility(&state, &admin, facility_id).await?;
    let room = RoomRepo::create(&state.pool, facility_id, &input).await?;

    tracing::info!(room_id = room.id, facility_id, user_id = admin.user_id, "Room created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: room })))
}

/// GET /api/v1/rooms/{id}
pub async fn get_room(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let room = load_room(&state, &auth, id).await?;
    let stats = StatsRepo::room_stats(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: RoomWithStats { room, stats },
    }))
}

/// PUT /api/v1/rooms/{id}
pub async fn update_room(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRoom>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_room(&state, &admin, id).await?;
    let room = RoomRepo::update(&state.pool, id, &input).await?;

    tracing::info!(room_id = id, user_id = admin.user_id, "Room updated");

    Ok(Json(DataResponse { data: room }))
}

// ---------------------------------------------------------------------------
// Racks
// ---------------------------------------------------------------------------

/// GET /api/v1/rooms/{id}/racks
pub async fn list_racks(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_room(&state, &auth, room_id).await?;
    let racks = StatsRepo::racks_with_stats(&state.pool, room_id).await?;
    Ok(Json(DataResponse { data: racks }))
}

/// POST /api/v1/rooms/{id}/racks
pub async fn create_rack(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(room_id): Path<DbId>,
    Json(input): Json<CreateRack>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_room(&state, &admin, room_id).await?;
    let rack = RackRepo::create(&state.pool, room_id, &input).await?;

    tracing::info!(rack_id = rack.id, room_id, user_id = admin.user_id, "Rack created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: rack })))
}

// ---------------------------------------------------------------------------
// Trays
// ---------------------------------------------------------------------------

/// GET /api/v1/racks/{id}/trays
pub async fn list_trays(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(rack_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize_rack(&state, &auth, rack_id).await?;
    let trays = TrayRepo::list_by_rack(&state.pool, rack_id).await?;
    Ok(Json(DataResponse { data: trays }))
}

/// POST /api/v1/racks/{id}/trays
pub async fn create_tray(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(rack_id): Path<DbId>,
    Json(input): Json<CreateTray>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    authorize_rack(&state, &admin, rack_id).await?;
    let tray = TrayRepo::create(&state.pool, rack_id, &input).await?;

    tracing::info!(tray_id = tray.id, rack_id, user_id = admin.user_id, "Tray created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: tray })))
}

/// GET /api/v1/trays/{id}
pub async fn get_tray(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize_tray(&state, &auth, id).await?;
    let tray = TrayRepo::find_view(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("tray", id))?;
    Ok(Json(DataResponse { data: tray }))
}

/// PUT /api/v1/trays/{id}
///
/// Lowering capacity below the current occupancy fails with
/// `CAPACITY_EXCEEDED`.
pub async fn update_tray(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTray>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    authorize_tray(&state, &admin, id).await?;
    let tray = TrayRepo::update(&state.pool, id, &input).await?;

    tracing::info!(tray_id = id, capacity = tray.tray.capacity, user_id = admin.user_id, "Tray updated");

    Ok(Json(DataResponse { data: tray }))
}
