//! Route definitions for rooms, racks and trays.

use axum::routing::get;
use axum::Router;

use crate::handlers::spatial;
use crate::state::AppState;

/// Room routes mounted at `/rooms`.
///
/// ```text
/// GET    /{id}          -> get_room (with stats)
/// PUT    /{id}          -> update_room (admin)
/// GET    /{id}/racks    -> list_racks (with stats)
/// POST   /{id}/racks    -> create_rack (admin)
/// ```
pub fn rooms_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(spatial::get_room).put(spatial::update_room))
        .route(
            "/{id}/racks",
            get(spatial::list_racks).post(spatial::create_rack),
        )
}

/// Rack routes mounted at `/racks`.
///
/// ```text
/// GET    /{id}/trays    -> list_trays
/// POST   /{id}/trays    -> create_tray (admin)
/// ```
pub fn racks_router() -> Router<AppState> {
    Router::new().route(
        "/{id}/trays",
        get(spatial::list_trays).post(spatial::create_tray),
    )
}

/// Tray routes mounted at `/trays`.
///
/// ```text
/// GET    /{id}    -> get_tray
/// PUT    /{id}    -> update_tray (admin)
/// ```
pub fn trays_router() -> Router<AppState> {
    Router::new().route("/{id}", get(spatial::get_tray).put(spatial::update_tray))
}
