//! Route definitions for the harvest workflow.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::harvest;
use crate::state::AppState;

/// Harvest routes mounted at `/harvests`.
///
/// ```text
/// GET    /{id}                    -> get_harvest (detail)
/// GET    /{id}/plants             -> list_harvest_plants
/// POST   /{id}/plants             -> add_harvest_plants
/// POST   /{id}/wet-weight         -> record_wet_weight
/// POST   /{id}/start-drying       -> start_drying
/// POST   /{id}/strain-weights     -> record_strain_weight
/// POST   /{id}/waste              -> record_waste
/// POST   /{id}/finish-drying      -> finish_drying
/// POST   /{id}/start-trimming     -> start_trimming
/// POST   /{id}/finish-trimming    -> finish_trimming
/// POST   /{id}/finish-curing      -> finish_curing
/// POST   /{id}/review             -> mark_reviewed (admin)
/// POST   /{id}/notes              -> add_harvest_note
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(harvest::get_harvest))
        .route(
            "/{id}/plants",
            get(harvest::list_harvest_plants).post(harvest::add_harvest_plants),
        )
        .route("/{id}/wet-weight", post(harvest::record_wet_weight))
        .route("/{id}/start-drying", post(harvest::start_drying))
        .route("/{id}/strain-weights", post(harvest::record_strain_weight))
        .route("/{id}/waste", post(harvest::record_waste))
        .route("/{id}/finish-drying", post(harvest::finish_drying))
        .route("/{id}/start-trimming", post(harvest::start_trimming))
        .route("/{id}/finish-trimming", post(harvest::finish_trimming))
        .route("/{id}/finish-curing", post(harvest::finish_curing))
        .route("/{id}/review", post(harvest::mark_reviewed))
        .route("/{id}/notes", post(harvest::add_harvest_note))
}
