//! Route definitions for plants and their observations.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::plant;
use crate::state::AppState;

/// Plant routes mounted at `/plants`.
///
/// ```text
/// POST   /                       -> create_plant
/// POST   /quick-entry            -> quick_entry
/// GET    /{id}                   -> get_plant
/// POST   /{id}/move              -> move_plant
/// POST   /{id}/phase             -> change_phase
/// POST   /{id}/tag               -> tag_plant
/// POST   /{id}/retire            -> retire_plant
/// GET    /{id}/observations      -> list_observations
/// POST   /{id}/observations      -> add_observation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(plant::create_plant))
        .route("/quick-entry", post(plant::quick_entry))
        .route("/{id}", get(plant::get_plant))
        .route("/{id}/move", post(plant::move_plant))
        .route("/{id}/phase", post(plant::change_phase))
        .route("/{id}/tag", post(plant::tag_plant))
        .route("/{id}/retire", post(plant::retire_plant))
        .route(
            "/{id}/observations",
            get(plant::list_observations).post(plant::add_observation),
        )
}
