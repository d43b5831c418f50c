use axum::routing::{get, put};
use axum::Router;

use crate::handlers::batch;
use crate::state::AppState;

/// Batch routes mounted at `/batches`.
///
/// ```text
/// GET    /{id}           -> get_batch
/// GET    /{id}/plants    -> list_batch_plants
/// PUT    /{id}/notes     -> update_batch_notes
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(batch::get_batch))
        .route("/{id}/plants", get(batch::list_batch_plants))
        .route("/{id}/notes", put(batch::update_batch_notes))
}
