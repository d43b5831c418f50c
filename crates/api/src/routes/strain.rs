use axum::routing::get;
use axum::Router;

use crate::handlers::strain;
use crate::state::AppState;

/// Strain routes mounted at `/strains`.
///
/// ```text
/// GET    /{id}    -> get_strain
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(strain::get_strain))
}
