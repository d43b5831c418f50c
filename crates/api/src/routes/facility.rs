//! Route definitions for facilities and everything scoped to one.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{audit, batch, facility, harvest, metrc_tag, plant, spatial, strain};
use crate::state::AppState;

/// Facility routes mounted at `/facilities`.
///
/// ```text
/// GET    /                          -> list_facilities
/// POST   /                          -> create_facility (admin)
/// GET    /{id}                      -> get_facility
/// PUT    /{id}                      -> update_facility (admin)
/// GET    /{id}/stats                -> facility_stats
/// GET    /{id}/rooms                -> list_rooms
/// POST   /{id}/rooms                -> create_room (admin)
/// GET    /{id}/strains              -> list_strains
/// POST   /{id}/strains              -> create_strain
/// GET    /{id}/plants               -> list_plants
/// GET    /{id}/plants/lookup        -> lookup_plant
/// GET    /{id}/tags                 -> list_tags
/// GET    /{id}/tags/counts          -> tag_counts
/// POST   /{id}/tags/import          -> import_tags
/// POST   /{id}/tags/{tag}/void      -> void_tag
/// GET    /{id}/batches              -> list_batches
/// POST   /{id}/batches              -> create_batch
/// GET    /{id}/harvests             -> list_harvests
/// POST   /{id}/harvests             -> create_harvest
/// GET    /{id}/flower-inventory     -> flower_inventory
/// GET    /{id}/audit                -> list_audit_events
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(facility::list_facilities).post(facility::create_facility),
        )
        .route(
            "/{id}",
            get(facility::get_facility).put(facility::update_facility),
        )
        .route("/{id}/stats", get(facility::facility_stats))
        .route(
            "/{id}/rooms",
            get(spatial::list_rooms).post(spatial::create_room),
        )
        .route(
            "/{id}/strains",
            get(strain::list_strains).post(strain::create_strain),
        )
        .route("/{id}/plants", get(plant::list_plants))
        .route("/{id}/plants/lookup", get(plant::lookup_plant))
        .route("/{id}/tags", get(metrc_tag::list_tags))
        .route("/{id}/tags/counts", get(metrc_tag::tag_counts))
        .route("/{id}/tags/import", post(metrc_tag::import_tags))
        .route("/{id}/tags/{tag}/void", post(metrc_tag::void_tag))
        .route(
            "/{id}/batches",
            get(batch::list_batches).post(batch::create_batch),
        )
        .route(
            "/{id}/harvests",
            get(harvest::list_harvests).post(harvest::create_harvest),
        )
        .route("/{id}/flower-inventory", get(harvest::flower_inventory))
        .route("/{id}/audit", get(audit::list_audit_events))
}
