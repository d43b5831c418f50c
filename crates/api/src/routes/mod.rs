pub mod batch;
pub mod facility;
pub mod harvest;
pub mod health;
pub mod photos;
pub mod plant;
pub mod spatial;
pub mod strain;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /facilities                                   list, create (admin)
/// /facilities/{id}                              get, update (admin)
/// /facilities/{id}/stats                        occupancy roll-up
/// /facilities/{id}/rooms                        list, create (admin)
/// /facilities/{id}/strains                      list, create
/// /facilities/{id}/plants                       list (filters, total count)
/// /facilities/{id}/plants/lookup                lookup by uid or METRC label
/// /facilities/{id}/tags                         list by status
/// /facilities/{id}/tags/counts                  per-status counts
/// /facilities/{id}/tags/import                  bulk import (POST)
/// /facilities/{id}/tags/{tag}/void              void an available tag (POST)
/// /facilities/{id}/batches                      list, create
/// /facilities/{id}/harvests                     list, create
/// /facilities/{id}/flower-inventory             flower/shake per strain
/// /facilities/{id}/audit                        audit feed
///
/// /rooms/{id}                                   get (with stats), update (admin)
/// /rooms/{id}/racks                             list (with stats), create (admin)
/// /racks/{id}/trays                             list, create (admin)
/// /trays/{id}                                   get, update capacity (admin)
///
/// /strains/{id}                                 get
///
/// /plants                                       create (POST)
/// /plants/quick-entry                           bulk create + tag (POST)
/// /plants/{id}                                  get
/// /plants/{id}/move                             move to tray (POST)
/// /plants/{id}/phase                            change growth phase (POST)
/// /plants/{id}/tag                              assign METRC tag (POST)
/// /plants/{id}/retire                           destroy or remove (POST)
/// /plants/{id}/observations                     list, add
///
/// /batches/{id}                                 get
/// /batches/{id}/plants                          members
/// /batches/{id}/notes                           update notes (PUT)
///
/// /harvests/{id}                                detail
/// /harvests/{id}/plants                         list, add
/// /harvests/{id}/wet-weight                     record (POST)
/// /harvests/{id}/start-drying                   (POST)
/// /harvests/{id}/strain-weights                 record per strain (POST)
/// /harvests/{id}/waste                          record (POST)
/// /harvests/{id}/finish-drying                  (POST)
/// /harvests/{id}/start-trimming                 (POST)
/// /harvests/{id}/finish-trimming                (POST)
/// /harvests/{id}/finish-curing                  (POST)
/// /harvests/{id}/review                         mark reviewed (admin, POST)
/// /harvests/{id}/notes                          add note (POST)
///
/// /photos                                       multipart upload (POST)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/facilities", facility::router())
        .nest("/rooms", spatial::rooms_router())
        .nest("/racks", spatial::racks_router())
        .nest("/trays", spatial::trays_router())
        .nest("/strains", strain::router())
        .nest("/plants", plant::router())
        .nest("/batches", batch::router())
        .nest("/harvests", harvest::router())
        .nest("/photos", photos::router(config.photos.max_bytes))
}
