//! Handlers for plant batches.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::batch::{CreateBatch, UpdateBatchNotes};
use canopy_db::repositories::{BatchRepo, PlantRepo};
use validator::Validate;

use super::{load_batch, load_facility, not_found};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireGrower};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/facilities/{id}/batches
pub async fn list_batches(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let batches = BatchRepo::list(&state.pool, facility_id, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: batches }))
}

/// POST /api/v1/facilities/{id}/batches
///
/// Group existing plants. A plant can only belong to one batch.
pub async fn create_batch(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Json(input): Json<CreateBatch>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_facility(&state, &auth, facility_id).await?;
    let batch = BatchRepo::create(&state.pool, facility_id, &input, Some(auth.user_id)).await?;

    tracing::info!(
        batch_id = batch.batch.id,
        plant_count = input.plant_ids.len(),
        user_id = auth.user_id,
        "Batch created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: batch })))
}

/// GET /api/v1/batches/{id}
pub async fn get_batch(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let batch = load_batch(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: batch }))
}

/// GET /api/v1/batches/{id}/plants
pub async fn list_batch_plants(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_batch(&state, &auth, id).await?;
    let plants = PlantRepo::list_by_batch(&state.pool, id).await?;
    Ok(Json(DataResponse { data: plants }))
}

/// PUT /api/v1/batches/{id}/notes
pub async fn update_batch_notes(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBatchNotes>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_batch(&state, &auth, id).await?;
    let batch = BatchRepo::update_notes(&state.pool, id, input.notes.as_deref())
        .await?
        .ok_or_else(|| not_found("batch", id))?;

    tracing::info!(batch_id = id, user_id = auth.user_id, "Batch notes updated");

    Ok(Json(DataResponse { data: batch }))
}
