//! Handlers for the facility's METRC tag registry.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::metrc_tag::{ImportTags, TagListParams};
use canopy_db::repositories::MetrcTagRepo;
use validator::Validate;

use super::load_facility;
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireGrower};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/facilities/{id}/tags?status=
pub async fn list_tags(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Query(params): Query<TagListParams>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let tags = MetrcTagRepo::list(&state.pool, facility_id, &params).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// GET /api/v1/facilities/{id}/tags/counts
pub async fn tag_counts(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let counts = MetrcTagRepo::counts(&state.pool, facility_id).await?;
    Ok(Json(DataResponse { data: counts }))
}

/// POST /api/v1/facilities/{id}/tags/import
///
/// Register a batch of tags as `available`. Each tag is accepted or
/// rejected on its own; the report lists both.
pub async fn import_tags(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Json(input): Json<ImportTags>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_facility(&state, &auth, facility_id).await?;
    let report = MetrcTagRepo::import(&state.pool, facility_id, &input.tags, Some(auth.user_id)).await?;

    tracing::info!(
        facility_id,
        inserted = report.inserted_count,
        rejected = report.rejected_count,
        user_id = auth.user_id,
        "METRC tags imported",
    );

    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/facilities/{id}/tags/{tag}/void
pub async fn void_tag(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path((facility_id, tag)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let voided = MetrcTagRepo::void(&state.pool, facility_id, &tag).await?;

    tracing::info!(facility_id, tag = %voided.tag, user_id = auth.user_id, "METRC tag voided");

    Ok(Json(DataResponse { data: voided }))
}
