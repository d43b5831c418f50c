//! Handlers for the strain catalog.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::strain::CreateStrain;
use canopy_db::repositories::StrainRepo;
use validator::Validate;

use super::{load_facility, not_found};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireGrower};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/facilities/{id}/strains
pub async fn list_strains(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let strains = StrainRepo::list_by_facility(&state.pool, facility_id).await?;
    Ok(Json(DataResponse { data: strains }))
}

/// POST /api/v1/facilities/{id}/strains
pub async fn create_strain(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Json(input): Json<CreateStrain>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    load_facility(&state, &auth, facility_id).await?;
    let strain = StrainRepo::create(&state.pool, facility_id, &input).await?;

    tracing::info!(strain_id = strain.id, facility_id, user_id = auth.user_id, "Strain created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: strain })))
}

/// GET /api/v1/strains/{id}
pub async fn get_strain(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let strain = StrainRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("strain", id))?;
    auth.ensure_facility(strain.facility_id)?;
    Ok(Json(DataResponse { data: strain }))
}
