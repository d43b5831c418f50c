//! Handler for the facility audit feed.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use canopy_core::types::DbId;
use canopy_db::models::audit::{AuditEventView, AuditListParams};
use canopy_db::repositories::AuditRepo;

use super::load_facility;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::{DataResponse, Page};
use crate::state::AppState;

/// GET /api/v1/facilities/{id}/audit
///
/// Newest first. Narrow to one entity with `trackable_type` and
/// `trackable_id`. Each event carries a rendered `label` and `detail`.
pub async fn list_audit_events(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(facility_id): Path<DbId>,
    Query(params): Query<AuditListParams>,
) -> AppResult<impl IntoResponse> {
    load_facility(&state, &auth, facility_id).await?;
    let events = AuditRepo::list(&state.pool, facility_id, &params).await?;
    let total_count = AuditRepo::count(&state.pool, facility_id, &params).await?;

    let items: Vec<AuditEventView> = events.into_iter().map(AuditEventView::from).collect();

    Ok(Json(DataResponse {
        data: Page { items, total_count },
    }))
}
