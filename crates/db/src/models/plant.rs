//! Plant model and DTOs.

use canopy_core::plant::{GrowthPhase, PlantStatus, RetireStatus};
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `plants` table.
///
/// `tray_id` is set exactly when `status` is `active`; `metrc_label` mirrors
/// the tag currently bound to this plant in `metrc_tags`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Plant {
    pub id: DbId,
    pub facility_id: DbId,
    pub plant_uid: String,
    pub strain_id: DbId,
    #[sqlx(try_from = "String")]
    pub growth_phase: GrowthPhase,
    #[sqlx(try_from = "String")]
    pub status: PlantStatus,
    pub tray_id: Option<DbId>,
    pub plant_batch_id: Option<DbId>,
    pub metrc_label: Option<String>,
    pub placed_by: Option<DbId>,
    pub status_reason: Option<String>,
    pub status_changed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePlant {
    #[validate(range(min = 1))]
    pub tray_id: DbId,
    #[validate(range(min = 1))]
    pub strain_id: DbId,
    /// Set once here; immutable afterwards.
    #[validate(range(min = 1))]
    pub plant_batch_id: Option<DbId>,
    /// Defaults to `immature`.
    pub growth_phase: Option<GrowthPhase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovePlant {
    pub tray_id: DbId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePhase {
    pub growth_phase: GrowthPhase,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TagPlant {
    #[validate(length(min = 1, max = 64))]
    pub tag: String,
    /// Supersede the plant's current tag instead of failing.
    #[serde(default)]
    pub reassign: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RetirePlant {
    pub status: RetireStatus,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

/// Quick entry: one plant per tag suffix, each created and tagged on its own.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuickEntry {
    #[validate(range(min = 1))]
    pub tray_id: DbId,
    #[validate(range(min = 1))]
    pub strain_id: DbId,
    #[validate(length(max = 64))]
    pub tag_prefix: String,
    #[validate(length(min = 1, max = 500))]
    pub suffixes: Vec<String>,
    pub growth_phase: Option<GrowthPhase>,
    #[validate(range(min = 1))]
    pub plant_batch_id: Option<DbId>,
}

/// Query filters for listing a facility's plants.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlantListParams {
    pub status: Option<PlantStatus>,
    pub growth_phase: Option<GrowthPhase>,
    pub room_id: Option<DbId>,
    pub tray_id: Option<DbId>,
    pub strain_id: Option<DbId>,
    pub plant_batch_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Result of a move request.
#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub plant: Plant,
    /// `false` when the plant was already in the target tray.
    pub moved: bool,
}
