//! Plant observation log entries.

use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `plant_events` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlantEvent {
    pub id: DbId,
    pub plant_id: DbId,
    pub notes: Option<String>,
    pub photo_urls: Vec<String>,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateObservation {
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub photo_urls: Vec<String>,
}
