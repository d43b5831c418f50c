//! Plant batch model and DTOs.

use canopy_core::batch::BatchType;
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `plant_batches` table. `initial_count` never changes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlantBatch {
    pub id: DbId,
    pub facility_id: DbId,
    pub batch_uid: String,
    pub name: Option<String>,
    #[sqlx(try_from = "String")]
    pub batch_type: BatchType,
    pub strain_id: DbId,
    pub initial_count: i32,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A batch with its member count derived at read time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BatchSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub batch: PlantBatch,
    pub active_plant_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBatch {
    #[validate(length(max = 200))]
    pub name: Option<String>,
    pub batch_type: BatchType,
    pub strain_id: DbId,
    #[validate(length(min = 1, max = 1000))]
    pub plant_ids: Vec<DbId>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBatchNotes {
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}
