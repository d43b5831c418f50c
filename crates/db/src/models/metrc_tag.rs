//! METRC tag registry rows and DTOs.

use canopy_core::metrc::TagStatus;
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `metrc_tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MetrcTag {
    pub id: DbId,
    pub facility_id: DbId,
    pub tag: String,
    #[sqlx(try_from = "String")]
    pub status: TagStatus,
    /// `consumed` or `superseded`; set only when `status` is `used`.
    pub used_reason: Option<String>,
    pub plant_id: Option<DbId>,
    pub assigned_by: Option<DbId>,
    pub assigned_at: Option<Timestamp>,
    pub used_at: Option<Timestamp>,
    pub voided_at: Option<Timestamp>,
    pub imported_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImportTags {
    #[validate(length(min = 1, max = 5000))]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagListParams {
    pub status: Option<TagStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Number of tags per status in a facility's registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagCounts {
    pub available: i64,
    pub assigned: i64,
    pub used: i64,
    pub voided: i64,
}

impl TagCounts {
    pub fn total(&self) -> i64 {
        self.available + self.assigned + self.used + self.voided
    }
}
