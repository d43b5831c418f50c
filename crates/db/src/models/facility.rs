//! Facility model and DTOs.

use canopy_core::spatial::OccupancyStats;
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `facilities` table. One per tenant.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Facility {
    pub id: DbId,
    pub name: String,
    pub license_number: Option<String>,
    /// Floor layout metadata owned by the UI.
    pub layout: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFacility {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub license_number: Option<String>,
    pub layout: Option<serde_json::Value>,
}

/// All fields optional; only non-`None` values are applied.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateFacility {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub license_number: Option<String>,
    pub layout: Option<serde_json::Value>,
}

/// Occupancy of one room, as part of a facility breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct RoomOccupancy {
    pub room_id: DbId,
    pub room_name: String,
    pub stats: OccupancyStats,
}

/// Facility-wide occupancy plus the per-room breakdown it was combined from.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityStats {
    pub facility_id: DbId,
    pub stats: OccupancyStats,
    pub rooms: Vec<RoomOccupancy>,
}
