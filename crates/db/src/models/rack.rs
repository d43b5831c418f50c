//! Rack model and DTOs.

use canopy_core::spatial::{rack_display_name, OccupancyStats};
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `racks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Rack {
    pub id: DbId,
    pub room_id: DbId,
    /// 1-indexed, at most the room's `floor_count`.
    pub floor: i32,
    /// Ordering within the floor, 0-based.
    pub position: i32,
    pub name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Rack {
    pub fn display_name(&self) -> String {
        rack_display_name(self.name.as_deref(), self.position)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRack {
    /// Defaults to the ground floor.
    #[validate(range(min = 1))]
    pub floor: Option<i32>,
    #[validate(range(min = 0))]
    pub position: i32,
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// A rack as listed for a room: display name and live occupancy.
#[derive(Debug, Clone, Serialize)]
pub struct RackView {
    #[serde(flatten)]
    pub rack: Rack,
    pub display_name: String,
    pub stats: OccupancyStats,
}
