//! Room model and DTOs.

use canopy_core::spatial::{OccupancyStats, RoomType};
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `rooms` table.
///
/// `rows`/`cols` describe the advisory layout grid; `floor_count` bounds the
/// floors racks may sit on.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub facility_id: DbId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub room_type: RoomType,
    pub rows: i32,
    pub cols: i32,
    pub floor_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoom {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub room_type: RoomType,
    #[validate(range(min = 1))]
    pub rows: Option<i32>,
    #[validate(range(min = 1))]
    pub cols: Option<i32>,
    #[validate(range(min = 1))]
    pub floor_count: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoom {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub room_type: Option<RoomType>,
    #[validate(range(min = 1))]
    pub rows: Option<i32>,
    #[validate(range(min = 1))]
    pub cols: Option<i32>,
    #[validate(range(min = 1))]
    pub floor_count: Option<i32>,
}

/// A room with its live occupancy aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct RoomWithStats {
    #[serde(flatten)]
    pub room: Room,
    pub stats: OccupancyStats,
}
