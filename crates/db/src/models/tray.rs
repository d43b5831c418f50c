//! Tray model, DTOs and occupancy rows.

use canopy_core::spatial::{tray_display_name, TrayOccupancy};
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `trays` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tray {
    pub id: DbId,
    pub rack_id: DbId,
    pub position: i32,
    /// Maximum number of simultaneously active plants.
    pub capacity: i32,
    pub name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tray {
    pub fn display_name(&self) -> String {
        tray_display_name(self.name.as_deref(), self.position)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTray {
    #[validate(range(min = 0))]
    pub position: i32,
    #[validate(range(min = 1))]
    pub capacity: i32,
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTray {
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// Live occupancy of one tray together with its place in the hierarchy.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct TrayOccupancyRow {
    pub tray_id: DbId,
    pub rack_id: DbId,
    pub room_id: DbId,
    pub capacity: i32,
    pub occupancy: i64,
}

impl TrayOccupancyRow {
    pub fn occupancy(&self) -> TrayOccupancy {
        TrayOccupancy {
            tray_id: self.tray_id,
            capacity: self.capacity,
            occupancy: self.occupancy,
        }
    }
}

/// A tray as shown to clients: display name and live slot counts.
#[derive(Debug, Clone, Serialize)]
pub struct TrayView {
    #[serde(flatten)]
    pub tray: Tray,
    pub display_name: String,
    pub occupancy: i64,
    pub available_slots: i64,
    pub is_full: bool,
}

impl TrayView {
    pub fn new(tray: Tray, occupancy: i64) -> Self {
        let live = TrayOccupancy {
            tray_id: tray.id,
            capacity: tray.capacity,
            occupancy,
        };
        Self {
            display_name: tray.display_name(),
            occupancy,
            available_slots: live.available_slots(),
            is_full: live.is_full(),
            tray,
        }
    }
}
