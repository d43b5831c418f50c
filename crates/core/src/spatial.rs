//! Facility -> Room -> Rack -> Tray capacity model.
//!
//! Occupancy is never stored. Callers load the live tray list (capacity plus
//! the count of active plants referencing each tray) and every aggregate in
//! this module is recomputed from that list, so a room view cannot drift from
//! the plants it contains.

use serde::Serialize;

use crate::error::{CoreError, GrowError};
use crate::plant::PlantStatus;
use crate::types::DbId;

text_enum! {
    /// Purpose of a room within the facility.
    RoomType as "room type" {
        Mother => "mother",
        Clone => "clone",
        Veg => "veg",
        Flower => "flower",
        Dry => "dry",
        Cure => "cure",
        Processing => "processing",
        Storage => "storage",
    }
}

// ---------------------------------------------------------------------------
// Structural validation
// ---------------------------------------------------------------------------

/// Validate room grid dimensions. All three values are advisory for layout but
/// must be positive.
pub fn validate_room_dimensions(rows: i32, cols: i32, floor_count: i32) -> Result<(), CoreError> {
    if rows < 1 || cols < 1 {
        return Err(CoreError::Validation(format!(
            "Room grid must be at least 1x1, got {rows}x{cols}"
        )));
    }
    if floor_count < 1 {
        return Err(CoreError::Validation(format!(
            "floor_count must be at least 1, got {floor_count}"
        )));
    }
    Ok(())
}

/// Validate that a rack floor is within `1..=floor_count`.
pub fn validate_rack_floor(floor: i32, floor_count: i32) -> Result<(), CoreError> {
    if floor < 1 || floor > floor_count {
        return Err(CoreError::Validation(format!(
            "Rack floor {floor} is outside the room's floors 1..={floor_count}"
        )));
    }
    Ok(())
}

/// Validate a new `floor_count` against the highest floor already holding a rack.
pub fn validate_floor_count_change(
    new_floor_count: i32,
    highest_used_floor: Option<i32>,
) -> Result<(), CoreError> {
    if let Some(highest) = highest_used_floor {
        if new_floor_count < highest {
            return Err(CoreError::Conflict(format!(
                "Cannot reduce floor_count to {new_floor_count}: a rack exists on floor {highest}"
            )));
        }
    }
    Ok(())
}

/// Validate a tray capacity (max simultaneous plants).
pub fn validate_tray_capacity(capacity: i32) -> Result<(), CoreError> {
    if capacity < 1 {
        return Err(CoreError::Validation(format!(
            "Tray capacity must be a positive integer, got {capacity}"
        )));
    }
    Ok(())
}

/// Validate a tray capacity change against the tray's live occupancy.
pub fn validate_capacity_change(
    tray_id: DbId,
    new_capacity: i32,
    occupancy: i64,
) -> Result<(), GrowError> {
    if i64::from(new_capacity) < occupancy {
        return Err(GrowError::CapacityExceeded {
            tray_id,
            capacity: new_capacity,
            occupancy,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Display names
// ---------------------------------------------------------------------------

fn display_name(kind: &str, name: Option<&str>, position: i32) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => format!("{kind} {}", position + 1),
    }
}

/// A rack's name, falling back to `Rack {position+1}`.
pub fn rack_display_name(name: Option<&str>, position: i32) -> String {
    display_name("Rack", name, position)
}

/// A tray's name, falling back to `Tray {position+1}`.
pub fn tray_display_name(name: Option<&str>, position: i32) -> String {
    display_name("Tray", name, position)
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

/// Where a plant sits and whether it still counts toward occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantPlacement {
    pub tray_id: Option<DbId>,
    pub status: PlantStatus,
}

/// Count the active plants referencing `tray_id`.
pub fn occupancy_of(tray_id: DbId, plants: &[PlantPlacement]) -> i64 {
    plants
        .iter()
        .filter(|p| p.status == PlantStatus::Active && p.tray_id == Some(tray_id))
        .count() as i64
}

/// Whether one more plant fits.
pub fn can_place(occupancy: i64, capacity: i32) -> bool {
    occupancy < i64::from(capacity)
}

/// Fail with [`GrowError::CapacityExceeded`] when the tray has no free slot.
pub fn ensure_capacity(tray_id: DbId, occupancy: i64, capacity: i32) -> Result<(), GrowError> {
    if can_place(occupancy, capacity) {
        Ok(())
    } else {
        Err(GrowError::CapacityExceeded {
            tray_id,
            capacity,
            occupancy,
        })
    }
}

/// Capacity and live occupancy of one tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrayOccupancy {
    pub tray_id: DbId,
    pub capacity: i32,
    pub occupancy: i64,
}

impl TrayOccupancy {
    pub fn is_full(&self) -> bool {
        !can_place(self.occupancy, self.capacity)
    }

    pub fn available_slots(&self) -> i64 {
        (i64::from(self.capacity) - self.occupancy).max(0)
    }

    pub fn ensure_can_place(&self) -> Result<(), GrowError> {
        ensure_capacity(self.tray_id, self.occupancy, self.capacity)
    }
}

/// Capacity/occupancy aggregate for any level of the hierarchy.
///
/// A "zone" is one tray.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OccupancyStats {
    pub total_capacity: i64,
    pub active_plant_count: i64,
    pub occupied_zone_count: i64,
    pub total_zone_count: i64,
    pub utilization_pct: f64,
}

impl OccupancyStats {
    /// Aggregate a set of trays.
    pub fn from_trays<'a, I>(trays: I) -> Self
    where
        I: IntoIterator<Item = &'a TrayOccupancy>,
    {
        let mut stats = OccupancyStats::default();
        for tray in trays {
            stats.total_capacity += i64::from(tray.capacity);
            stats.active_plant_count += tray.occupancy;
            stats.total_zone_count += 1;
            if tray.occupancy > 0 {
                stats.occupied_zone_count += 1;
            }
        }
        stats.utilization_pct = utilization_pct(stats.active_plant_count, stats.total_capacity);
        stats
    }

    /// Combine child aggregates (racks into a room, rooms into a facility).
    pub fn combine<'a, I>(children: I) -> Self
    where
        I: IntoIterator<Item = &'a OccupancyStats>,
    {
        let mut stats = OccupancyStats::default();
        for child in children {
            stats.total_capacity += child.total_capacity;
            stats.active_plant_count += child.active_plant_count;
            stats.occupied_zone_count += child.occupied_zone_count;
            stats.total_zone_count += child.total_zone_count;
        }
        stats.utilization_pct = utilization_pct(stats.active_plant_count, stats.total_capacity);
        stats
    }

    /// No free slot remains in any tray.
    pub fn is_full(&self) -> bool {
        self.active_plant_count >= self.total_capacity
    }
}

/// Room-level aggregate over all descendant trays.
pub fn room_stats(trays: &[TrayOccupancy]) -> OccupancyStats {
    OccupancyStats::from_trays(trays)
}

/// Percentage of capacity in use, rounded to one decimal place.
pub fn utilization_pct(active: i64, capacity: i64) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    (active as f64 / capacity as f64 * 1000.0).round() / 10.0
}
