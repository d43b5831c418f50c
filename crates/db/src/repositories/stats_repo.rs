//! Occupancy aggregates for every level of the spatial hierarchy.
//!
//! Nothing here is cached: each call counts active plants from live rows and
//! folds them with the pure aggregation in `canopy_core::spatial`.

use std::collections::HashMap;

use canopy_core::spatial::{OccupancyStats, TrayOccupancy};
use canopy_core::types::DbId;
use sqlx::PgPool;

use crate::models::facility::{FacilityStats, RoomOccupancy};
use crate::models::rack::RackView;
use crate::models::tray::TrayOccupancyRow;
use crate::repositories::{RackRepo, RoomRepo};

/// Per-tray occupancy; callers append a `WHERE` on `rm`, `r` or `t`.
const TRAY_OCCUPANCY_SELECT: &str = "\
    SELECT t.id AS tray_id, t.rack_id, r.room_id, t.capacity, COUNT(p.id) AS occupancy \
    FROM trays t \
    JOIN racks r ON r.id = t.rack_id \
    JOIN rooms rm ON rm.id = r.room_id \
    LEFT JOIN plants p ON p.tray_id = t.id AND p.status = 'active'";

const TRAY_OCCUPANCY_GROUP: &str = "GROUP BY t.id, r.room_id ORDER BY t.id";

/// Read-side occupancy queries.
pub struct StatsRepo;

impl StatsRepo {
    /// Occupancy of every tray in a facility.
    pub async fn tray_occupancy_for_facility(
        pool: &PgPool,
        facility_id: DbId,
    ) -> Result<Vec<TrayOccupancyRow>, sqlx::Error> {
        let query =
            format!("{TRAY_OCCUPANCY_SELECT} WHERE rm.facility_id = $1 {TRAY_OCCUPANCY_GROUP}");
        sqlx::query_as::<_, TrayOccupancyRow>(&query)
            .bind(facility_id)
            .fetch_all(pool)
            .await
    }

    /// Occupancy of every tray in a room.
    pub async fn tray_occupancy_for_room(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<TrayOccupancyRow>, sqlx::Error> {
        let query = format!("{TRAY_OCCUPANCY_SELECT} WHERE r.room_id = $1 {TRAY_OCCUPANCY_GROUP}");
        sqlx::query_as::<_, TrayOccupancyRow>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// `roomStats`: capacity and occupancy over all descendant trays.
    pub async fn room_stats(pool: &PgPool, room_id: DbId) -> Result<OccupancyStats, sqlx::Error> {
        let rows = Self::tray_occupancy_for_room(pool, room_id).await?;
        let trays: Vec<TrayOccupancy> = rows.iter().map(TrayOccupancyRow::occupancy).collect();
        Ok(OccupancyStats::from_trays(&trays))
    }

    /// Racks of a room, each with its own aggregate.
    pub async fn racks_with_stats(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<RackView>, sqlx::Error> {
        let racks = RackRepo::list_by_room(pool, room_id).await?;
        let rows = Self::tray_occupancy_for_room(pool, room_id).await?;

        let mut by_rack: HashMap<DbId, Vec<TrayOccupancy>> = HashMap::new();
        for row in &rows {
            by_rack.entry(row.rack_id).or_default().push(row.occupancy());
        }

        Ok(racks
            .into_iter()
            .map(|rack| {
                let stats = by_rack
                    .get(&rack.id)
                    .map(|trays| OccupancyStats::from_trays(trays))
                    .unwrap_or_default();
                RackView {
                    display_name: rack.display_name(),
                    stats,
                    rack,
                }
            })
            .collect())
    }

    /// Facility aggregate, combined from per-room aggregates.
    pub async fn facility_stats(
        pool: &PgPool,
        facility_id: DbId,
    ) -> Result<FacilityStats, sqlx::Error> {
        let rooms = RoomRepo::list_by_facility(pool, facility_id).await?;
        let rows = Self::tray_occupancy_for_facility(pool, facility_id).await?;

        let mut by_room: HashMap<DbId, Vec<TrayOccupancy>> = HashMap::new();
        for row in &rows {
            by_room.entry(row.room_id).or_default().push(row.occupancy());
        }

        let rooms: Vec<RoomOccupancy> = rooms
            .into_iter()
            .map(|room| RoomOccupancy {
                stats: by_room
                    .get(&room.id)
                    .map(|trays| OccupancyStats::from_trays(trays))
                    .unwrap_or_default(),
                room_id: room.id,
                room_name: room.name,
            })
            .collect();

        Ok(FacilityStats {
            facility_id,
            stats: OccupancyStats::combine(rooms.iter().map(|r| &r.stats)),
            rooms,
        })
    }
}
