//! Repository for the `racks` table.

use canopy_core::error::CoreError;
use canopy_core::spatial::validate_rack_floor;
use canopy_core::types::DbId;
use sqlx::PgPool;

use crate::models::rack::{CreateRack, Rack};
use crate::RepoError;

/// Column list for `racks` queries.
const COLUMNS: &str = "id, room_id, floor, position, name, created_at, updated_at";

/// Provides CRUD operations for racks.
pub struct RackRepo;

impl RackRepo {
    /// Create a rack on one of the room's floors.
    ///
    /// Takes a share lock on the room so the floor check cannot race a
    /// `floor_count` reduction.
    pub async fn create(pool: &PgPool, room_id: DbId, input: &CreateRack) -> Result<Rack, RepoError> {
        let mut tx = pool.begin().await?;

        let floor_count: i32 =
            sqlx::query_scalar("SELECT floor_count FROM rooms WHERE id = $1 FOR SHARE")
                .bind(room_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "room",
                    id: room_id,
                })?;

        let floor = input.floor.unwrap_or(1);
        validate_rack_floor(floor, floor_count)?;

        let query = format!(
            "INSERT INTO racks (room_id, floor, position, name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let rack = sqlx::query_as::<_, Rack>(&query)
            .bind(room_id)
            .bind(floor)
            .bind(input.position)
            .bind(&input.name)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(rack)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Rack>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM racks WHERE id = $1");
        sqlx::query_as::<_, Rack>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Racks of a room, floor by floor in position order.
    pub async fn list_by_room(pool: &PgPool, room_id: DbId) -> Result<Vec<Rack>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM racks WHERE room_id = $1 ORDER BY floor, position, id"
        );
        sqlx::query_as::<_, Rack>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// The facility owning a rack.
    pub async fn facility_id(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT rm.facility_id FROM racks r JOIN rooms rm ON rm.id = r.room_id WHERE r.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
