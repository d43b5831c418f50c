//! Repository for the `rooms` table.

use canopy_core::error::CoreError;
use canopy_core::spatial::{validate_floor_count_change, validate_room_dimensions};
use canopy_core::types::DbId;
use sqlx::PgPool;

use crate::models::room::{CreateRoom, Room, UpdateRoom};
use crate::RepoError;

/// Column list for `rooms` queries.
const COLUMNS: &str = "\
    id, facility_id, name, room_type, rows, cols, floor_count, created_at, updated_at";

/// Provides CRUD operations for rooms.
pub struct RoomRepo;

impl RoomRepo {
    pub async fn create(
        pool: &PgPool,
        facility_id: DbId,
        input: &CreateRoom,
    ) -> Result<Room, RepoError> {
        let rows = input.rows.unwrap_or(1);
        let cols = input.cols.unwrap_or(1);
        let floor_count = input.floor_count.unwrap_or(1);
        validate_room_dimensions(rows, cols, floor_count)?;

        let query = format!(
            "INSERT INTO rooms (facility_id, name, room_type, rows, cols, floor_count) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let room = sqlx::query_as::<_, Room>(&query)
            .bind(facility_id)
            .bind(&input.name)
            .bind(input.room_type.as_str())
            .bind(rows)
            .bind(cols)
            .bind(floor_count)
            .fetch_one(pool)
            .await?;
        Ok(room)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_facility(
        pool: &PgPool,
        facility_id: DbId,
    ) -> Result<Vec<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE facility_id = $1 ORDER BY name, id");
        sqlx::query_as::<_, Room>(&query)
            .bind(facility_id)
            .fetch_all(pool)
            .await
    }

    /// Update room metadata.
    ///
    /// Lowering `floor_count` below the highest floor holding a rack is a
    /// conflict. The room row is locked so a concurrent rack insert cannot
    /// slip in between the check and the write.
    pub async fn update(pool: &PgPool, id: DbId, input: &UpdateRoom) -> Result<Room, RepoError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1 FOR NO KEY UPDATE");
        let current = sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::NotFound { entity: "room", id })?;

        let rows = input.rows.unwrap_or(current.rows);
        let cols = input.cols.unwrap_or(current.cols);
        let floor_count = input.floor_count.unwrap_or(current.floor_count);
        validate_room_dimensions(rows, cols, floor_count)?;

        if floor_count < current.floor_count {
            let highest: Option<i32> =
                sqlx::query_scalar("SELECT MAX(floor) FROM racks WHERE room_id = $1")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
            validate_floor_count_change(floor_count, highest)?;
        }

        let query = format!(
            "UPDATE rooms SET \
                 name = COALESCE($2, name), \
                 room_type = COALESCE($3, room_type), \
                 rows = $4, cols = $5, floor_count = $6 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let room = sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.room_type.map(|t| t.as_str()))
            .bind(rows)
            .bind(cols)
            .bind(floor_count)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(room)
    }
}
