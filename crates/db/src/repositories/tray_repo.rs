//! Repository for the `trays` table.
//!
//! Occupancy is always counted from active plants at read time. Writers that
//! add a plant to a tray (or shrink its capacity) first lock the tray row with
//! [`TrayRepo::lock_for_placement`], which serialises them per tray.

use canopy_core::error::CoreError;
use canopy_core::spatial::{validate_capacity_change, validate_tray_capacity, TrayOccupancy};
use canopy_core::types::DbId;
use sqlx::{FromRow, PgConnection, PgPool};

use crate::models::tray::{CreateTray, Tray, TrayView, UpdateTray};
use crate::RepoError;

/// Column list for `trays` queries.
const COLUMNS: &str = "id, rack_id, position, capacity, name, created_at, updated_at";

/// Same columns qualified with the `t` alias.
const T_COLUMNS: &str = "\
    t.id, t.rack_id, t.position, t.capacity, t.name, t.created_at, t.updated_at";

/// Live count of active plants in tray `t`.
const OCCUPANCY_EXPR: &str =
    "(SELECT COUNT(*) FROM plants p WHERE p.tray_id = t.id AND p.status = 'active')";

#[derive(FromRow)]
struct TrayWithCount {
    #[sqlx(flatten)]
    tray: Tray,
    occupancy: i64,
}

/// A tray locked for the rest of the caller's transaction.
#[derive(Debug, Clone, Copy)]
pub struct LockedTray {
    pub facility_id: DbId,
    pub occupancy: TrayOccupancy,
}

/// Provides CRUD and placement locking for trays.
pub struct TrayRepo;

impl TrayRepo {
    pub async fn create(pool: &PgPool, rack_id: DbId, input: &CreateTray) -> Result<Tray, RepoError> {
        validate_tray_capacity(input.capacity)?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM racks WHERE id = $1)")
            .bind(rack_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(CoreError::NotFound {
                entity: "rack",
                id: rack_id,
            }
            .into());
        }

        let query = format!(
            "INSERT INTO trays (rack_id, position, capacity, name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let tray = sqlx::query_as::<_, Tray>(&query)
            .bind(rack_id)
            .bind(input.position)
            .bind(input.capacity)
            .bind(&input.name)
            .fetch_one(pool)
            .await?;
        Ok(tray)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tray>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM trays WHERE id = $1");
        sqlx::query_as::<_, Tray>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A tray with its live occupancy.
    pub async fn find_view(pool: &PgPool, id: DbId) -> Result<Option<TrayView>, sqlx::Error> {
        let query = format!(
            "SELECT {T_COLUMNS}, {OCCUPANCY_EXPR} AS occupancy FROM trays t WHERE t.id = $1"
        );
        let row = sqlx::query_as::<_, TrayWithCount>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| TrayView::new(r.tray, r.occupancy)))
    }

    /// Trays of a rack in position order, with live occupancy.
    pub async fn list_by_rack(pool: &PgPool, rack_id: DbId) -> Result<Vec<TrayView>, sqlx::Error> {
        let query = format!(
            "SELECT {T_COLUMNS}, {OCCUPANCY_EXPR} AS occupancy FROM trays t \
             WHERE t.rack_id = $1 ORDER BY t.position, t.id"
        );
        let rows = sqlx::query_as::<_, TrayWithCount>(&query)
            .bind(rack_id)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| TrayView::new(r.tray, r.occupancy))
            .collect())
    }

    /// Lock a tray row and count its active plants.
    ///
    /// Must be called inside a transaction; the lock is held until it ends.
    /// Fails with `NotFound` if the tray does not exist.
    pub async fn lock_for_placement(
        conn: &mut PgConnection,
        tray_id: DbId,
    ) -> Result<LockedTray, RepoError> {
        let row: Option<(i32, DbId)> = sqlx::query_as(
            "SELECT t.capacity, rm.facility_id \
             FROM trays t \
             JOIN racks r ON r.id = t.rack_id \
             JOIN rooms rm ON rm.id = r.room_id \
             WHERE t.id = $1 \
             FOR NO KEY UPDATE OF t",
        )
        .bind(tray_id)
        .fetch_optional(&mut *conn)
        .await?;
        let (capacity, facility_id) = row.ok_or(CoreError::NotFound {
            entity: "tray",
            id: tray_id,
        })?;

        let occupancy: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM plants WHERE tray_id = $1 AND status = 'active'",
        )
        .bind(tray_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(LockedTray {
            facility_id,
            occupancy: TrayOccupancy {
                tray_id,
                capacity,
                occupancy,
            },
        })
    }

    /// Update name and/or capacity. Capacity may not drop below the live
    /// occupancy (`CapacityExceeded`).
    pub async fn update(pool: &PgPool, id: DbId, input: &UpdateTray) -> Result<TrayView, RepoError> {
        let mut tx = pool.begin().await?;

        let locked = Self::lock_for_placement(&mut tx, id).await?;
        if let Some(capacity) = input.capacity {
            validate_tray_capacity(capacity)?;
            validate_capacity_change(id, capacity, locked.occupancy.occupancy)?;
        }

        let query = format!(
            "UPDATE trays SET \
                 capacity = COALESCE($2, capacity), \
                 name = COALESCE($3, name) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let tray = sqlx::query_as::<_, Tray>(&query)
            .bind(id)
            .bind(input.capacity)
            .bind(&input.name)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TrayView::new(tray, locked.occupancy.occupancy))
    }

    /// The facility owning a tray.
    pub async fn facility_id(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT rm.facility_id FROM trays t \
             JOIN racks r ON r.id = t.rack_id \
             JOIN rooms rm ON rm.id = r.room_id \
             WHERE t.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
