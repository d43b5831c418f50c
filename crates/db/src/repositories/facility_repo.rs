//! Repository for the `facilities` table.

use canopy_core::types::DbId;
use sqlx::PgPool;

use crate::models::facility::{CreateFacility, Facility, UpdateFacility};

/// Column list for `facilities` queries.
const COLUMNS: &str = "id, name, license_number, layout, created_at, updated_at";

/// Provides CRUD operations for facilities.
pub struct FacilityRepo;

impl FacilityRepo {
    pub async fn create(pool: &PgPool, input: &CreateFacility) -> Result<Facility, sqlx::Error> {
        let query = format!(
            "INSERT INTO facilities (name, license_number, layout) \
             VALUES ($1, $2, COALESCE($3, '{{}}'::jsonb)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Facility>(&query)
            .bind(&input.name)
            .bind(&input.license_number)
            .bind(&input.layout)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Facility>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM facilities WHERE id = $1");
        sqlx::query_as::<_, Facility>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Facility>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM facilities ORDER BY name, id");
        sqlx::query_as::<_, Facility>(&query).fetch_all(pool).await
    }

    /// Apply the non-`None` fields. Returns `None` if the facility does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFacility,
    ) -> Result<Option<Facility>, sqlx::Error> {
        let query = format!(
            "UPDATE facilities SET \
                 name = COALESCE($2, name), \
                 license_number = COALESCE($3, license_number), \
                 layout = COALESCE($4, layout) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Facility>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.license_number)
            .bind(&input.layout)
            .fetch_optional(pool)
            .await
    }
}
