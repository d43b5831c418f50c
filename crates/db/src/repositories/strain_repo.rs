//! Repository for the `strains` table.

use canopy_core::types::DbId;
use sqlx::PgPool;

use crate::models::strain::{CreateStrain, Strain};

/// Column list for `strains` queries.
const COLUMNS: &str = "id, facility_id, name, category, created_at, updated_at";

/// Provides read-mostly access to the strain catalog.
pub struct StrainRepo;

impl StrainRepo {
    pub async fn create(
        pool: &PgPool,
        facility_id: DbId,
        input: &CreateStrain,
    ) -> Result<Strain, sqlx::Error> {
        let query = format!(
            "INSERT INTO strains (facility_id, name, category) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Strain>(&query)
            .bind(facility_id)
            .bind(input.name.trim())
            .bind(&input.category)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Strain>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM strains WHERE id = $1");
        sqlx::query_as::<_, Strain>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_facility(
        pool: &PgPool,
        facility_id: DbId,
    ) -> Result<Vec<Strain>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM strains WHERE facility_id = $1 ORDER BY name");
        sqlx::query_as::<_, Strain>(&query)
            .bind(facility_id)
            .fetch_all(pool)
            .await
    }
}
