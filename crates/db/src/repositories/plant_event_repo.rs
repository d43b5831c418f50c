//! Repository for the append-only `plant_events` (observation) table.

use canopy_core::error::GrowError;
use canopy_core::observation::validate_observation;
use canopy_core::pagination::{clamp_limit, clamp_offset};
use canopy_core::types::DbId;
use sqlx::PgPool;

use crate::models::plant_event::{CreateObservation, PlantEvent};
use crate::RepoError;

/// Column list for `plant_events` queries.
const COLUMNS: &str = "id, plant_id, notes, photo_urls, user_id, created_at";

/// Appends and reads plant observations.
pub struct PlantEventRepo;

impl PlantEventRepo {
    /// `addObservation`: append a note/photo entry. The plant itself is not
    /// touched.
    pub async fn add_observation(
        pool: &PgPool,
        plant_id: DbId,
        input: &CreateObservation,
        user_id: Option<DbId>,
    ) -> Result<PlantEvent, RepoError> {
        let (notes, photo_urls) = validate_observation(input.notes.as_deref(), &input.photo_urls)?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM plants WHERE id = $1)")
            .bind(plant_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(GrowError::PlantNotFound(plant_id.to_string()).into());
        }

        let query = format!(
            "INSERT INTO plant_events (plant_id, notes, photo_urls, user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let event = sqlx::query_as::<_, PlantEvent>(&query)
            .bind(plant_id)
            .bind(notes)
            .bind(photo_urls)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(event)
    }

    /// A plant's log, most recent first.
    pub async fn list_for_plant(
        pool: &PgPool,
        plant_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<PlantEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM plant_events WHERE plant_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, PlantEvent>(&query)
            .bind(plant_id)
            .bind(clamp_limit(limit))
            .bind(clamp_offset(offset))
            .fetch_all(pool)
            .await
    }
}
