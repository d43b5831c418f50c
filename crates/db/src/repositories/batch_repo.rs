//! Repository for the `plant_batches` table.

use canopy_core::audit::{AuditEventKind, TrackableType};
use canopy_core::batch::{ensure_batch_strain, ensure_unbatched, validate_member_ids};
use canopy_core::error::{CoreError, GrowError};
use canopy_core::pagination::{clamp_limit, clamp_offset};
use canopy_core::types::DbId;
use canopy_core::uid;
use sqlx::{PgExecutor, PgPool};

use crate::models::audit::NewAuditEvent;
use crate::models::batch::{BatchSummary, CreateBatch, PlantBatch};
use crate::repositories::{ensure_in_facility, AuditRepo};
use crate::RepoError;

/// Column list for `plant_batches` queries.
const COLUMNS: &str = "\
    id, facility_id, batch_uid, name, batch_type, strain_id, initial_count, notes, \
    created_by, created_at, updated_at";

/// Summary select: batch columns plus the live active member count.
const SUMMARY_SELECT: &str = "\
    SELECT b.id, b.facility_id, b.batch_uid, b.name, b.batch_type, b.strain_id, \
           b.initial_count, b.notes, b.created_by, b.created_at, b.updated_at, \
           (SELECT COUNT(*) FROM plants p \
             WHERE p.plant_batch_id = b.id AND p.status = 'active') AS active_plant_count \
    FROM plant_batches b";

/// Provides batch creation and aggregation.
pub struct BatchRepo;

impl BatchRepo {
    /// `createBatch`: group existing, unbatched plants of one facility.
    ///
    /// `initial_count` is the number of members at creation and never
    /// changes. Members must be of the batch's strain. The member rows are
    /// locked so a plant cannot join two batches concurrently.
    pub async fn create(
        pool: &PgPool,
        facility_id: DbId,
        input: &CreateBatch,
        user_id: Option<DbId>,
    ) -> Result<BatchSummary, RepoError> {
        validate_member_ids(&input.plant_ids)?;
        ensure_in_facility(pool, "strains", "strain", input.strain_id, facility_id).await?;

        let mut tx = pool.begin().await?;

        let members: Vec<(DbId, DbId, DbId, Option<DbId>)> = sqlx::query_as(
            "SELECT id, facility_id, strain_id, plant_batch_id FROM plants \
             WHERE id = ANY($1) ORDER BY id FOR NO KEY UPDATE",
        )
        .bind(&input.plant_ids)
        .fetch_all(&mut *tx)
        .await?;

        for plant_id in &input.plant_ids {
            match members.iter().find(|(id, ..)| id == plant_id) {
                Some((_, owner, ..)) if *owner != facility_id => {
                    return Err(GrowError::PlantNotFound(plant_id.to_string()).into());
                }
                Some((_, _, strain_id, current_batch)) => {
                    ensure_unbatched(*plant_id, *current_batch)?;
                    ensure_batch_strain(input.strain_id, *strain_id)?;
                }
                None => return Err(GrowError::PlantNotFound(plant_id.to_string()).into()),
            }
        }

        let batch_uid = uid::batch_uid();
        let initial_count = input.plant_ids.len() as i32;
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let query = format!(
            "INSERT INTO plant_batches \
                 (facility_id, batch_uid, name, batch_type, strain_id, initial_count, notes, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        let batch = sqlx::query_as::<_, PlantBatch>(&query)
            .bind(facility_id)
            .bind(&batch_uid)
            .bind(name)
            .bind(input.batch_type.as_str())
            .bind(input.strain_id)
            .bind(initial_count)
            .bind(&input.notes)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE plants SET plant_batch_id = $1 WHERE id = ANY($2)")
            .bind(batch.id)
            .bind(&input.plant_ids)
            .execute(&mut *tx)
            .await?;

        AuditRepo::log(
            &mut *tx,
            &NewAuditEvent::new(
                facility_id,
                TrackableType::PlantBatch,
                batch.id,
                AuditEventKind::BatchCreated {
                    plant_count: i64::from(initial_count),
                    batch_uid,
                },
                user_id,
            ),
        )
        .await?;

        let summary = Self::summary_in(&mut *tx, batch.id).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Strain of a batch owned by `facility_id`, for placing new members.
    pub(crate) async fn strain_in_facility<'e, E>(
        executor: E,
        batch_id: DbId,
        facility_id: DbId,
    ) -> Result<DbId, RepoError>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(DbId, DbId)> =
            sqlx::query_as("SELECT facility_id, strain_id FROM plant_batches WHERE id = $1")
                .bind(batch_id)
                .fetch_optional(executor)
                .await?;
        match row {
            Some((owner, strain_id)) if owner == facility_id => Ok(strain_id),
            Some(_) => Err(CoreError::Validation(format!(
                "batch {batch_id} belongs to another facility"
            ))
            .into()),
            None => Err(CoreError::NotFound {
                entity: "batch",
                id: batch_id,
            }
            .into()),
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BatchSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE b.id = $1");
        sqlx::query_as::<_, BatchSummary>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A facility's batches, newest first, with live active counts.
    pub async fn list(
        pool: &PgPool,
        facility_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<BatchSummary>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE b.facility_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, BatchSummary>(&query)
            .bind(facility_id)
            .bind(clamp_limit(limit))
            .bind(clamp_offset(offset))
            .fetch_all(pool)
            .await
    }

    /// Replace the batch's free-text notes.
    pub async fn update_notes(
        pool: &PgPool,
        id: DbId,
        notes: Option<&str>,
    ) -> Result<Option<PlantBatch>, sqlx::Error> {
        let query = format!("UPDATE plant_batches SET notes = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, PlantBatch>(&query)
            .bind(id)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    async fn summary_in(
        conn: &mut sqlx::PgConnection,
        id: DbId,
    ) -> Result<BatchSummary, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE b.id = $1");
        sqlx::query_as::<_, BatchSummary>(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }
}
