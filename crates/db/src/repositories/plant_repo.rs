//! Repository for the `plants` table: placement, movement, phase, tagging
//! and retirement.
//!
//! Every mutating operation locks the rows whose state it checks (the plant,
//! and the target tray when a slot is taken) and records its audit event in
//! the same transaction.

use canopy_core::audit::{AuditEventKind, TrackableType};
use canopy_core::batch::ensure_batch_strain;
use canopy_core::error::{CoreError, GrowError};
use canopy_core::metrc::{compose_tag, validate_tag, UsedReason};
use canopy_core::pagination::{clamp_limit, clamp_offset};
use canopy_core::plant::{
    ensure_active, ensure_taggable, lookup_keys, plan_move, plan_phase_change, BulkReport,
    GrowthPhase, LookupKey, MovePlan, PhaseChange, PlantStatus, RetireStatus,
};
use canopy_core::types::DbId;
use canopy_core::uid;
use sqlx::{PgConnection, PgPool};

use crate::models::audit::NewAuditEvent;
use crate::models::plant::{CreatePlant, MoveOutcome, Plant, PlantListParams, QuickEntry};
use crate::repositories::{ensure_in_facility, AuditRepo, BatchRepo, MetrcTagRepo, TrayRepo};
use crate::RepoError;

/// Column list for `plants` queries.
const COLUMNS: &str = "\
    id, facility_id, plant_uid, strain_id, growth_phase, status, tray_id, \
    plant_batch_id, metrc_label, placed_by, status_reason, status_changed_at, \
    created_at, updated_at";

/// Optional filters shared by `list` and `count` ($2..$7).
const LIST_FILTER: &str = "\
    ($2::TEXT IS NULL OR status = $2) \
    AND ($3::TEXT IS NULL OR growth_phase = $3) \
    AND ($4::BIGINT IS NULL OR tray_id IN ( \
        SELECT t.id FROM trays t JOIN racks r ON r.id = t.rack_id WHERE r.room_id = $4)) \
    AND ($5::BIGINT IS NULL OR tray_id = $5) \
    AND ($6::BIGINT IS NULL OR strain_id = $6) \
    AND ($7::BIGINT IS NULL OR plant_batch_id = $7)";

/// What a new plant is created with.
struct NewPlant {
    tray_id: DbId,
    strain_id: DbId,
    plant_batch_id: Option<DbId>,
    growth_phase: GrowthPhase,
}

/// Provides the plant lifecycle operations.
pub struct PlantRepo;

impl PlantRepo {
    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// `createPlant`: place a new active plant into a tray.
    ///
    /// Fails with `CapacityExceeded` if the tray is full at the moment of the
    /// write; concurrent placements into the same tray are serialised by the
    /// tray lock.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePlant,
        placed_by: Option<DbId>,
    ) -> Result<Plant, RepoError> {
        let new = NewPlant {
            tray_id: input.tray_id,
            strain_id: input.strain_id,
            plant_batch_id: input.plant_batch_id,
            growth_phase: input.growth_phase.unwrap_or(GrowthPhase::Immature),
        };

        let mut tx = pool.begin().await?;
        let plant = Self::place_new_in_tx(&mut tx, &new, placed_by).await?;
        tx.commit().await?;
        Ok(plant)
    }

    async fn place_new_in_tx(
        conn: &mut PgConnection,
        new: &NewPlant,
        placed_by: Option<DbId>,
    ) -> Result<Plant, RepoError> {
        let tray = TrayRepo::lock_for_placement(&mut *conn, new.tray_id).await?;
        tray.occupancy.ensure_can_place()?;

        ensure_in_facility(&mut *conn, "strains", "strain", new.strain_id, tray.facility_id).await?;
        if let Some(batch_id) = new.plant_batch_id {
            let batch_strain =
                BatchRepo::strain_in_facility(&mut *conn, batch_id, tray.facility_id).await?;
            ensure_batch_strain(batch_strain, new.strain_id)?;
        }

        let query = format!(
            "INSERT INTO plants \
                 (facility_id, plant_uid, strain_id, growth_phase, tray_id, plant_batch_id, placed_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let plant = sqlx::query_as::<_, Plant>(&query)
            .bind(tray.facility_id)
            .bind(uid::plant_uid())
            .bind(new.strain_id)
            .bind(new.growth_phase.as_str())
            .bind(new.tray_id)
            .bind(new.plant_batch_id)
            .bind(placed_by)
            .fetch_one(&mut *conn)
            .await?;
        Ok(plant)
    }

    /// `movePlant`: relocate an active plant. Moving into its own tray is a
    /// no-op and reports `moved: false`.
    pub async fn move_to(
        pool: &PgPool,
        plant_id: DbId,
        target_tray_id: DbId,
        user_id: Option<DbId>,
    ) -> Result<MoveOutcome, RepoError> {
        let mut tx = pool.begin().await?;
        let plant = Self::lock(&mut tx, plant_id).await?;

        let (from, to) = match plan_move(plant.id, plant.status, plant.tray_id, target_tray_id)? {
            MovePlan::Stay => return Ok(MoveOutcome { plant, moved: false }),
            MovePlan::Relocate { from, to } => (from, to),
        };

        let tray = TrayRepo::lock_for_placement(&mut tx, to).await?;
        if tray.facility_id != plant.facility_id {
            return Err(CoreError::Validation(format!(
                "Tray {to} belongs to another facility"
            ))
            .into());
        }
        tray.occupancy.ensure_can_place()?;

        let query = format!("UPDATE plants SET tray_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let moved = sqlx::query_as::<_, Plant>(&query)
            .bind(plant.id)
            .bind(to)
            .fetch_one(&mut *tx)
            .await?;

        AuditRepo::log(
            &mut *tx,
            &NewAuditEvent::new(
                moved.facility_id,
                TrackableType::Plant,
                moved.id,
                AuditEventKind::PlantMoved {
                    from_tray_id: from,
                    to_tray_id: to,
                },
                user_id,
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(MoveOutcome {
            plant: moved,
            moved: true,
        })
    }

    // -----------------------------------------------------------------------
    // Phase
    // -----------------------------------------------------------------------

    /// `changePhase`: any direction is allowed. Asking for the current phase
    /// writes nothing and returns the plant unchanged.
    pub async fn change_phase(
        pool: &PgPool,
        plant_id: DbId,
        phase: GrowthPhase,
        user_id: Option<DbId>,
    ) -> Result<Plant, RepoError> {
        let mut tx = pool.begin().await?;
        let plant = Self::lock(&mut tx, plant_id).await?;

        let (from, to) = match plan_phase_change(plant.id, plant.status, plant.growth_phase, phase)? {
            PhaseChange::Unchanged => return Ok(plant),
            PhaseChange::Changed { from, to } => (from, to),
        };

        let query =
            format!("UPDATE plants SET growth_phase = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let updated = sqlx::query_as::<_, Plant>(&query)
            .bind(plant.id)
            .bind(to.as_str())
            .fetch_one(&mut *tx)
            .await?;

        AuditRepo::log(
            &mut *tx,
            &NewAuditEvent::new(
                updated.facility_id,
                TrackableType::Plant,
                updated.id,
                AuditEventKind::PlantPhaseChanged { from, to },
                user_id,
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Tagging
    // -----------------------------------------------------------------------

    /// `tagPlant`: bind an `available` tag to an active plant.
    ///
    /// A plant that already carries a tag needs `reassign`; the old tag then
    /// becomes `used` (superseded) in the same transaction.
    pub async fn tag(
        pool: &PgPool,
        plant_id: DbId,
        raw_tag: &str,
        reassign: bool,
        user_id: Option<DbId>,
    ) -> Result<Plant, RepoError> {
        let tag = validate_tag(raw_tag)?;

        let mut tx = pool.begin().await?;
        let plant = Self::lock(&mut tx, plant_id).await?;
        ensure_taggable(plant.id, plant.status, plant.metrc_label.as_deref(), reassign)?;

        let tagged = Self::tag_in_tx(&mut tx, &plant, &tag, user_id).await?;
        tx.commit().await?;
        Ok(tagged)
    }

    async fn tag_in_tx(
        conn: &mut PgConnection,
        plant: &Plant,
        tag: &str,
        user_id: Option<DbId>,
    ) -> Result<Plant, RepoError> {
        // The old binding goes first: a plant may hold only one assigned tag.
        if plant.metrc_label.is_some() {
            MetrcTagRepo::retire_for_plant(&mut *conn, plant.id, UsedReason::Superseded).await?;
        }
        MetrcTagRepo::assign_in_tx(&mut *conn, plant.facility_id, tag, plant.id, user_id).await?;

        let query = format!("UPDATE plants SET metrc_label = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let tagged = sqlx::query_as::<_, Plant>(&query)
            .bind(plant.id)
            .bind(tag)
            .fetch_one(&mut *conn)
            .await?;

        AuditRepo::log(
            &mut *conn,
            &NewAuditEvent::new(
                tagged.facility_id,
                TrackableType::Plant,
                tagged.id,
                AuditEventKind::PlantTagged {
                    tag: tag.to_string(),
                    previous_tag: plant.metrc_label.clone(),
                },
                user_id,
            ),
        )
        .await?;

        Ok(tagged)
    }

    // -----------------------------------------------------------------------
    // Retirement
    // -----------------------------------------------------------------------

    /// Destroy or remove an active plant: its tray slot is freed and its tag
    /// (if any) is consumed.
    pub async fn retire(
        pool: &PgPool,
        plant_id: DbId,
        status: RetireStatus,
        reason: Option<&str>,
        user_id: Option<DbId>,
    ) -> Result<Plant, RepoError> {
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());

        let mut tx = pool.begin().await?;
        let plant = Self::lock(&mut tx, plant_id).await?;
        ensure_active(plant.id, plant.status)?;

        let query = format!(
            "UPDATE plants \
             SET status = $2, tray_id = NULL, status_reason = $3, status_changed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let retired = sqlx::query_as::<_, Plant>(&query)
            .bind(plant.id)
            .bind(PlantStatus::from(status).as_str())
            .bind(reason)
            .fetch_one(&mut *tx)
            .await?;

        MetrcTagRepo::retire_for_plant(&mut tx, plant.id, UsedReason::Consumed).await?;

        let reason = reason.map(str::to_string);
        let kind = match status {
            RetireStatus::Destroyed => AuditEventKind::PlantDestroyed { reason },
            RetireStatus::Removed => AuditEventKind::PlantRemoved { reason },
        };
        AuditRepo::log(
            &mut *tx,
            &NewAuditEvent::new(retired.facility_id, TrackableType::Plant, retired.id, kind, user_id),
        )
        .await?;

        tx.commit().await?;
        Ok(retired)
    }

    // -----------------------------------------------------------------------
    // Quick entry
    // -----------------------------------------------------------------------

    /// Create and tag one plant per suffix, each pair in its own transaction.
    ///
    /// Items are processed in order and never roll each other back; capacity
    /// is re-checked for every item. Domain failures are reported per item,
    /// anything else aborts the remaining items.
    pub async fn quick_entry(
        pool: &PgPool,
        input: &QuickEntry,
        placed_by: Option<DbId>,
    ) -> Result<BulkReport<Plant>, RepoError> {
        let facility_id =
            TrayRepo::facility_id(pool, input.tray_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "tray",
                    id: input.tray_id,
                })?;
        ensure_in_facility(pool, "strains", "strain", input.strain_id, facility_id).await?;
        if let Some(batch_id) = input.plant_batch_id {
            let batch_strain = BatchRepo::strain_in_facility(pool, batch_id, facility_id).await?;
            ensure_batch_strain(batch_strain, input.strain_id)?;
        }

        let new = NewPlant {
            tray_id: input.tray_id,
            strain_id: input.strain_id,
            plant_batch_id: input.plant_batch_id,
            growth_phase: input.growth_phase.unwrap_or(GrowthPhase::Immature),
        };

        let mut report = BulkReport::default();
        for suffix in &input.suffixes {
            let candidate = compose_tag(&input.tag_prefix, suffix);
            let outcome = match Self::create_tagged(pool, &new, &candidate, placed_by).await {
                Ok(plant) => Ok(plant),
                Err(RepoError::Grow(err)) => Err(err),
                Err(other) => return Err(other),
            };
            report.push(candidate, outcome);
        }

        tracing::info!(
            facility_id,
            tray_id = input.tray_id,
            succeeded = report.succeeded,
            failed = report.failed,
            "Quick entry processed"
        );
        Ok(report)
    }

    async fn create_tagged(
        pool: &PgPool,
        new: &NewPlant,
        candidate: &str,
        placed_by: Option<DbId>,
    ) -> Result<Plant, RepoError> {
        let tag = validate_tag(candidate)?;

        let mut tx = pool.begin().await?;
        let plant = Self::place_new_in_tx(&mut tx, new, placed_by).await?;
        let tagged = Self::tag_in_tx(&mut tx, &plant, &tag, placed_by).await?;
        tx.commit().await?;
        Ok(tagged)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Plant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM plants WHERE id = $1");
        sqlx::query_as::<_, Plant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// `lookupPlant`: resolve by plant UID, then by METRC label.
    pub async fn lookup(
        pool: &PgPool,
        facility_id: DbId,
        identifier: &str,
    ) -> Result<Plant, RepoError> {
        for key in lookup_keys(identifier)? {
            let (column, value) = match &key {
                LookupKey::Uid(value) => ("plant_uid", value),
                LookupKey::MetrcLabel(value) => ("metrc_label", value),
            };
            let query =
                format!("SELECT {COLUMNS} FROM plants WHERE facility_id = $1 AND {column} = $2");
            let found = sqlx::query_as::<_, Plant>(&query)
                .bind(facility_id)
                .bind(value)
                .fetch_optional(pool)
                .await?;
            if let Some(plant) = found {
                return Ok(plant);
            }
        }
        Err(GrowError::PlantNotFound(identifier.trim().to_string()).into())
    }

    /// A facility's plants, newest first.
    pub async fn list(
        pool: &PgPool,
        facility_id: DbId,
        params: &PlantListParams,
    ) -> Result<Vec<Plant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM plants \
             WHERE facility_id = $1 AND {LIST_FILTER} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $8 OFFSET $9"
        );
        sqlx::query_as::<_, Plant>(&query)
            .bind(facility_id)
            .bind(params.status.map(|s| s.as_str()))
            .bind(params.growth_phase.map(|p| p.as_str()))
            .bind(params.room_id)
            .bind(params.tray_id)
            .bind(params.strain_id)
            .bind(params.plant_batch_id)
            .bind(clamp_limit(params.limit))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        facility_id: DbId,
        params: &PlantListParams,
    ) -> Result<i64, sqlx::Error> {
        let query =
            format!("SELECT COUNT(*) FROM plants WHERE facility_id = $1 AND {LIST_FILTER}");
        sqlx::query_scalar(&query)
            .bind(facility_id)
            .bind(params.status.map(|s| s.as_str()))
            .bind(params.growth_phase.map(|p| p.as_str()))
            .bind(params.room_id)
            .bind(params.tray_id)
            .bind(params.strain_id)
            .bind(params.plant_batch_id)
            .fetch_one(pool)
            .await
    }

    /// Members of a batch, in creation order.
    pub async fn list_by_batch(pool: &PgPool, batch_id: DbId) -> Result<Vec<Plant>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM plants WHERE plant_batch_id = $1 ORDER BY id");
        sqlx::query_as::<_, Plant>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Lock a plant row for the rest of the transaction.
    async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Plant, RepoError> {
        let query = format!("SELECT {COLUMNS} FROM plants WHERE id = $1 FOR NO KEY UPDATE");
        sqlx::query_as::<_, Plant>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| GrowError::PlantNotFound(id.to_string()).into())
    }
}
