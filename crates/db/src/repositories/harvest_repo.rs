//! Repository for harvests, their plant membership and per-strain weights.
//!
//! Every recording operation locks the harvest row, asks the stage machine
//! in `canopy_core::harvest` whether the action is allowed from the current
//! status, writes, and appends the matching audit event, all in one
//! transaction.

use canopy_core::audit::{AuditEventKind, TrackableType};
use canopy_core::batch::validate_member_ids;
use canopy_core::error::{CoreError, GrowError};
use canopy_core::harvest::{
    days_elapsed, dominant_strain, ensure_harvestable, flower_inventory, harvest_name,
    initial_status, validate_weight, FlowerInventory, HarvestAction, HarvestStatus,
};
use canopy_core::pagination::{clamp_limit, clamp_offset};
use canopy_core::plant::{GrowthPhase, PlantStatus};
use canopy_core::types::{DbId, Grams, Timestamp};
use chrono::Utc;
use sqlx::{FromRow, PgConnection, PgPool};

use crate::models::audit::{AuditEvent, NewAuditEvent};
use crate::models::harvest::{
    CreateHarvest, Harvest, HarvestDetail, HarvestListParams, HarvestPlant, HarvestWeight,
    HarvestWeightView, RecordStrainWeight,
};
use crate::repositories::{ensure_in_facility, AuditRepo, MetrcTagRepo};
use crate::RepoError;

/// Column list for `harvests` queries.
const COLUMNS: &str = "\
    id, facility_id, sequence_number, name, harvest_type, harvest_date, status, \
    wet_weight_grams, waste_weight_grams, drying_room_id, notes, admin_reviewed, \
    reviewed_by, reviewed_at, drying_started_at, drying_finished_at, \
    trimming_started_at, trimming_finished_at, curing_finished_at, \
    created_by, created_at, updated_at";

/// Strain weights joined with the strain name.
const WEIGHT_SELECT: &str = "\
    SELECT w.id, w.harvest_id, w.strain_id, s.name AS strain_name, \
           w.wet_weight_grams, w.dry_weight_grams, w.flower_weight_grams, \
           w.shake_weight_grams, w.waste_weight_grams, w.created_at, w.updated_at \
    FROM harvest_weights w \
    JOIN strains s ON s.id = w.strain_id";

/// Harvest membership joined with plant identifiers.
const PLANT_SELECT: &str = "\
    SELECT hp.harvest_id, hp.plant_id, hp.strain_id, p.plant_uid, p.metrc_label, hp.added_at \
    FROM harvest_plants hp \
    JOIN plants p ON p.id = hp.plant_id";

/// A plant locked for harvesting, with what the checks and the audit need.
#[derive(Debug, FromRow)]
struct HarvestCandidate {
    id: DbId,
    facility_id: DbId,
    #[sqlx(try_from = "String")]
    status: PlantStatus,
    #[sqlx(try_from = "String")]
    growth_phase: GrowthPhase,
    strain_name: String,
}

/// The four stage-closing actions, each stamping its own column.
#[derive(Debug, Clone, Copy)]
enum Stage {
    FinishDrying,
    StartTrimming,
    FinishTrimming,
    FinishCuring,
}

impl Stage {
    fn action(self) -> HarvestAction {
        match self {
            Stage::FinishDrying => HarvestAction::FinishDrying,
            Stage::StartTrimming => HarvestAction::StartTrimming,
            Stage::FinishTrimming => HarvestAction::FinishTrimming,
            Stage::FinishCuring => HarvestAction::FinishCuring,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Stage::FinishDrying => "drying_finished_at",
            Stage::StartTrimming => "trimming_started_at",
            Stage::FinishTrimming => "trimming_finished_at",
            Stage::FinishCuring => "curing_finished_at",
        }
    }

    /// When the previous stage began.
    fn since(self, harvest: &Harvest) -> Timestamp {
        let previous = match self {
            Stage::FinishDrying => harvest.drying_started_at,
            Stage::StartTrimming => harvest.drying_finished_at,
            Stage::FinishTrimming => harvest.trimming_started_at,
            Stage::FinishCuring => harvest.trimming_finished_at,
        };
        previous.unwrap_or(harvest.created_at)
    }

    fn event(self, days_elapsed: i64) -> AuditEventKind {
        match self {
            Stage::FinishDrying => AuditEventKind::HarvestDryingFinished { days_elapsed },
            Stage::StartTrimming => AuditEventKind::HarvestTrimmingStarted { days_elapsed },
            Stage::FinishTrimming => AuditEventKind::HarvestTrimmingFinished { days_elapsed },
            Stage::FinishCuring => AuditEventKind::HarvestCuringFinished { days_elapsed },
        }
    }
}

/// Provides the harvest workflow.
pub struct HarvestRepo;

impl HarvestRepo {
    // -----------------------------------------------------------------------
    // Creation and membership
    // -----------------------------------------------------------------------

    /// `createHarvest`: harvest active flowering plants.
    ///
    /// Each plant becomes `harvested`, leaves its tray and has its tag
    /// consumed. Blank names become "Harvest N" with N sequential per
    /// facility. The facility row is held `FOR NO KEY UPDATE` while N is
    /// chosen: concurrent creates queue on it, but the `KEY SHARE` locks
    /// taken by foreign-key checks on plant and audit writes do not.
    pub async fn create(
        pool: &PgPool,
        facility_id: DbId,
        input: &CreateHarvest,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        validate_member_ids(&input.plant_ids)?;
        if let Some(grams) = input.wet_weight_grams {
            validate_weight("wet", grams)?;
        }

        let mut tx = pool.begin().await?;

        let facility: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM facilities WHERE id = $1 FOR NO KEY UPDATE")
                .bind(facility_id)
                .fetch_optional(&mut *tx)
                .await?;
        if facility.is_none() {
            return Err(CoreError::NotFound {
                entity: "facility",
                id: facility_id,
            }
            .into());
        }
        if let Some(room_id) = input.drying_room_id {
            ensure_in_facility(&mut *tx, "rooms", "room", room_id, facility_id).await?;
        }

        let sequence_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM harvests WHERE facility_id = $1",
        )
        .bind(facility_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO harvests \
                 (facility_id, sequence_number, name, harvest_type, harvest_date, status, \
                  wet_weight_grams, drying_room_id, notes, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        let harvest = sqlx::query_as::<_, Harvest>(&query)
            .bind(facility_id)
            .bind(sequence_number)
            .bind(harvest_name(input.name.as_deref(), sequence_number))
            .bind(input.harvest_type.as_str())
            .bind(input.harvest_date.unwrap_or_else(|| Utc::now().date_naive()))
            .bind(initial_status(input.wet_weight_grams).as_str())
            .bind(input.wet_weight_grams)
            .bind(input.drying_room_id)
            .bind(&input.notes)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let plants =
            Self::harvest_plants_in_tx(&mut tx, facility_id, harvest.id, &input.plant_ids, user_id)
                .await?;

        Self::log(
            &mut tx,
            &harvest,
            AuditEventKind::HarvestCreated {
                plant_count: plants.len() as i64,
                harvest_type: harvest.harvest_type,
                strain_name: dominant_strain(plants.iter().map(|p| p.strain_name.as_str())),
            },
            None,
            user_id,
        )
        .await?;
        if let Some(wet_weight_grams) = input.wet_weight_grams {
            Self::log(
                &mut tx,
                &harvest,
                AuditEventKind::HarvestWetWeightRecorded { wet_weight_grams },
                None,
                user_id,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(harvest)
    }

    /// `addPlantsToHarvest`: append more plants while the harvest has not
    /// started drying. Membership never shrinks.
    pub async fn add_plants(
        pool: &PgPool,
        harvest_id: DbId,
        plant_ids: &[DbId],
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        let mut tx = pool.begin().await?;
        let harvest = Self::lock(&mut tx, harvest_id).await?;
        harvest.status.apply(HarvestAction::AddPlants)?;

        let plants =
            Self::harvest_plants_in_tx(&mut tx, harvest.facility_id, harvest.id, plant_ids, user_id)
                .await?;

        Self::log(
            &mut tx,
            &harvest,
            AuditEventKind::HarvestPlantsAdded {
                plant_count: plants.len() as i64,
            },
            None,
            user_id,
        )
        .await?;

        tx.commit().await?;
        Ok(harvest)
    }

    /// Lock, check and harvest a set of plants on behalf of `harvest_id`.
    async fn harvest_plants_in_tx(
        conn: &mut PgConnection,
        facility_id: DbId,
        harvest_id: DbId,
        plant_ids: &[DbId],
        user_id: Option<DbId>,
    ) -> Result<Vec<HarvestCandidate>, RepoError> {
        validate_member_ids(plant_ids)?;

        let candidates = sqlx::query_as::<_, HarvestCandidate>(
            "SELECT p.id, p.facility_id, p.status, p.growth_phase, s.name AS strain_name \
             FROM plants p \
             JOIN strains s ON s.id = p.strain_id \
             WHERE p.id = ANY($1) \
             ORDER BY p.id \
             FOR NO KEY UPDATE OF p",
        )
        .bind(plant_ids)
        .fetch_all(&mut *conn)
        .await?;

        for plant_id in plant_ids {
            let plant = candidates
                .iter()
                .find(|c| c.id == *plant_id && c.facility_id == facility_id)
                .ok_or_else(|| GrowError::PlantNotFound(plant_id.to_string()))?;
            ensure_harvestable(plant.id, plant.status, plant.growth_phase)?;
        }

        sqlx::query(
            "INSERT INTO harvest_plants (harvest_id, plant_id, strain_id, added_by) \
             SELECT $1, p.id, p.strain_id, $3 FROM plants p WHERE p.id = ANY($2)",
        )
        .bind(harvest_id)
        .bind(plant_ids)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE plants \
             SET status = 'harvested', tray_id = NULL, status_changed_at = NOW() \
             WHERE id = ANY($1)",
        )
        .bind(plant_ids)
        .execute(&mut *conn)
        .await?;

        MetrcTagRepo::consume_for_plants(&mut *conn, plant_ids).await?;

        Ok(candidates)
    }

    // -----------------------------------------------------------------------
    // Stage recording
    // -----------------------------------------------------------------------

    /// `recordWetWeight`: `created -> wet_weight_recorded`.
    pub async fn record_wet_weight(
        pool: &PgPool,
        harvest_id: DbId,
        wet_weight_grams: Grams,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        validate_weight("wet", wet_weight_grams)?;

        let mut tx = pool.begin().await?;
        let harvest = Self::lock(&mut tx, harvest_id).await?;
        let next = harvest.status.apply(HarvestAction::RecordWetWeight)?;

        let query = format!(
            "UPDATE harvests SET wet_weight_grams = $2, status = $3 WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Harvest>(&query)
            .bind(harvest.id)
            .bind(wet_weight_grams)
            .bind(next.as_str())
            .fetch_one(&mut *tx)
            .await?;

        Self::log(
            &mut tx,
            &updated,
            AuditEventKind::HarvestWetWeightRecorded { wet_weight_grams },
            None,
            user_id,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// `startDrying`: `wet_weight_recorded -> drying_started`, optionally
    /// setting the drying room.
    pub async fn start_drying(
        pool: &PgPool,
        harvest_id: DbId,
        drying_room_id: Option<DbId>,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        let mut tx = pool.begin().await?;
        let harvest = Self::lock(&mut tx, harvest_id).await?;
        let next = harvest.status.apply(HarvestAction::StartDrying)?;

        if let Some(room_id) = drying_room_id {
            ensure_in_facility(&mut *tx, "rooms", "room", room_id, harvest.facility_id).await?;
        }

        let query = format!(
            "UPDATE harvests \
             SET status = $2, drying_room_id = COALESCE($3, drying_room_id), \
                 drying_started_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Harvest>(&query)
            .bind(harvest.id)
            .bind(next.as_str())
            .bind(drying_room_id)
            .fetch_one(&mut *tx)
            .await?;

        let drying_room: Option<String> = match updated.drying_room_id {
            Some(room_id) => {
                sqlx::query_scalar("SELECT name FROM rooms WHERE id = $1")
                    .bind(room_id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        Self::log(
            &mut tx,
            &updated,
            AuditEventKind::HarvestDryingStarted { drying_room },
            None,
            user_id,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// `recordStrainWeight`: upsert the (harvest, strain) row.
    ///
    /// Only the fields present are written; each must be allowed in the
    /// current stage. Recording dry weights advances the harvest to
    /// `dry_weight_recorded`.
    pub async fn record_strain_weight(
        pool: &PgPool,
        harvest_id: DbId,
        input: &RecordStrainWeight,
        user_id: Option<DbId>,
    ) -> Result<HarvestWeightView, RepoError> {
        let weights = input.weights();
        if weights.is_empty() {
            return Err(CoreError::Validation("At least one weight is required".into()).into());
        }
        weights.validate()?;

        let mut tx = pool.begin().await?;
        let harvest = Self::lock(&mut tx, harvest_id).await?;
        let next = weights.resulting_status(harvest.status)?;

        let strain_name: String =
            sqlx::query_scalar("SELECT name FROM strains WHERE id = $1 AND facility_id = $2")
                .bind(input.strain_id)
                .bind(harvest.facility_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "strain",
                    id: input.strain_id,
                })?;

        let weight_id: DbId = sqlx::query_scalar(
            "INSERT INTO harvest_weights \
                 (harvest_id, strain_id, wet_weight_grams, dry_weight_grams, \
                  flower_weight_grams, shake_weight_grams, waste_weight_grams) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (harvest_id, strain_id) DO UPDATE SET \
                 wet_weight_grams = COALESCE(EXCLUDED.wet_weight_grams, harvest_weights.wet_weight_grams), \
                 dry_weight_grams = COALESCE(EXCLUDED.dry_weight_grams, harvest_weights.dry_weight_grams), \
                 flower_weight_grams = COALESCE(EXCLUDED.flower_weight_grams, harvest_weights.flower_weight_grams), \
                 shake_weight_grams = COALESCE(EXCLUDED.shake_weight_grams, harvest_weights.shake_weight_grams), \
                 waste_weight_grams = COALESCE(EXCLUDED.waste_weight_grams, harvest_weights.waste_weight_grams) \
             RETURNING id",
        )
        .bind(harvest.id)
        .bind(input.strain_id)
        .bind(weights.wet)
        .bind(weights.dry)
        .bind(weights.flower)
        .bind(weights.shake)
        .bind(weights.waste)
        .fetch_one(&mut *tx)
        .await?;

        if next != harvest.status {
            sqlx::query("UPDATE harvests SET status = $2 WHERE id = $1")
                .bind(harvest.id)
                .bind(next.as_str())
                .execute(&mut *tx)
                .await?;
        }

        Self::log(
            &mut tx,
            &harvest,
            AuditEventKind::HarvestStrainWeightRecorded {
                strain_name,
                wet_weight_grams: weights.wet,
                dry_weight_grams: weights.dry,
                flower_weight_grams: weights.flower,
                shake_weight_grams: weights.shake,
                waste_weight_grams: weights.waste,
            },
            None,
            user_id,
        )
        .await?;

        let query = format!("{WEIGHT_SELECT} WHERE w.id = $1");
        let weight = sqlx::query_as::<_, HarvestWeight>(&query)
            .bind(weight_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(weight.into())
    }

    /// `recordWaste`: add to the harvest's accumulated waste. Allowed at any
    /// stage.
    pub async fn record_waste(
        pool: &PgPool,
        harvest_id: DbId,
        waste_weight_grams: Grams,
        notes: Option<String>,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        validate_weight("waste", waste_weight_grams)?;

        let mut tx = pool.begin().await?;
        let harvest = Self::lock(&mut tx, harvest_id).await?;
        harvest.status.apply(HarvestAction::RecordWaste)?;

        let query = format!(
            "UPDATE harvests SET waste_weight_grams = waste_weight_grams + $2 WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Harvest>(&query)
            .bind(harvest.id)
            .bind(waste_weight_grams)
            .fetch_one(&mut *tx)
            .await?;

        Self::log(
            &mut tx,
            &updated,
            AuditEventKind::HarvestWasteRecorded { waste_weight_grams },
            notes,
            user_id,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// `finishDrying`: `dry_weight_recorded -> drying_finished`.
    pub async fn finish_drying(
        pool: &PgPool,
        harvest_id: DbId,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        Self::advance(pool, harvest_id, Stage::FinishDrying, user_id).await
    }

    /// `startTrimming`: `drying_finished -> trimming_started`.
    pub async fn start_trimming(
        pool: &PgPool,
        harvest_id: DbId,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        Self::advance(pool, harvest_id, Stage::StartTrimming, user_id).await
    }

    /// `finishTrimming`: `trimming_started -> trimming_finished`.
    pub async fn finish_trimming(
        pool: &PgPool,
        harvest_id: DbId,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        Self::advance(pool, harvest_id, Stage::FinishTrimming, user_id).await
    }

    /// `finishCuring`: `trimming_finished -> curing_finished`.
    pub async fn finish_curing(
        pool: &PgPool,
        harvest_id: DbId,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        Self::advance(pool, harvest_id, Stage::FinishCuring, user_id).await
    }

    async fn advance(
        pool: &PgPool,
        harvest_id: DbId,
        stage: Stage,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        let mut tx = pool.begin().await?;
        let harvest = Self::lock(&mut tx, harvest_id).await?;
        let next = harvest.status.apply(stage.action())?;

        let now = Utc::now();
        let days = days_elapsed(stage.since(&harvest), now);

        let query = format!(
            "UPDATE harvests SET status = $2, {column} = $3 WHERE id = $1 RETURNING {COLUMNS}",
            column = stage.column()
        );
        let updated = sqlx::query_as::<_, Harvest>(&query)
            .bind(harvest.id)
            .bind(next.as_str())
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        Self::log(&mut tx, &updated, stage.event(days), None, user_id).await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// `markReviewed`: set the admin-reviewed flag. It can be set only once.
    pub async fn mark_reviewed(
        pool: &PgPool,
        harvest_id: DbId,
        user_id: Option<DbId>,
    ) -> Result<Harvest, RepoError> {
        let mut tx = pool.begin().await?;
        let harvest = Self::lock(&mut tx, harvest_id).await?;
        if harvest.admin_reviewed {
            return Err(CoreError::Conflict(format!(
                "Harvest {harvest_id} has already been reviewed"
            ))
            .into());
        }

        let query = format!(
            "UPDATE harvests SET admin_reviewed = TRUE, reviewed_by = $2, reviewed_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Harvest>(&query)
            .bind(harvest.id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        Self::log(
            &mut tx,
            &updated,
            AuditEventKind::HarvestAdminReviewed {},
            None,
            user_id,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Attach a free-text note to the harvest's timeline.
    pub async fn add_note(
        pool: &PgPool,
        harvest_id: DbId,
        notes: &str,
        user_id: Option<DbId>,
    ) -> Result<AuditEvent, RepoError> {
        let harvest = Self::find_by_id(pool, harvest_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "harvest",
                id: harvest_id,
            })?;

        let event = AuditRepo::log(
            pool,
            &NewAuditEvent::new(
                harvest.facility_id,
                TrackableType::Harvest,
                harvest.id,
                AuditEventKind::NoteAdded {},
                user_id,
            )
            .with_notes(Some(notes.trim().to_string())),
        )
        .await?;
        Ok(event)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Harvest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM harvests WHERE id = $1");
        sqlx::query_as::<_, Harvest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A facility's harvests, most recent harvest date first.
    pub async fn list(
        pool: &PgPool,
        facility_id: DbId,
        params: &HarvestListParams,
    ) -> Result<Vec<Harvest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM harvests \
             WHERE facility_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY harvest_date DESC, sequence_number DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Harvest>(&query)
            .bind(facility_id)
            .bind(params.status.map(HarvestStatus::as_str))
            .bind(clamp_limit(params.limit))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await
    }

    pub async fn plants(pool: &PgPool, harvest_id: DbId) -> Result<Vec<HarvestPlant>, sqlx::Error> {
        let query = format!("{PLANT_SELECT} WHERE hp.harvest_id = $1 ORDER BY hp.added_at, hp.plant_id");
        sqlx::query_as::<_, HarvestPlant>(&query)
            .bind(harvest_id)
            .fetch_all(pool)
            .await
    }

    pub async fn weights(pool: &PgPool, harvest_id: DbId) -> Result<Vec<HarvestWeight>, sqlx::Error> {
        let query = format!("{WEIGHT_SELECT} WHERE w.harvest_id = $1 ORDER BY s.name");
        sqlx::query_as::<_, HarvestWeight>(&query)
            .bind(harvest_id)
            .fetch_all(pool)
            .await
    }

    /// A harvest with its plants and weight rows (plus soft warnings).
    pub async fn detail(pool: &PgPool, id: DbId) -> Result<Option<HarvestDetail>, sqlx::Error> {
        let Some(harvest) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let plants = Self::plants(pool, id).await?;
        let weights = Self::weights(pool, id)
            .await?
            .into_iter()
            .map(HarvestWeightView::from)
            .collect();
        Ok(Some(HarvestDetail {
            harvest,
            plants,
            weights,
        }))
    }

    /// `flowerInventory`: per-strain totals across every harvest of the
    /// facility, reduced from the stored weight rows.
    pub async fn flower_inventory(
        pool: &PgPool,
        facility_id: DbId,
    ) -> Result<Vec<FlowerInventory>, sqlx::Error> {
        let query = format!(
            "{WEIGHT_SELECT} JOIN harvests h ON h.id = w.harvest_id WHERE h.facility_id = $1"
        );
        let rows = sqlx::query_as::<_, HarvestWeight>(&query)
            .bind(facility_id)
            .fetch_all(pool)
            .await?;
        let weights: Vec<_> = rows.iter().map(HarvestWeight::to_strain_weight).collect();
        Ok(flower_inventory(&weights))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn lock(conn: &mut PgConnection, id: DbId) -> Result<Harvest, RepoError> {
        let query = format!("SELECT {COLUMNS} FROM harvests WHERE id = $1 FOR NO KEY UPDATE");
        sqlx::query_as::<_, Harvest>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "harvest", id }.into())
    }

    async fn log(
        conn: &mut PgConnection,
        harvest: &Harvest,
        kind: AuditEventKind,
        notes: Option<String>,
        user_id: Option<DbId>,
    ) -> Result<AuditEvent, sqlx::Error> {
        AuditRepo::log(
            &mut *conn,
            &NewAuditEvent::new(
                harvest.facility_id,
                TrackableType::Harvest,
                harvest.id,
                kind,
                user_id,
            )
            .with_notes(notes),
        )
        .await
    }
}
