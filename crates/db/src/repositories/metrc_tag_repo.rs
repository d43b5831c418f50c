//! Repository for the `metrc_tags` registry.
//!
//! Every status change is a compare-and-swap `UPDATE ... WHERE status = ...`,
//! so of two concurrent writers racing for the same tag exactly one wins and
//! the other sees the tag's new status.

use std::collections::HashSet;

use canopy_core::error::{CoreError, GrowError};
use canopy_core::metrc::{
    ensure_assignable, ensure_voidable, normalize_tag, plan_import, TagImportReport,
    TagRejectReason, TagRejection, TagStatus, UsedReason,
};
use canopy_core::pagination::{clamp_limit, clamp_offset};
use canopy_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::metrc_tag::{MetrcTag, TagCounts, TagListParams};
use crate::RepoError;

/// Column list for `metrc_tags` queries.
const COLUMNS: &str = "\
    id, facility_id, tag, status, used_reason, plant_id, assigned_by, assigned_at, \
    used_at, voided_at, imported_by, created_at, updated_at";

/// Provides registry bookkeeping for METRC tags.
pub struct MetrcTagRepo;

impl MetrcTagRepo {
    // -----------------------------------------------------------------------
    // Import
    // -----------------------------------------------------------------------

    /// Bulk import. Each tag is validated on its own; valid, new tags are
    /// inserted as `available`, everything else is reported per item.
    ///
    /// A single `INSERT ... ON CONFLICT DO NOTHING` makes the insert atomic
    /// with the "already registered" check.
    pub async fn import(
        pool: &PgPool,
        facility_id: DbId,
        raw_tags: &[String],
        imported_by: Option<DbId>,
    ) -> Result<TagImportReport, sqlx::Error> {
        let plan = plan_import(raw_tags);
        let mut rejected = plan.rejected;

        let inserted: Vec<String> = if plan.valid.is_empty() {
            Vec::new()
        } else {
            sqlx::query_scalar(
                "INSERT INTO metrc_tags (facility_id, tag, imported_by) \
                 SELECT $1, tag, $3 FROM UNNEST($2::TEXT[]) AS t(tag) \
                 ON CONFLICT (tag) DO NOTHING \
                 RETURNING tag",
            )
            .bind(facility_id)
            .bind(&plan.valid)
            .bind(imported_by)
            .fetch_all(pool)
            .await?
        };

        let inserted_set: HashSet<&str> = inserted.iter().map(String::as_str).collect();
        let mut in_order = Vec::with_capacity(inserted.len());
        for tag in &plan.valid {
            if inserted_set.contains(tag.as_str()) {
                in_order.push(tag.clone());
            } else {
                rejected.push(TagRejection::new(tag.clone(), TagRejectReason::AlreadyRegistered));
            }
        }

        tracing::info!(
            facility_id,
            inserted = in_order.len(),
            rejected = rejected.len(),
            "METRC tags imported"
        );
        Ok(TagImportReport::new(in_order, rejected))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_tag<'e, E>(executor: E, tag: &str) -> Result<Option<MetrcTag>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM metrc_tags WHERE tag = $1");
        sqlx::query_as::<_, MetrcTag>(&query)
            .bind(normalize_tag(tag))
            .fetch_optional(executor)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        facility_id: DbId,
        params: &TagListParams,
    ) -> Result<Vec<MetrcTag>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM metrc_tags \
             WHERE facility_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY tag \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, MetrcTag>(&query)
            .bind(facility_id)
            .bind(params.status.map(|s| s.as_str()))
            .bind(clamp_limit(params.limit))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await
    }

    /// Number of tags per status.
    pub async fn counts(pool: &PgPool, facility_id: DbId) -> Result<TagCounts, RepoError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM metrc_tags WHERE facility_id = $1 GROUP BY status",
        )
        .bind(facility_id)
        .fetch_all(pool)
        .await?;

        let mut counts = TagCounts::default();
        for (status, n) in rows {
            match status.parse::<TagStatus>()? {
                TagStatus::Available => counts.available = n,
                TagStatus::Assigned => counts.assigned = n,
                TagStatus::Used => counts.used = n,
                TagStatus::Voided => counts.voided = n,
            }
        }
        Ok(counts)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// `available -> voided`. Only tags that were never assigned can be voided.
    pub async fn void(pool: &PgPool, facility_id: DbId, raw_tag: &str) -> Result<MetrcTag, RepoError> {
        let tag = normalize_tag(raw_tag);
        let query = format!(
            "UPDATE metrc_tags SET status = 'voided', voided_at = NOW() \
             WHERE tag = $1 AND facility_id = $2 AND status = 'available' \
             RETURNING {COLUMNS}"
        );
        let voided = sqlx::query_as::<_, MetrcTag>(&query)
            .bind(&tag)
            .bind(facility_id)
            .fetch_optional(pool)
            .await?;

        match voided {
            Some(row) => Ok(row),
            None => {
                let current = Self::find_in_facility(pool, facility_id, &tag).await?;
                ensure_voidable(&tag, current.status)?;
                Err(CoreError::Conflict(format!("METRC tag {tag} changed while being voided")).into())
            }
        }
    }

    /// `available -> assigned` to `plant_id`, inside the caller's transaction.
    ///
    /// Fails with `TagNotFound` if the facility has no such tag and with
    /// `TagNotAvailable` if it is not `available` any more.
    pub async fn assign_in_tx(
        conn: &mut PgConnection,
        facility_id: DbId,
        tag: &str,
        plant_id: DbId,
        assigned_by: Option<DbId>,
    ) -> Result<MetrcTag, RepoError> {
        let query = format!(
            "UPDATE metrc_tags \
             SET status = 'assigned', plant_id = $3, assigned_by = $4, assigned_at = NOW() \
             WHERE tag = $1 AND facility_id = $2 AND status = 'available' \
             RETURNING {COLUMNS}"
        );
        let assigned = sqlx::query_as::<_, MetrcTag>(&query)
            .bind(tag)
            .bind(facility_id)
            .bind(plant_id)
            .bind(assigned_by)
            .fetch_optional(&mut *conn)
            .await?;

        match assigned {
            Some(row) => Ok(row),
            None => {
                let current = Self::find_in_facility(&mut *conn, facility_id, tag).await?;
                ensure_assignable(tag, current.status)?;
                Err(CoreError::Conflict(format!("METRC tag {tag} changed while being assigned")).into())
            }
        }
    }

    /// `assigned -> used` for the tag currently bound to `plant_id`, if any.
    pub async fn retire_for_plant(
        conn: &mut PgConnection,
        plant_id: DbId,
        reason: UsedReason,
    ) -> Result<Option<MetrcTag>, sqlx::Error> {
        let query = format!(
            "UPDATE metrc_tags SET status = 'used', used_reason = $2, used_at = NOW() \
             WHERE plant_id = $1 AND status = 'assigned' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MetrcTag>(&query)
            .bind(plant_id)
            .bind(reason.as_str())
            .fetch_optional(&mut *conn)
            .await
    }

    /// `assigned -> used (consumed)` for every listed plant's tag.
    pub async fn consume_for_plants(
        conn: &mut PgConnection,
        plant_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE metrc_tags SET status = 'used', used_reason = 'consumed', used_at = NOW() \
             WHERE plant_id = ANY($1) AND status = 'assigned'",
        )
        .bind(plant_ids)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_in_facility<'e, E>(
        executor: E,
        facility_id: DbId,
        tag: &str,
    ) -> Result<MetrcTag, RepoError>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM metrc_tags WHERE tag = $1 AND facility_id = $2");
        sqlx::query_as::<_, MetrcTag>(&query)
            .bind(tag)
            .bind(facility_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| GrowError::TagNotFound(tag.to_string()).into())
    }
}
