//! Repository for the append-only `audit_events` table.

use canopy_core::pagination::{clamp_limit, clamp_offset};
use canopy_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::audit::{AuditEvent, AuditListParams, NewAuditEvent};

/// Column list for `audit_events` queries.
const COLUMNS: &str = "\
    id, facility_id, trackable_type, trackable_id, event_type, metadata, \
    notes, user_id, created_at";

/// Optional trackable filter shared by `list` and `count` ($2 type, $3 id).
const TRACKABLE_FILTER: &str = "\
    ($2::TEXT IS NULL OR trackable_type = $2) \
    AND ($3::BIGINT IS NULL OR trackable_id = $3)";

/// Appends and reads audit events. There is no update or delete.
pub struct AuditRepo;

impl AuditRepo {
    /// Append one event.
    ///
    /// Generic over the executor so domain operations can record their event
    /// inside the same transaction as the change it describes.
    pub async fn log<'e, E>(executor: E, event: &NewAuditEvent) -> Result<AuditEvent, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO audit_events \
                 (facility_id, trackable_type, trackable_id, event_type, metadata, notes, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(event.facility_id)
            .bind(event.trackable_type.as_str())
            .bind(event.trackable_id)
            .bind(event.kind.event_type())
            .bind(event.kind.metadata())
            .bind(&event.notes)
            .bind(event.user_id)
            .fetch_one(executor)
            .await
    }

    /// Most recent first. Facility-wide unless a trackable filter is given.
    pub async fn list(
        pool: &PgPool,
        facility_id: DbId,
        params: &AuditListParams,
    ) -> Result<Vec<AuditEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_events \
             WHERE facility_id = $1 AND {TRACKABLE_FILTER} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(facility_id)
            .bind(params.trackable_type.map(|t| t.as_str()))
            .bind(params.trackable_id)
            .bind(clamp_limit(params.limit))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await
    }

    /// Total matching events, for pagination.
    pub async fn count(
        pool: &PgPool,
        facility_id: DbId,
        params: &AuditListParams,
    ) -> Result<i64, sqlx::Error> {
        let query =
            format!("SELECT COUNT(*) FROM audit_events WHERE facility_id = $1 AND {TRACKABLE_FILTER}");
        sqlx::query_scalar(&query)
            .bind(facility_id)
            .bind(params.trackable_type.map(|t| t.as_str()))
            .bind(params.trackable_id)
            .fetch_one(pool)
            .await
    }
}
