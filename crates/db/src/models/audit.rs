//! Audit event rows.

use canopy_core::audit::{render_event, AuditEventKind, TrackableType};
use canopy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `audit_events` table. Never updated or deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEvent {
    pub id: DbId,
    pub facility_id: DbId,
    #[sqlx(try_from = "String")]
    pub trackable_type: TrackableType,
    pub trackable_id: DbId,
    pub event_type: String,
    pub metadata: serde_json::Value,
    pub notes: Option<String>,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// An event to append.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub facility_id: DbId,
    pub trackable_type: TrackableType,
    pub trackable_id: DbId,
    pub kind: AuditEventKind,
    pub notes: Option<String>,
    pub user_id: Option<DbId>,
}

impl NewAuditEvent {
    pub fn new(
        facility_id: DbId,
        trackable_type: TrackableType,
        trackable_id: DbId,
        kind: AuditEventKind,
        user_id: Option<DbId>,
    ) -> Self {
        Self {
            facility_id,
            trackable_type,
            trackable_id,
            kind,
            notes: None,
            user_id,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// An event with its rendered title and detail line.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEventView {
    #[serde(flatten)]
    pub event: AuditEvent,
    pub label: Option<&'static str>,
    pub detail: Option<String>,
}

impl From<AuditEvent> for AuditEventView {
    fn from(event: AuditEvent) -> Self {
        let rendered = render_event(&event.event_type, &event.metadata);
        Self {
            label: rendered.label,
            detail: rendered.detail,
            event,
        }
    }
}

/// Filters for the audit feed. Without a trackable the feed is facility-wide.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditListParams {
    pub trackable_type: Option<TrackableType>,
    pub trackable_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
