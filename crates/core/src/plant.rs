//! Plant lifecycle rules.
//!
//! `growth_phase` is administrative and freely changeable in any direction;
//! `status` has a single non-terminal state (`active`). Only active plants
//! occupy a tray slot.

use serde::Serialize;

use crate::error::GrowError;
use crate::types::DbId;

text_enum! {
    /// Administrative growth stage.
    GrowthPhase as "growth phase" {
        Immature => "immature",
        Vegetative => "vegetative",
        Flowering => "flowering",
    }
}

text_enum! {
    /// Plant status. Everything but `active` is terminal.
    PlantStatus as "plant status" {
        Active => "active",
        Harvested => "harvested",
        Destroyed => "destroyed",
        Removed => "removed",
    }
}

impl PlantStatus {
    pub fn is_terminal(self) -> bool {
        self != PlantStatus::Active
    }
}

/// Fail with [`GrowError::PlantNotActive`] unless the plant is active.
pub fn ensure_active(plant_id: DbId, status: PlantStatus) -> Result<(), GrowError> {
    if status == PlantStatus::Active {
        Ok(())
    } else {
        Err(GrowError::PlantNotActive { plant_id, status })
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// What a move request actually has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// Target is the plant's current tray; nothing to write.
    Stay,
    /// Relocate into another tray (capacity must be checked on `to`).
    Relocate { from: Option<DbId>, to: DbId },
}

/// Decide how to move a plant. Capacity of the target tray is checked by the
/// caller while holding the tray lock.
pub fn plan_move(
    plant_id: DbId,
    status: PlantStatus,
    current_tray: Option<DbId>,
    target_tray: DbId,
) -> Result<MovePlan, GrowError> {
    ensure_active(plant_id, status)?;
    if current_tray == Some(target_tray) {
        Ok(MovePlan::Stay)
    } else {
        Ok(MovePlan::Relocate {
            from: current_tray,
            to: target_tray,
        })
    }
}

// ---------------------------------------------------------------------------
// Phase change
// ---------------------------------------------------------------------------

/// Result of evaluating a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseChange {
    Unchanged,
    Changed { from: GrowthPhase, to: GrowthPhase },
}

/// Evaluate a phase change. Any direction is allowed; biology is not modelled.
pub fn plan_phase_change(
    plant_id: DbId,
    status: PlantStatus,
    current: GrowthPhase,
    requested: GrowthPhase,
) -> Result<PhaseChange, GrowError> {
    ensure_active(plant_id, status)?;
    if current == requested {
        Ok(PhaseChange::Unchanged)
    } else {
        Ok(PhaseChange::Changed {
            from: current,
            to: requested,
        })
    }
}

// ---------------------------------------------------------------------------
// Retirement (destroy / remove)
// ---------------------------------------------------------------------------

text_enum! {
    /// Terminal statuses a grower can set directly. `harvested` is only
    /// reachable through a harvest.
    RetireStatus as "retire status" {
        Destroyed => "destroyed",
        Removed => "removed",
    }
}

impl From<RetireStatus> for PlantStatus {
    fn from(value: RetireStatus) -> Self {
        match value {
            RetireStatus::Destroyed => PlantStatus::Destroyed,
            RetireStatus::Removed => PlantStatus::Removed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tagging
// ---------------------------------------------------------------------------

/// Precondition for tagging: the plant is active and, unless this is an
/// explicit reassignment, carries no tag yet.
pub fn ensure_taggable(
    plant_id: DbId,
    status: PlantStatus,
    current_label: Option<&str>,
    reassign: bool,
) -> Result<(), GrowError> {
    ensure_active(plant_id, status)?;
    match current_label {
        Some(tag) if !reassign => Err(GrowError::PlantAlreadyTagged {
            plant_id,
            tag: tag.to_string(),
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// A key to resolve a plant by, in the order they should be tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Uid(String),
    MetrcLabel(String),
}

/// Keys to try for a free-form identifier: plant UID first, then METRC label.
///
/// Both kinds of identifier are upper-case, so scanned input is matched
/// case-insensitively.
pub fn lookup_keys(identifier: &str) -> Result<Vec<LookupKey>, GrowError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(GrowError::PlantNotFound(identifier.to_string()));
    }
    Ok(vec![
        LookupKey::Uid(trimmed.to_ascii_uppercase()),
        LookupKey::MetrcLabel(crate::metrc::normalize_tag(trimmed)),
    ])
}

// ---------------------------------------------------------------------------
// Bulk results
// ---------------------------------------------------------------------------

/// Per-item outcome of a sequential, non-transactional bulk operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BulkItem<T> {
    Succeeded { input: String, result: T },
    Failed { input: String, code: &'static str, error: String },
}

/// Aggregated report of a bulk operation. Items keep input order.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport<T> {
    pub items: Vec<BulkItem<T>>,
    pub succeeded: usize,
    pub failed: usize,
}

impl<T> Default for BulkReport<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            succeeded: 0,
            failed: 0,
        }
    }
}

impl<T> BulkReport<T> {
    /// Record one item's outcome.
    pub fn push(&mut self, input: impl Into<String>, outcome: Result<T, GrowError>) {
        let input = input.into();
        match outcome {
            Ok(result) => {
                self.succeeded += 1;
                self.items.push(BulkItem::Succeeded { input, result });
            }
            Err(err) => {
                self.failed += 1;
                self.items.push(BulkItem::Failed {
                    input,
                    code: err.code(),
                    error: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn only_active_is_non_terminal() {
        assert!(!PlantStatus::Active.is_terminal());
        assert!(PlantStatus::Harvested.is_terminal());
        assert!(PlantStatus::Destroyed.is_terminal());
        assert!(PlantStatus::Removed.is_terminal());
    }

    #[test]
    fn move_requires_active_plant() {
        assert_matches!(
            plan_move(1, PlantStatus::Harvested, None, 5),
            Err(GrowError::PlantNotActive { plant_id: 1, status: PlantStatus::Harvested })
        );
    }

    #[test]
    fn move_into_same_tray_is_a_no_op() {
        assert_eq!(plan_move(1, PlantStatus::Active, Some(5), 5).unwrap(), MovePlan::Stay);
        assert_eq!(
            plan_move(1, PlantStatus::Active, Some(5), 6).unwrap(),
            MovePlan::Relocate {
                from: Some(5),
                to: 6
            }
        );
    }

    #[test]
    fn phase_may_move_backwards() {
        assert_eq!(
            plan_phase_change(1, PlantStatus::Active, GrowthPhase::Flowering, GrowthPhase::Vegetative)
                .unwrap(),
            PhaseChange::Changed {
                from: GrowthPhase::Flowering,
                to: GrowthPhase::Vegetative
            }
        );
        assert_eq!(
            plan_phase_change(1, PlantStatus::Active, GrowthPhase::Immature, GrowthPhase::Immature)
                .unwrap(),
            PhaseChange::Unchanged
        );
        assert!(plan_phase_change(
            1,
            PlantStatus::Destroyed,
            GrowthPhase::Immature,
            GrowthPhase::Vegetative
        )
        .is_err());
    }

    #[test]
    fn retire_status_maps_to_terminal_plant_status() {
        assert_eq!(PlantStatus::from(RetireStatus::Destroyed), PlantStatus::Destroyed);
        assert_eq!(PlantStatus::from(RetireStatus::Removed), PlantStatus::Removed);
        assert!("harvested".parse::<RetireStatus>().is_err());
    }

    #[test]
    fn tagging_an_already_tagged_plant_needs_reassign() {
        let tag = "1A4000000000000000001";
        assert!(ensure_taggable(1, PlantStatus::Active, None, false).is_ok());
        assert_matches!(
            ensure_taggable(1, PlantStatus::Active, Some(tag), false),
            Err(GrowError::PlantAlreadyTagged { .. })
        );
        assert!(ensure_taggable(1, PlantStatus::Active, Some(tag), true).is_ok());
        assert_matches!(
            ensure_taggable(1, PlantStatus::Harvested, None, false),
            Err(GrowError::PlantNotActive { .. })
        );
    }

    #[test]
    fn lookup_tries_uid_then_normalised_label() {
        let keys = lookup_keys(" 1a4000000000000000001 ").unwrap();
        assert_eq!(
            keys,
            vec![
                LookupKey::Uid("1A4000000000000000001".into()),
                LookupKey::MetrcLabel("1A4000000000000000001".into()),
            ]
        );
        assert_matches!(lookup_keys("  "), Err(GrowError::PlantNotFound(_)));

        let scanned = lookup_keys("plt-01hx3k9v7q").unwrap();
        assert_eq!(scanned[0], LookupKey::Uid("PLT-01HX3K9V7Q".into()));
    }

    #[test]
    fn bulk_report_tracks_each_item() {
        let mut report: BulkReport<i64> = BulkReport::default();
        report.push("a", Ok(1));
        report.push("b", Err(GrowError::EmptyObservation));
        report.push("c", Ok(3));

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_matches!(&report.items[2], BulkItem::Succeeded { result: 3, .. });
        assert_matches!(
            &report.items[1],
            BulkItem::Failed { input, code: "EMPTY_OBSERVATION", .. } if input == "b"
        );
    }
}
