//! Harvest workflow: the stage machine, weight validation, naming and the
//! per-strain flower inventory reduction.
//!
//! ```text
//! created ─▶ wet_weight_recorded ─▶ drying_started ─▶ dry_weight_recorded
//!   ─▶ drying_finished ─▶ trimming_started ─▶ trimming_finished ─▶ curing_finished
//! ```
//!
//! Every edge is triggered by an explicit recording action and stages cannot
//! be skipped. `admin_reviewed` is an orthogonal flag, not a status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GrowError;
use crate::plant::{GrowthPhase, PlantStatus};
use crate::types::{DbId, Grams, Timestamp};

text_enum! {
    /// Whole plants or a partial (e.g. top colas first) harvest.
    HarvestType as "harvest type" {
        WholePlant => "whole_plant",
        Partial => "partial",
    }
}

text_enum! {
    /// Pipeline stage of a harvest.
    HarvestStatus as "harvest status" {
        Created => "created",
        WetWeightRecorded => "wet_weight_recorded",
        DryingStarted => "drying_started",
        DryWeightRecorded => "dry_weight_recorded",
        DryingFinished => "drying_finished",
        TrimmingStarted => "trimming_started",
        TrimmingFinished => "trimming_finished",
        CuringFinished => "curing_finished",
    }
}

text_enum! {
    /// A recording action against a harvest.
    HarvestAction as "harvest action" {
        RecordWetWeight => "record_wet_weight",
        AddPlants => "add_plants",
        RecordStrainWetWeight => "record_strain_wet_weight",
        StartDrying => "start_drying",
        RecordDryWeight => "record_dry_weight",
        FinishDrying => "finish_drying",
        StartTrimming => "start_trimming",
        RecordTrimWeight => "record_trim_weight",
        FinishTrimming => "finish_trimming",
        FinishCuring => "finish_curing",
        RecordWaste => "record_waste",
    }
}

impl HarvestStatus {
    /// Apply an action, returning the resulting status or
    /// [`GrowError::InvalidHarvestTransition`] if it is out of order.
    pub fn apply(self, action: HarvestAction) -> Result<HarvestStatus, GrowError> {
        use HarvestAction as A;
        use HarvestStatus as S;

        let next = match (action, self) {
            (A::RecordWetWeight, S::Created) => Some(S::WetWeightRecorded),
            (A::AddPlants, S::Created | S::WetWeightRecorded) => Some(self),
            (A::RecordStrainWetWeight, S::Created | S::WetWeightRecorded | S::DryingStarted) => {
                Some(self)
            }
            (A::StartDrying, S::WetWeightRecorded) => Some(S::DryingStarted),
            (A::RecordDryWeight, S::DryingStarted | S::DryWeightRecorded) => {
                Some(S::DryWeightRecorded)
            }
            (A::FinishDrying, S::DryWeightRecorded) => Some(S::DryingFinished),
            (A::StartTrimming, S::DryingFinished) => Some(S::TrimmingStarted),
            (A::RecordTrimWeight, S::TrimmingStarted | S::TrimmingFinished) => Some(self),
            (A::FinishTrimming, S::TrimmingStarted) => Some(S::TrimmingFinished),
            (A::FinishCuring, S::TrimmingFinished) => Some(S::CuringFinished),
            (A::RecordWaste, _) => Some(self),
            _ => None,
        };

        next.ok_or(GrowError::InvalidHarvestTransition {
            status: self,
            action,
        })
    }

    /// Whether the curing stage has completed.
    pub fn is_complete(self) -> bool {
        self == HarvestStatus::CuringFinished
    }
}

/// Status a harvest starts in; recording a wet weight at creation counts as
/// the first stage.
pub fn initial_status(wet_weight_grams: Option<Grams>) -> HarvestStatus {
    match wet_weight_grams {
        Some(_) => HarvestStatus::WetWeightRecorded,
        None => HarvestStatus::Created,
    }
}

// ---------------------------------------------------------------------------
// Plants
// ---------------------------------------------------------------------------

/// Only active flowering plants can be harvested.
pub fn ensure_harvestable(
    plant_id: DbId,
    status: PlantStatus,
    phase: GrowthPhase,
) -> Result<(), GrowError> {
    crate::plant::ensure_active(plant_id, status)?;
    if phase != GrowthPhase::Flowering {
        return Err(GrowError::PlantNotFlowering { plant_id, phase });
    }
    Ok(())
}

/// The most common strain name among harvested plants. Ties go to the
/// alphabetically first name so the result is deterministic.
pub fn dominant_strain<'a, I>(strain_names: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in strain_names {
        *counts.entry(name).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (name, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((name, n)),
        })
        .map(|(name, _)| name.to_string())
}

// ---------------------------------------------------------------------------
// Naming and timing
// ---------------------------------------------------------------------------

/// Use the given name, or "Harvest {sequence}" when blank.
pub fn harvest_name(name: Option<&str>, sequence_number: i32) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => format!("Harvest {sequence_number}"),
    }
}

/// Whole days elapsed between two stage timestamps (never negative).
pub fn days_elapsed(since: Timestamp, now: Timestamp) -> i64 {
    (now - since).num_days().max(0)
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Reject negative or non-finite weights.
pub fn validate_weight(field: &'static str, grams: Grams) -> Result<Grams, GrowError> {
    if grams.is_finite() && grams >= 0.0 {
        Ok(grams)
    } else {
        Err(GrowError::InvalidWeight {
            field,
            value: grams,
        })
    }
}

/// One `recordStrainWeight` call. Absent fields leave stored values alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrainWeightInput {
    pub wet: Option<Grams>,
    pub dry: Option<Grams>,
    pub flower: Option<Grams>,
    pub shake: Option<Grams>,
    pub waste: Option<Grams>,
}

impl StrainWeightInput {
    pub fn is_empty(&self) -> bool {
        self.wet.is_none()
            && self.dry.is_none()
            && self.flower.is_none()
            && self.shake.is_none()
            && self.waste.is_none()
    }

    /// Validate every present field.
    pub fn validate(&self) -> Result<(), GrowError> {
        let fields = [
            ("wet", self.wet),
            ("dry", self.dry),
            ("flower", self.flower),
            ("shake", self.shake),
            ("waste", self.waste),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                validate_weight(field, v)?;
            }
        }
        Ok(())
    }

    /// Stage actions implied by the fields present in this call.
    pub fn actions(&self) -> Vec<HarvestAction> {
        let mut actions = Vec::new();
        if self.wet.is_some() {
            actions.push(HarvestAction::RecordStrainWetWeight);
        }
        if self.dry.is_some() {
            actions.push(HarvestAction::RecordDryWeight);
        }
        if self.flower.is_some() || self.shake.is_some() {
            actions.push(HarvestAction::RecordTrimWeight);
        }
        if self.waste.is_some() {
            actions.push(HarvestAction::RecordWaste);
        }
        actions
    }

    /// Status after recording this input, checking each implied action
    /// against the status the harvest is in when the call arrives.
    pub fn resulting_status(&self, current: HarvestStatus) -> Result<HarvestStatus, GrowError> {
        let mut next = current;
        for action in self.actions() {
            let after = current.apply(action)?;
            if after != current {
                next = after;
            }
        }
        Ok(next)
    }
}

/// Stored per-(harvest, strain) weights, as read for aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrainWeight {
    pub harvest_id: DbId,
    pub strain_id: DbId,
    pub strain_name: String,
    pub wet_weight_grams: Option<Grams>,
    pub dry_weight_grams: Option<Grams>,
    pub flower_weight_grams: Option<Grams>,
    pub shake_weight_grams: Option<Grams>,
    pub waste_weight_grams: Option<Grams>,
}

text_enum! {
    /// Soft weight-conservation checks, surfaced for display only.
    WeightWarning as "weight warning" {
        DryExceedsWet => "dry_exceeds_wet",
        TrimExceedsDry => "trim_exceeds_dry",
    }
}

/// Conservation warnings for one strain row: `dry <= wet` and
/// `flower + shake + waste <= dry`. Never used to reject input.
pub fn weight_warnings(w: &StrainWeight) -> Vec<WeightWarning> {
    let mut warnings = Vec::new();
    if let (Some(wet), Some(dry)) = (w.wet_weight_grams, w.dry_weight_grams) {
        if dry > wet {
            warnings.push(WeightWarning::DryExceedsWet);
        }
    }
    if let Some(dry) = w.dry_weight_grams {
        let trimmed = w.flower_weight_grams.unwrap_or(0.0)
            + w.shake_weight_grams.unwrap_or(0.0)
            + w.waste_weight_grams.unwrap_or(0.0);
        if trimmed > dry {
            warnings.push(WeightWarning::TrimExceedsDry);
        }
    }
    warnings
}

/// Per-strain totals across every harvest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowerInventory {
    pub strain_id: DbId,
    pub strain_name: String,
    pub harvest_count: i64,
    pub dry_weight_grams: Grams,
    pub flower_weight_grams: Grams,
    pub shake_weight_grams: Grams,
}

/// Reduce stored strain weights into per-strain totals, ordered by strain
/// name. Strains are never merged with each other.
pub fn flower_inventory(rows: &[StrainWeight]) -> Vec<FlowerInventory> {
    let mut by_strain: BTreeMap<(String, DbId), FlowerInventory> = BTreeMap::new();
    for row in rows {
        let entry = by_strain
            .entry((row.strain_name.clone(), row.strain_id))
            .or_insert_with(|| FlowerInventory {
                strain_id: row.strain_id,
                strain_name: row.strain_name.clone(),
                harvest_count: 0,
                dry_weight_grams: 0.0,
                flower_weight_grams: 0.0,
                shake_weight_grams: 0.0,
            });
        entry.harvest_count += 1;
        entry.dry_weight_grams += row.dry_weight_grams.unwrap_or(0.0);
        entry.flower_weight_grams += row.flower_weight_grams.unwrap_or(0.0);
        entry.shake_weight_grams += row.shake_weight_grams.unwrap_or(0.0);
    }
    by_strain.into_values().collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn weight(harvest_id: DbId, strain_id: DbId, name: &str) -> StrainWeight {
        StrainWeight {
            harvest_id,
            strain_id,
            strain_name: name.to_string(),
            wet_weight_grams: None,
            dry_weight_grams: None,
            flower_weight_grams: None,
            shake_weight_grams: None,
            waste_weight_grams: None,
        }
    }

    #[test]
    fn happy_path_walks_every_stage() {
        use HarvestAction as A;
        let steps = [
            (A::RecordWetWeight, HarvestStatus::WetWeightRecorded),
            (A::StartDrying, HarvestStatus::DryingStarted),
            (A::RecordDryWeight, HarvestStatus::DryWeightRecorded),
            (A::RecordDryWeight, HarvestStatus::DryWeightRecorded),
            (A::FinishDrying, HarvestStatus::DryingFinished),
            (A::StartTrimming, HarvestStatus::TrimmingStarted),
            (A::RecordTrimWeight, HarvestStatus::TrimmingStarted),
            (A::FinishTrimming, HarvestStatus::TrimmingFinished),
            (A::FinishCuring, HarvestStatus::CuringFinished),
        ];
        let mut status = HarvestStatus::Created;
        for (action, expected) in steps {
            status = status.apply(action).unwrap();
            assert_eq!(status, expected, "after {action}");
        }
        assert!(status.is_complete());
    }

    #[test]
    fn stages_cannot_be_skipped() {
        assert_matches!(
            HarvestStatus::Created.apply(HarvestAction::StartDrying),
            Err(GrowError::InvalidHarvestTransition {
                status: HarvestStatus::Created,
                action: HarvestAction::StartDrying
            })
        );
        assert!(HarvestStatus::DryingStarted
            .apply(HarvestAction::FinishDrying)
            .is_err());
        assert!(HarvestStatus::DryingFinished
            .apply(HarvestAction::FinishTrimming)
            .is_err());
        assert!(HarvestStatus::CuringFinished
            .apply(HarvestAction::FinishCuring)
            .is_err());
    }

    #[test]
    fn wet_weight_is_recorded_once() {
        assert!(HarvestStatus::WetWeightRecorded
            .apply(HarvestAction::RecordWetWeight)
            .is_err());
    }

    #[test]
    fn flower_weight_requires_trimming() {
        let input = StrainWeightInput {
            flower: Some(120.0),
            ..Default::default()
        };
        assert!(input.resulting_status(HarvestStatus::DryingFinished).is_err());
        assert_eq!(
            input.resulting_status(HarvestStatus::TrimmingStarted).unwrap(),
            HarvestStatus::TrimmingStarted
        );
    }

    #[test]
    fn dry_weight_advances_status() {
        let input = StrainWeightInput {
            dry: Some(500.0),
            ..Default::default()
        };
        assert_eq!(
            input.resulting_status(HarvestStatus::DryingStarted).unwrap(),
            HarvestStatus::DryWeightRecorded
        );
        assert!(input.resulting_status(HarvestStatus::Created).is_err());
    }

    #[test]
    fn mixed_input_is_checked_field_by_field() {
        let input = StrainWeightInput {
            wet: Some(900.0),
            dry: Some(300.0),
            ..Default::default()
        };
        assert_eq!(
            input.resulting_status(HarvestStatus::DryingStarted).unwrap(),
            HarvestStatus::DryWeightRecorded
        );
        // Wet weights are closed once dry weights have been recorded.
        assert!(input
            .resulting_status(HarvestStatus::DryWeightRecorded)
            .is_err());
    }

    #[test]
    fn waste_is_accepted_at_any_stage() {
        for status in HarvestStatus::ALL {
            assert_eq!(status.apply(HarvestAction::RecordWaste).unwrap(), *status);
        }
    }

    #[test]
    fn initial_status_depends_on_wet_weight() {
        assert_eq!(initial_status(None), HarvestStatus::Created);
        assert_eq!(initial_status(Some(1000.0)), HarvestStatus::WetWeightRecorded);
    }

    #[test]
    fn only_active_flowering_plants_are_harvestable() {
        assert!(ensure_harvestable(1, PlantStatus::Active, GrowthPhase::Flowering).is_ok());
        assert_matches!(
            ensure_harvestable(1, PlantStatus::Active, GrowthPhase::Vegetative),
            Err(GrowError::PlantNotFlowering { phase: GrowthPhase::Vegetative, .. })
        );
        assert_matches!(
            ensure_harvestable(1, PlantStatus::Harvested, GrowthPhase::Flowering),
            Err(GrowError::PlantNotActive { .. })
        );
    }

    #[test]
    fn dominant_strain_picks_most_common() {
        let names = ["OG Kush", "Blue Dream", "Blue Dream"];
        assert_eq!(dominant_strain(names).as_deref(), Some("Blue Dream"));
        let tie = ["OG Kush", "Blue Dream"];
        assert_eq!(dominant_strain(tie).as_deref(), Some("Blue Dream"));
        assert_eq!(dominant_strain(Vec::<&str>::new()), None);
    }

    #[test]
    fn blank_names_become_sequential() {
        assert_eq!(harvest_name(None, 3), "Harvest 3");
        assert_eq!(harvest_name(Some(""), 4), "Harvest 4");
        assert_eq!(harvest_name(Some("Fall run"), 5), "Fall run");
    }

    #[test]
    fn days_elapsed_never_negative() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(days_elapsed(start, start + Duration::days(9)), 9);
        assert_eq!(days_elapsed(start, start + Duration::hours(20)), 0);
        assert_eq!(days_elapsed(start + Duration::days(1), start), 0);
    }

    #[test]
    fn weights_must_be_finite_and_non_negative() {
        assert!(validate_weight("wet", 0.0).is_ok());
        assert!(validate_weight("wet", -0.5).is_err());
        assert!(validate_weight("wet", f64::NAN).is_err());
        let bad = StrainWeightInput {
            shake: Some(-1.0),
            ..Default::default()
        };
        assert_matches!(bad.validate(), Err(GrowError::InvalidWeight { field: "shake", .. }));
        assert!(StrainWeightInput::default().is_empty());
    }

    #[test]
    fn conservation_warnings_are_soft() {
        let mut w = weight(1, 1, "Blue Dream");
        w.wet_weight_grams = Some(1000.0);
        w.dry_weight_grams = Some(250.0);
        w.flower_weight_grams = Some(180.0);
        w.shake_weight_grams = Some(50.0);
        assert!(weight_warnings(&w).is_empty());

        w.waste_weight_grams = Some(40.0);
        assert_eq!(weight_warnings(&w), vec![WeightWarning::TrimExceedsDry]);

        w.dry_weight_grams = Some(1200.0);
        assert_eq!(weight_warnings(&w), vec![WeightWarning::DryExceedsWet]);
    }

    #[test]
    fn inventory_keeps_strains_separate() {
        let mut blue = weight(1, 10, "Blue Dream");
        blue.dry_weight_grams = Some(500.0);
        let mut og = weight(1, 20, "OG Kush");
        og.dry_weight_grams = Some(300.0);

        let inventory = flower_inventory(&[og, blue]);
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].strain_name, "Blue Dream");
        assert_eq!(inventory[0].dry_weight_grams, 500.0);
        assert_eq!(inventory[1].strain_name, "OG Kush");
        assert_eq!(inventory[1].dry_weight_grams, 300.0);
    }

    #[test]
    fn inventory_sums_across_harvests() {
        let mut a = weight(1, 10, "Blue Dream");
        a.flower_weight_grams = Some(200.0);
        a.shake_weight_grams = Some(40.0);
        let mut b = weight(2, 10, "Blue Dream");
        b.flower_weight_grams = Some(150.0);

        let inventory = flower_inventory(&[a, b]);
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].harvest_count, 2);
        assert_eq!(inventory[0].flower_weight_grams, 350.0);
        assert_eq!(inventory[0].shake_weight_grams, 40.0);
        assert_eq!(inventory[0].dry_weight_grams, 0.0);
    }
}
