//! Plant batch rules.
//!
//! `initial_count` is a snapshot taken at creation; `active_plant_count` is
//! always derived from member statuses.

use std::collections::HashSet;

use crate::error::{CoreError, GrowError};
use crate::plant::PlantStatus;
use crate::types::DbId;

text_enum! {
    /// How the batch was propagated.
    BatchType as "batch type" {
        Seed => "seed",
        Clone => "clone",
        TissueCulture => "tissue_culture",
    }
}

/// Validate a plant id list (batch members, harvested plants): non-empty and
/// free of duplicates.
pub fn validate_member_ids(plant_ids: &[DbId]) -> Result<(), CoreError> {
    if plant_ids.is_empty() {
        return Err(CoreError::Validation(
            "At least one plant is required".into(),
        ));
    }
    let mut seen = HashSet::with_capacity(plant_ids.len());
    if let Some(dup) = plant_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(CoreError::Validation(format!(
            "Plant {dup} is listed more than once"
        )));
    }
    Ok(())
}

/// A plant may join a batch only once.
pub fn ensure_unbatched(plant_id: DbId, current_batch: Option<DbId>) -> Result<(), GrowError> {
    match current_batch {
        Some(batch_id) => Err(GrowError::PlantAlreadyBatched { plant_id, batch_id }),
        None => Ok(()),
    }
}

/// Every member of a batch is of the batch's strain.
pub fn ensure_batch_strain(batch_strain_id: DbId, plant_strain_id: DbId) -> Result<(), GrowError> {
    if batch_strain_id == plant_strain_id {
        Ok(())
    } else {
        Err(GrowError::BatchStrainMismatch {
            batch_strain_id,
            plant_strain_id,
        })
    }
}

/// Count members that are still active.
pub fn active_plant_count<I>(member_statuses: I) -> i64
where
    I: IntoIterator<Item = PlantStatus>,
{
    member_statuses
        .into_iter()
        .filter(|s| *s == PlantStatus::Active)
        .count() as i64
}
