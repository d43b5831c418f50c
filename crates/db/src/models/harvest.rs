//! Harvest, membership and per-strain weight rows and DTOs.

use canopy_core::harvest::{
    weight_warnings, HarvestStatus, HarvestType, StrainWeight, StrainWeightInput, WeightWarning,
};
use canopy_core::types::{DbId, Grams, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `harvests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Harvest {
    pub id: DbId,
    pub facility_id: DbId,
    /// Per-facility counter behind the default "Harvest N" name.
    pub sequence_number: i32,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub harvest_type: HarvestType,
    pub harvest_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: HarvestStatus,
    pub wet_weight_grams: Option<Grams>,
    /// Accumulated across `record_waste` calls.
    pub waste_weight_grams: Grams,
    pub drying_room_id: Option<DbId>,
    pub notes: Option<String>,
    pub admin_reviewed: bool,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub drying_started_at: Option<Timestamp>,
    pub drying_finished_at: Option<Timestamp>,
    pub trimming_started_at: Option<Timestamp>,
    pub trimming_finished_at: Option<Timestamp>,
    pub curing_finished_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from `harvest_plants`. Membership only grows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HarvestPlant {
    pub harvest_id: DbId,
    pub plant_id: DbId,
    pub strain_id: DbId,
    pub plant_uid: String,
    pub metrc_label: Option<String>,
    pub added_at: Timestamp,
}

/// A row from `harvest_weights`, joined with the strain name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HarvestWeight {
    pub id: DbId,
    pub harvest_id: DbId,
    pub strain_id: DbId,
    pub strain_name: String,
    pub wet_weight_grams: Option<Grams>,
    pub dry_weight_grams: Option<Grams>,
    pub flower_weight_grams: Option<Grams>,
    pub shake_weight_grams: Option<Grams>,
    pub waste_weight_grams: Option<Grams>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl HarvestWeight {
    pub fn to_strain_weight(&self) -> StrainWeight {
        StrainWeight {
            harvest_id: self.harvest_id,
            strain_id: self.strain_id,
            strain_name: self.strain_name.clone(),
            wet_weight_grams: self.wet_weight_grams,
            dry_weight_grams: self.dry_weight_grams,
            flower_weight_grams: self.flower_weight_grams,
            shake_weight_grams: self.shake_weight_grams,
            waste_weight_grams: self.waste_weight_grams,
        }
    }
}

/// A strain weight row with its soft conservation warnings.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestWeightView {
    #[serde(flatten)]
    pub weight: HarvestWeight,
    pub warnings: Vec<WeightWarning>,
}

impl From<HarvestWeight> for HarvestWeightView {
    fn from(weight: HarvestWeight) -> Self {
        let warnings = weight_warnings(&weight.to_strain_weight());
        Self { weight, warnings }
    }
}

/// A harvest with its plants and weights.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestDetail {
    #[serde(flatten)]
    pub harvest: Harvest,
    pub plants: Vec<HarvestPlant>,
    pub weights: Vec<HarvestWeightView>,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHarvest {
    /// Blank names become "Harvest N".
    #[validate(length(max = 200))]
    pub name: Option<String>,
    pub harvest_type: HarvestType,
    /// Defaults to today (UTC).
    pub harvest_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 1000))]
    pub plant_ids: Vec<DbId>,
    pub wet_weight_grams: Option<Grams>,
    pub drying_room_id: Option<DbId>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddHarvestPlants {
    #[validate(length(min = 1, max = 1000))]
    pub plant_ids: Vec<DbId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordWetWeight {
    pub wet_weight_grams: Grams,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartDrying {
    pub drying_room_id: Option<DbId>,
}

/// Any subset of a strain's weights; absent fields keep their stored value.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordStrainWeight {
    pub strain_id: DbId,
    pub wet_weight_grams: Option<Grams>,
    pub dry_weight_grams: Option<Grams>,
    pub flower_weight_grams: Option<Grams>,
    pub shake_weight_grams: Option<Grams>,
    pub waste_weight_grams: Option<Grams>,
}

impl RecordStrainWeight {
    pub fn weights(&self) -> StrainWeightInput {
        StrainWeightInput {
            wet: self.wet_weight_grams,
            dry: self.dry_weight_grams,
            flower: self.flower_weight_grams,
            shake: self.shake_weight_grams,
            waste: self.waste_weight_grams,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordWaste {
    pub waste_weight_grams: Grams,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HarvestNote {
    #[validate(length(min = 1, max = 5000))]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarvestListParams {
    pub status: Option<HarvestStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
