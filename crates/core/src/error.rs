use crate::harvest::{HarvestAction, HarvestStatus};
use crate::metrc::{TagFormatIssue, TagStatus};
use crate::plant::{GrowthPhase, PlantStatus};
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Domain failures of the Grow subsystem.
///
/// Every variant is recoverable by the caller and maps to a distinct,
/// machine-readable [`code`](GrowError::code) so clients can tell a capacity
/// problem from a tag problem from a stale reference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrowError {
    #[error("Tray {tray_id} is full ({occupancy}/{capacity} plants)")]
    CapacityExceeded {
        tray_id: DbId,
        capacity: i32,
        occupancy: i64,
    },

    #[error("METRC tag {tag} is not available (status: {status})")]
    TagNotAvailable { tag: String, status: TagStatus },

    #[error("METRC tag {0} not found")]
    TagNotFound(String),

    #[error("METRC tag {tag} is already {status} and cannot be voided")]
    TagAlreadyAssigned { tag: String, status: TagStatus },

    #[error("Invalid METRC tag '{tag}': {issue}")]
    InvalidTagFormat { tag: String, issue: TagFormatIssue },

    #[error("METRC tag status cannot change from {from} to {to}")]
    InvalidTagTransition { from: TagStatus, to: TagStatus },

    #[error("Plant {plant_id} is not active (status: {status})")]
    PlantNotActive { plant_id: DbId, status: PlantStatus },

    #[error("Plant not found: {0}")]
    PlantNotFound(String),

    #[error("Plant {plant_id} already carries METRC tag {tag}")]
    PlantAlreadyTagged { plant_id: DbId, tag: String },

    #[error("Plant {plant_id} already belongs to batch {batch_id}")]
    PlantAlreadyBatched { plant_id: DbId, batch_id: DbId },

    #[error("Plant of strain {plant_strain_id} cannot join a batch of strain {batch_strain_id}")]
    BatchStrainMismatch {
        batch_strain_id: DbId,
        plant_strain_id: DbId,
    },

    #[error("Plant {plant_id} cannot be harvested in the {phase} phase")]
    PlantNotFlowering { plant_id: DbId, phase: GrowthPhase },

    #[error("Observation needs notes or at least one photo")]
    EmptyObservation,

    #[error("Cannot {action} a harvest whose status is {status}")]
    InvalidHarvestTransition {
        status: HarvestStatus,
        action: HarvestAction,
    },

    #[error("Invalid {field} weight: {value} g")]
    InvalidWeight { field: &'static str, value: f64 },
}

impl GrowError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            GrowError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            GrowError::TagNotAvailable { .. } => "TAG_NOT_AVAILABLE",
            GrowError::TagNotFound(_) => "TAG_NOT_FOUND",
            GrowError::TagAlreadyAssigned { .. } => "TAG_ALREADY_ASSIGNED",
            GrowError::InvalidTagFormat { .. } => "INVALID_TAG_FORMAT",
            GrowError::InvalidTagTransition { .. } => "INVALID_TAG_TRANSITION",
            GrowError::PlantNotActive { .. } => "PLANT_NOT_ACTIVE",
            GrowError::PlantNotFound(_) => "PLANT_NOT_FOUND",
            GrowError::PlantAlreadyTagged { .. } => "PLANT_ALREADY_TAGGED",
            GrowError::PlantAlreadyBatched { .. } => "PLANT_ALREADY_BATCHED",
            GrowError::BatchStrainMismatch { .. } => "BATCH_STRAIN_MISMATCH",
            GrowError::PlantNotFlowering { .. } => "PLANT_NOT_FLOWERING",
            GrowError::EmptyObservation => "EMPTY_OBSERVATION",
            GrowError::InvalidHarvestTransition { .. } => "INVALID_HARVEST_TRANSITION",
            GrowError::InvalidWeight { .. } => "INVALID_WEIGHT",
        }
    }
}
