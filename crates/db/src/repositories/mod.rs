//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` (or a connection inside a caller's transaction) as the first
//! argument.

pub mod audit_repo;
pub mod batch_repo;
pub mod facility_repo;
pub mod harvest_repo;
pub mod metrc_tag_repo;
pub mod plant_event_repo;
pub mod plant_repo;
pub mod rack_repo;
pub mod room_repo;
pub mod stats_repo;
pub mod strain_repo;
pub mod tray_repo;

pub use audit_repo::AuditRepo;
pub use batch_repo::BatchRepo;
pub use facility_repo::FacilityRepo;
pub use harvest_repo::HarvestRepo;
pub use metrc_tag_repo::MetrcTagRepo;
pub use plant_event_repo::PlantEventRepo;
pub use plant_repo::PlantRepo;
pub use rack_repo::RackRepo;
pub use room_repo::RoomRepo;
pub use stats_repo::StatsRepo;
pub use strain_repo::StrainRepo;
pub use tray_repo::TrayRepo;

use canopy_core::error::CoreError;
use canopy_core::types::DbId;
use sqlx::PgExecutor;

use crate::RepoError;

/// Check that row `id` of a facility-owned `table` exists and belongs to
/// `facility_id`. References across tenants are rejected as validation errors.
pub(crate) async fn ensure_in_facility<'e, E>(
    executor: E,
    table: &'static str,
    entity: &'static str,
    id: DbId,
    facility_id: DbId,
) -> Result<(), RepoError>
where
    E: PgExecutor<'e>,
{
    let owner: Option<DbId> = sqlx::query_scalar(&format!("SELECT facility_id FROM {table} WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    match owner {
        Some(owner) if owner == facility_id => Ok(()),
        Some(_) => Err(CoreError::Validation(format!(
            "{entity} {id} belongs to another facility"
        ))
        .into()),
        None => Err(CoreError::NotFound { entity, id }.into()),
    }
}
