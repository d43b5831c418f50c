//! Integration tests for the METRC tag registry.

mod common;

use assert_matches::assert_matches;
use canopy_core::error::GrowError;
use canopy_core::metrc::{TagRejectReason, TagStatus};
use canopy_core::plant::{GrowthPhase, RetireStatus};
use canopy_db::models::metrc_tag::TagListParams;
use canopy_db::repositories::{MetrcTagRepo, PlantRepo};
use canopy_db::RepoError;
use common::{place, site, tag};
use sqlx::PgPool;

fn raw(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Test: Import keeps valid tags and reports the rest
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_reports_invalid_tags(pool: PgPool) {
    let site = site(&pool, "Import", 1).await;

    let report = MetrcTagRepo::import(
        &pool,
        site.facility.id,
        &raw(&["1A4000000000000000001", "BADTAG", "1A4000000000000000002"]),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.inserted_count, 2);
    assert_eq!(report.rejected_count, 1);
    assert_eq!(report.rejected[0].tag, "BADTAG");
    assert_matches!(report.rejected[0].reason, TagRejectReason::InvalidFormat { .. });

    let tags = MetrcTagRepo::list(
        &pool,
        site.facility.id,
        &TagListParams {
            status: Some(TagStatus::Available),
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().all(|t| t.plant_id.is_none()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reimport_reports_already_registered(pool: PgPool) {
    let site = site(&pool, "Reimport", 1).await;
    MetrcTagRepo::import(&pool, site.facility.id, &[tag(1)], None)
        .await
        .unwrap();

    let report = MetrcTagRepo::import(
        &pool,
        site.facility.id,
        &[tag(1).to_lowercase(), tag(2)],
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.inserted, vec![tag(2)]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].reason, TagRejectReason::AlreadyRegistered);

    let counts = MetrcTagRepo::counts(&pool, site.facility.id).await.unwrap();
    assert_eq!(counts.available, 2);
    assert_eq!(counts.total(), 2);
}

// ---------------------------------------------------------------------------
// Test: Assignment binds tag and plant exclusively
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assigned_tag_cannot_be_reused(pool: PgPool) {
    let site = site(&pool, "Assign", 2).await;
    MetrcTagRepo::import(&pool, site.facility.id, &[tag(1), tag(2)], None)
        .await
        .unwrap();
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    let b = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;

    let tagged = PlantRepo::tag(&pool, a.id, &tag(1), false, Some(7))
        .await
        .unwrap();
    assert_eq!(tagged.metrc_label.as_deref(), Some(tag(1).as_str()));

    let record = MetrcTagRepo::find_by_tag(&pool, &tag(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, TagStatus::Assigned);
    assert_eq!(record.plant_id, Some(a.id));
    assert_eq!(record.assigned_by, Some(7));

    let result = PlantRepo::tag(&pool, b.id, &tag(1), false, None).await;
    assert_matches!(
        result,
        Err(RepoError::Grow(GrowError::TagNotAvailable { status: TagStatus::Assigned, .. }))
    );
    let b = PlantRepo::find_by_id(&pool, b.id).await.unwrap().unwrap();
    assert_eq!(b.metrc_label, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_and_malformed_tags(pool: PgPool) {
    let site = site(&pool, "Unknown", 1).await;
    let plant = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Vegetative).await;

    let result = PlantRepo::tag(&pool, plant.id, &tag(99), false, None).await;
    assert_matches!(result, Err(RepoError::Grow(GrowError::TagNotFound(_))));

    let result = PlantRepo::tag(&pool, plant.id, "NOT-A-TAG", false, None).await;
    assert_matches!(result, Err(RepoError::Grow(GrowError::InvalidTagFormat { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tags_do_not_cross_facilities(pool: PgPool) {
    let home = site(&pool, "Home", 1).await;
    let other = site(&pool, "Other", 1).await;
    MetrcTagRepo::import(&pool, other.facility.id, &[tag(5)], None)
        .await
        .unwrap();
    let plant = place(&pool, home.tray.id, home.strain.id, GrowthPhase::Vegetative).await;

    let result = PlantRepo::tag(&pool, plant.id, &tag(5), false, None).await;
    assert_matches!(result, Err(RepoError::Grow(GrowError::TagNotFound(_))));
}

// ---------------------------------------------------------------------------
// Test: Re-tagging supersedes the previous tag
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retag_requires_reassign_and_supersedes(pool: PgPool) {
    let site = site(&pool, "Retag", 1).await;
    MetrcTagRepo::import(&pool, site.facility.id, &[tag(1), tag(2)], None)
        .await
        .unwrap();
    let plant = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Vegetative).await;
    PlantRepo::tag(&pool, plant.id, &tag(1), false, None)
        .await
        .unwrap();

    let result = PlantRepo::tag(&pool, plant.id, &tag(2), false, None).await;
    assert_matches!(result, Err(RepoError::Grow(GrowError::PlantAlreadyTagged { .. })));

    let plant = PlantRepo::tag(&pool, plant.id, &tag(2), true, None)
        .await
        .unwrap();
    assert_eq!(plant.metrc_label.as_deref(), Some(tag(2).as_str()));

    let old = MetrcTagRepo::find_by_tag(&pool, &tag(1)).await.unwrap().unwrap();
    assert_eq!(old.status, TagStatus::Used);
    assert_eq!(old.used_reason.as_deref(), Some("superseded"));

    let counts = MetrcTagRepo::counts(&pool, site.facility.id).await.unwrap();
    assert_eq!(counts.assigned, 1);
    assert_eq!(counts.used, 1);
    assert_eq!(counts.available, 0);
}

// ---------------------------------------------------------------------------
// Test: Voiding and terminal states
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_void_only_available_tags(pool: PgPool) {
    let site = site(&pool, "Void", 2).await;
    MetrcTagRepo::import(&pool, site.facility.id, &[tag(1), tag(2)], None)
        .await
        .unwrap();
    let plant = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Vegetative).await;
    PlantRepo::tag(&pool, plant.id, &tag(2), false, None)
        .await
        .unwrap();

    let voided = MetrcTagRepo::void(&pool, site.facility.id, &tag(1)).await.unwrap();
    assert_eq!(voided.status, TagStatus::Voided);
    assert!(voided.voided_at.is_some());

    let again = MetrcTagRepo::void(&pool, site.facility.id, &tag(1)).await;
    assert_matches!(
        again,
        Err(RepoError::Grow(GrowError::TagAlreadyAssigned { status: TagStatus::Voided, .. }))
    );

    let assigned = MetrcTagRepo::void(&pool, site.facility.id, &tag(2)).await;
    assert_matches!(
        assigned,
        Err(RepoError::Grow(GrowError::TagAlreadyAssigned { status: TagStatus::Assigned, .. }))
    );

    let other = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Vegetative).await;
    let result = PlantRepo::tag(&pool, other.id, &tag(1), false, None).await;
    assert_matches!(
        result,
        Err(RepoError::Grow(GrowError::TagNotAvailable { status: TagStatus::Voided, .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retired_plant_consumes_its_tag(pool: PgPool) {
    let site = site(&pool, "Consume", 1).await;
    MetrcTagRepo::import(&pool, site.facility.id, &[tag(1)], None)
        .await
        .unwrap();
    let plant = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Vegetative).await;
    PlantRepo::tag(&pool, plant.id, &tag(1), false, None)
        .await
        .unwrap();

    PlantRepo::retire(&pool, plant.id, RetireStatus::Destroyed, Some("mold"), None)
        .await
        .unwrap();

    let record = MetrcTagRepo::find_by_tag(&pool, &tag(1)).await.unwrap().unwrap();
    assert_eq!(record.status, TagStatus::Used);
    assert_eq!(record.used_reason.as_deref(), Some("consumed"));

    let result = MetrcTagRepo::void(&pool, site.facility.id, &tag(1)).await;
    assert_matches!(
        result,
        Err(RepoError::Grow(GrowError::TagAlreadyAssigned { status: TagStatus::Used, .. }))
    );
}
