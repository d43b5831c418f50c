//! Integration tests for the harvest workflow.

mod common;

use std::collections::BTreeSet;
use std::time::Duration;

use assert_matches::assert_matches;
use canopy_core::audit::{AuditEventKind, TrackableType};
use canopy_core::error::{CoreError, GrowError};
use canopy_core::harvest::{HarvestAction, HarvestStatus, HarvestType, WeightWarning};
use canopy_core::metrc::TagStatus;
use canopy_core::plant::{GrowthPhase, PlantStatus};
use canopy_db::models::audit::{AuditListParams, NewAuditEvent};
use canopy_db::models::harvest::{CreateHarvest, RecordStrainWeight};
use canopy_db::repositories::{
    AuditRepo, HarvestRepo, MetrcTagRepo, PlantRepo, RoomRepo, StrainRepo,
};
use canopy_db::RepoError;
use canopy_core::spatial::RoomType;
use common::{new_room, new_strain, occupancy, place, site, tag};
use sqlx::PgPool;

fn new_harvest(plant_ids: Vec<i64>, wet_weight_grams: Option<f64>) -> CreateHarvest {
    CreateHarvest {
        name: None,
        harvest_type: HarvestType::WholePlant,
        harvest_date: None,
        plant_ids,
        wet_weight_grams,
        drying_room_id: None,
        notes: None,
    }
}

fn dry_weight(strain_id: i64, grams: f64) -> RecordStrainWeight {
    RecordStrainWeight {
        strain_id,
        wet_weight_grams: None,
        dry_weight_grams: Some(grams),
        flower_weight_grams: None,
        shake_weight_grams: None,
        waste_weight_grams: None,
    }
}

// ---------------------------------------------------------------------------
// Test: Harvesting frees the slot, consumes the tag and is audited
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_harvest_frees_tray_and_records_event(pool: PgPool) {
    let site = site(&pool, "Harvest", 2).await;
    MetrcTagRepo::import(&pool, site.facility.id, &[tag(1)], None)
        .await
        .unwrap();
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    PlantRepo::tag(&pool, a.id, &tag(1), false, None)
        .await
        .unwrap();
    assert_eq!(occupancy(&pool, site.tray.id).await, 2);

    let harvest = HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![a.id], None), Some(9))
        .await
        .unwrap();
    assert_eq!(harvest.status, HarvestStatus::Created);
    assert_eq!(harvest.name, "Harvest 1");
    assert_eq!(harvest.sequence_number, 1);

    let a = PlantRepo::find_by_id(&pool, a.id).await.unwrap().unwrap();
    assert_eq!(a.status, PlantStatus::Harvested);
    assert_eq!(a.tray_id, None);
    assert_eq!(occupancy(&pool, site.tray.id).await, 1);

    let record = MetrcTagRepo::find_by_tag(&pool, &tag(1)).await.unwrap().unwrap();
    assert_eq!(record.status, TagStatus::Used);
    assert_eq!(record.used_reason.as_deref(), Some("consumed"));

    let events = AuditRepo::list(
        &pool,
        site.facility.id,
        &AuditListParams {
            trackable_type: Some(TrackableType::Harvest),
            trackable_id: Some(harvest.id),
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "harvest_created");
    assert_eq!(events[0].metadata["plant_count"], 1);
    assert_eq!(events[0].metadata["strain_name"], "Blue Dream");
    assert_eq!(events[0].user_id, Some(9));

    let plants = HarvestRepo::plants(&pool, harvest.id).await.unwrap();
    assert_eq!(plants.len(), 1);
    assert_eq!(plants[0].plant_uid, a.plant_uid);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_active_flowering_plants_are_harvested(pool: PgPool) {
    let site = site(&pool, "Eligible", 3).await;
    let veg = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Vegetative).await;
    let ready = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;

    let result =
        HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![ready.id, veg.id], None), None)
            .await;
    assert_matches!(result, Err(RepoError::Grow(GrowError::PlantNotFlowering { .. })));

    let ready_after = PlantRepo::find_by_id(&pool, ready.id).await.unwrap().unwrap();
    assert_eq!(ready_after.status, PlantStatus::Active);

    HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![ready.id], None), None)
        .await
        .unwrap();
    let again = HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![ready.id], None), None).await;
    assert_matches!(
        again,
        Err(RepoError::Grow(GrowError::PlantNotActive { status: PlantStatus::Harvested, .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_names_are_sequential_per_facility(pool: PgPool) {
    let site = site(&pool, "Sequence", 3).await;
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    let b = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    let c = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;

    let first = HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![a.id], None), None)
        .await
        .unwrap();
    let mut named = new_harvest(vec![b.id], None);
    named.name = Some("North room cut".into());
    let second = HarvestRepo::create(&pool, site.facility.id, &named, None)
        .await
        .unwrap();
    let third = HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![c.id], None), None)
        .await
        .unwrap();

    assert_eq!(first.name, "Harvest 1");
    assert_eq!(second.name, "North room cut");
    assert_eq!(third.name, "Harvest 3");
}

// ---------------------------------------------------------------------------
// Test: Concurrent harvests draw distinct sequence numbers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_creates_get_distinct_numbers(pool: PgPool) {
    let site = site(&pool, "Parallel", 6).await;
    let mut plants = Vec::new();
    for _ in 0..6 {
        plants.push(place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await);
    }

    let mut handles = Vec::new();
    for plant in &plants {
        let pool = pool.clone();
        let facility_id = site.facility.id;
        let input = new_harvest(vec![plant.id], None);
        handles.push(tokio::spawn(async move {
            HarvestRepo::create(&pool, facility_id, &input, None).await
        }));
    }

    let mut numbers = BTreeSet::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(harvest) => {
                numbers.insert(harvest.sequence_number);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(numbers, (1..=6).collect::<BTreeSet<i32>>());
    assert_eq!(occupancy(&pool, site.tray.id).await, 0);
}

// ---------------------------------------------------------------------------
// Test: A harvest waits behind an open plant write instead of deadlocking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_waits_for_plant_writer(pool: PgPool) {
    let site = site(&pool, "Overlap", 2).await;
    let plant = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;

    // Another session holds the plant row, the way move/phase/tag writes do.
    let mut writer = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM plants WHERE id = $1 FOR UPDATE")
        .bind(plant.id)
        .execute(&mut *writer)
        .await
        .unwrap();

    let create = {
        let pool = pool.clone();
        let facility_id = site.facility.id;
        let input = new_harvest(vec![plant.id], None);
        tokio::spawn(async move { HarvestRepo::create(&pool, facility_id, &input, None).await })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!create.is_finished());

    // The writer's audit insert checks the facility foreign key while the
    // harvest holds the facility row.
    AuditRepo::log(
        &mut *writer,
        &NewAuditEvent::new(
            site.facility.id,
            TrackableType::Plant,
            plant.id,
            AuditEventKind::NoteAdded {},
            None,
        ),
    )
    .await
    .unwrap();
    writer.commit().await.unwrap();

    let harvest = create.await.unwrap().unwrap();
    assert_eq!(harvest.sequence_number, 1);
    let after = PlantRepo::find_by_id(&pool, plant.id).await.unwrap().unwrap();
    assert_eq!(after.status, PlantStatus::Harvested);
}

// ---------------------------------------------------------------------------
// Test: Stages must be recorded in order
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stage_machine_is_strict(pool: PgPool) {
    let site = site(&pool, "Stages", 2).await;
    let dry_room = RoomRepo::create(&pool, site.facility.id, &new_room("Dry 1", RoomType::Dry))
        .await
        .unwrap();
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    let b = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;

    let harvest = HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![a.id], None), None)
        .await
        .unwrap();

    let early = HarvestRepo::start_drying(&pool, harvest.id, None, None).await;
    assert_matches!(
        early,
        Err(RepoError::Grow(GrowError::InvalidHarvestTransition {
            status: HarvestStatus::Created,
            action: HarvestAction::StartDrying,
        }))
    );

    HarvestRepo::add_plants(&pool, harvest.id, &[b.id], None)
        .await
        .unwrap();
    let harvest = HarvestRepo::record_wet_weight(&pool, harvest.id, 4200.0, None)
        .await
        .unwrap();
    assert_eq!(harvest.status, HarvestStatus::WetWeightRecorded);

    let harvest = HarvestRepo::start_drying(&pool, harvest.id, Some(dry_room.id), None)
        .await
        .unwrap();
    assert_eq!(harvest.status, HarvestStatus::DryingStarted);
    assert_eq!(harvest.drying_room_id, Some(dry_room.id));
    assert!(harvest.drying_started_at.is_some());

    let trim_too_early = HarvestRepo::record_strain_weight(
        &pool,
        harvest.id,
        &RecordStrainWeight {
            strain_id: site.strain.id,
            wet_weight_grams: None,
            dry_weight_grams: None,
            flower_weight_grams: Some(300.0),
            shake_weight_grams: None,
            waste_weight_grams: None,
        },
        None,
    )
    .await;
    assert_matches!(
        trim_too_early,
        Err(RepoError::Grow(GrowError::InvalidHarvestTransition {
            action: HarvestAction::RecordTrimWeight,
            ..
        }))
    );

    let finish_early = HarvestRepo::finish_drying(&pool, harvest.id, None).await;
    assert_matches!(finish_early, Err(RepoError::Grow(GrowError::InvalidHarvestTransition { .. })));

    HarvestRepo::record_strain_weight(&pool, harvest.id, &dry_weight(site.strain.id, 900.0), None)
        .await
        .unwrap();
    let harvest = HarvestRepo::finish_drying(&pool, harvest.id, None).await.unwrap();
    assert_eq!(harvest.status, HarvestStatus::DryingFinished);
    let harvest = HarvestRepo::start_trimming(&pool, harvest.id, None).await.unwrap();
    assert_eq!(harvest.status, HarvestStatus::TrimmingStarted);

    let late_add = HarvestRepo::add_plants(&pool, harvest.id, &[b.id], None).await;
    assert_matches!(late_add, Err(RepoError::Grow(GrowError::InvalidHarvestTransition { .. })));

    let weight = HarvestRepo::record_strain_weight(
        &pool,
        harvest.id,
        &RecordStrainWeight {
            strain_id: site.strain.id,
            wet_weight_grams: None,
            dry_weight_grams: None,
            flower_weight_grams: Some(700.0),
            shake_weight_grams: Some(250.0),
            waste_weight_grams: None,
        },
        None,
    )
    .await
    .unwrap();
    assert_eq!(weight.weight.dry_weight_grams, Some(900.0));
    assert_eq!(weight.weight.flower_weight_grams, Some(700.0));
    assert_eq!(weight.warnings, vec![WeightWarning::TrimExceedsDry]);

    let harvest = HarvestRepo::finish_trimming(&pool, harvest.id, None).await.unwrap();
    let harvest = HarvestRepo::finish_curing(&pool, harvest.id, None).await.unwrap();
    assert!(harvest.status.is_complete());
    assert!(harvest.curing_finished_at.is_some());

    let harvest = HarvestRepo::record_waste(&pool, harvest.id, 40.0, Some("stems".into()), None)
        .await
        .unwrap();
    let harvest = HarvestRepo::record_waste(&pool, harvest.id, 10.0, None, None)
        .await
        .unwrap();
    assert_eq!(harvest.waste_weight_grams, 50.0);
    assert_eq!(harvest.status, HarvestStatus::CuringFinished);

    let detail = HarvestRepo::detail(&pool, harvest.id).await.unwrap().unwrap();
    assert_eq!(detail.plants.len(), 2);
    assert_eq!(detail.weights.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_negative_weight_rejected(pool: PgPool) {
    let site = site(&pool, "Negative", 1).await;
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;

    let result =
        HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![a.id], Some(-1.0)), None).await;
    assert_matches!(result, Err(RepoError::Grow(GrowError::InvalidWeight { field: "wet", .. })));

    let a = PlantRepo::find_by_id(&pool, a.id).await.unwrap().unwrap();
    assert_eq!(a.status, PlantStatus::Active);
}

// ---------------------------------------------------------------------------
// Test: Review flag
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_review_is_set_once(pool: PgPool) {
    let site = site(&pool, "Review", 1).await;
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    let harvest = HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![a.id], None), None)
        .await
        .unwrap();

    let reviewed = HarvestRepo::mark_reviewed(&pool, harvest.id, Some(1)).await.unwrap();
    assert!(reviewed.admin_reviewed);
    assert_eq!(reviewed.reviewed_by, Some(1));

    let again = HarvestRepo::mark_reviewed(&pool, harvest.id, Some(1)).await;
    assert_matches!(again, Err(RepoError::Core(CoreError::Conflict(_))));
}

// ---------------------------------------------------------------------------
// Test: Flower inventory keeps strains apart
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_flower_inventory_per_strain(pool: PgPool) {
    let site = site(&pool, "Inventory", 4).await;
    let og = StrainRepo::create(&pool, site.facility.id, &new_strain("OG Kush"))
        .await
        .unwrap();
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    let b = place(&pool, site.tray.id, og.id, GrowthPhase::Flowering).await;

    let harvest = HarvestRepo::create(
        &pool,
        site.facility.id,
        &new_harvest(vec![a.id, b.id], Some(5000.0)),
        None,
    )
    .await
    .unwrap();
    assert_eq!(harvest.status, HarvestStatus::WetWeightRecorded);
    HarvestRepo::start_drying(&pool, harvest.id, None, None)
        .await
        .unwrap();

    HarvestRepo::record_strain_weight(&pool, harvest.id, &dry_weight(site.strain.id, 500.0), None)
        .await
        .unwrap();
    HarvestRepo::record_strain_weight(&pool, harvest.id, &dry_weight(og.id, 300.0), None)
        .await
        .unwrap();

    let inventory = HarvestRepo::flower_inventory(&pool, site.facility.id)
        .await
        .unwrap();
    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory[0].strain_name, "Blue Dream");
    assert_eq!(inventory[0].dry_weight_grams, 500.0);
    assert_eq!(inventory[0].harvest_count, 1);
    assert_eq!(inventory[1].strain_name, "OG Kush");
    assert_eq!(inventory[1].dry_weight_grams, 300.0);

    let other = common::site(&pool, "Elsewhere", 1).await;
    let empty = HarvestRepo::flower_inventory(&pool, other.facility.id)
        .await
        .unwrap();
    assert!(empty.is_empty());
}

// ---------------------------------------------------------------------------
// Test: Notes land on the harvest timeline
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_note_added_to_timeline(pool: PgPool) {
    let site = site(&pool, "Notes", 1).await;
    let a = place(&pool, site.tray.id, site.strain.id, GrowthPhase::Flowering).await;
    let harvest = HarvestRepo::create(&pool, site.facility.id, &new_harvest(vec![a.id], Some(800.0)), None)
        .await
        .unwrap();

    let note = HarvestRepo::add_note(&pool, harvest.id, " Smells great ", Some(2))
        .await
        .unwrap();
    assert_eq!(note.event_type, "note_added");
    assert_eq!(note.notes.as_deref(), Some("Smells great"));

    let missing = HarvestRepo::add_note(&pool, harvest.id + 100, "x", None).await;
    assert_matches!(missing, Err(RepoError::Core(CoreError::NotFound { entity: "harvest", .. })));
}
