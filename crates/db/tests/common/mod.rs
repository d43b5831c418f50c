//! Fixture builders shared by the repository integration tests.

#![allow(dead_code)]

use canopy_core::plant::GrowthPhase;
use canopy_core::spatial::RoomType;
use canopy_db::models::facility::{CreateFacility, Facility};
use canopy_db::models::plant::{CreatePlant, Plant};
use canopy_db::models::rack::{CreateRack, Rack};
use canopy_db::models::room::{CreateRoom, Room};
use canopy_db::models::strain::{CreateStrain, Strain};
use canopy_db::models::tray::{CreateTray, Tray};
use canopy_db::repositories::{
    FacilityRepo, PlantRepo, RackRepo, RoomRepo, StrainRepo, TrayRepo,
};
use sqlx::PgPool;

/// A facility with one flower room, one rack, one tray and one strain.
pub struct Site {
    pub facility: Facility,
    pub room: Room,
    pub rack: Rack,
    pub tray: Tray,
    pub strain: Strain,
}

pub fn new_facility(name: &str) -> CreateFacility {
    CreateFacility {
        name: name.to_string(),
        license_number: None,
        layout: None,
    }
}

pub fn new_room(name: &str, room_type: RoomType) -> CreateRoom {
    CreateRoom {
        name: name.to_string(),
        room_type,
        rows: None,
        cols: None,
        floor_count: None,
    }
}

pub fn new_rack(floor: Option<i32>, position: i32) -> CreateRack {
    CreateRack {
        floor,
        position,
        name: None,
    }
}

pub fn new_tray(position: i32, capacity: i32) -> CreateTray {
    CreateTray {
        position,
        capacity,
        name: None,
    }
}

pub fn new_strain(name: &str) -> CreateStrain {
    CreateStrain {
        name: name.to_string(),
        category: None,
    }
}

pub fn new_plant(tray_id: i64, strain_id: i64, phase: GrowthPhase) -> CreatePlant {
    CreatePlant {
        tray_id,
        strain_id,
        plant_batch_id: None,
        growth_phase: Some(phase),
    }
}

/// Build a [`Site`] whose single tray holds `capacity` plants.
pub async fn site(pool: &PgPool, name: &str, capacity: i32) -> Site {
    let facility = FacilityRepo::create(pool, &new_facility(name)).await.unwrap();
    let room = RoomRepo::create(pool, facility.id, &new_room("Flower 1", RoomType::Flower))
        .await
        .unwrap();
    let rack = RackRepo::create(pool, room.id, &new_rack(None, 0)).await.unwrap();
    let tray = TrayRepo::create(pool, rack.id, &new_tray(0, capacity))
        .await
        .unwrap();
    let strain = StrainRepo::create(pool, facility.id, &new_strain("Blue Dream"))
        .await
        .unwrap();
    Site {
        facility,
        room,
        rack,
        tray,
        strain,
    }
}

/// Place an active plant of `strain_id` into `tray_id`.
pub async fn place(pool: &PgPool, tray_id: i64, strain_id: i64, phase: GrowthPhase) -> Plant {
    PlantRepo::create(pool, &new_plant(tray_id, strain_id, phase), None)
        .await
        .unwrap()
}

/// Live occupancy of a tray.
pub async fn occupancy(pool: &PgPool, tray_id: i64) -> i64 {
    TrayRepo::find_view(pool, tray_id)
        .await
        .unwrap()
        .expect("tray exists")
        .occupancy
}

/// A well-formed METRC tag ending in `n`.
pub fn tag(n: u32) -> String {
    format!("1A4{n:018}")
}
