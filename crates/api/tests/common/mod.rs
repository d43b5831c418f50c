#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use canopy_api::auth::jwt::{generate_access_token, JwtConfig};
use canopy_api::config::{PhotoConfig, ServerConfig};
use canopy_api::router::build_app_router;
use canopy_api::state::AppState;
use canopy_core::plant::GrowthPhase;
use canopy_core::spatial::RoomType;
use canopy_core::types::DbId;
use canopy_db::models::facility::CreateFacility;
use canopy_db::models::plant::{CreatePlant, Plant};
use canopy_db::models::rack::CreateRack;
use canopy_db::models::room::CreateRoom;
use canopy_db::models::strain::CreateStrain;
use canopy_db::models::tray::CreateTray;
use canopy_db::repositories::{
    FacilityRepo, PlantRepo, RackRepo, RoomRepo, StrainRepo, TrayRepo,
};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    }
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Photos go to a fresh directory under the system temp dir so parallel
/// tests never share files.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: jwt_config(),
        photos: PhotoConfig {
            storage_dir: std::env::temp_dir().join(format!("canopy-photos-{}", uuid::Uuid::new_v4())),
            base_url: "/media/photos".to_string(),
            max_bytes: 1024 * 1024,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool. Same builder as production.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(AppState::new(pool, test_config())).expect("test router should build")
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn token(user_id: DbId, role: &str, facility_id: Option<DbId>) -> String {
    generate_access_token(user_id, role, facility_id, &jwt_config()).expect("token should encode")
}

pub fn admin_token() -> String {
    token(1, "admin", None)
}

pub fn grower_token(facility_id: DbId) -> String {
    token(2, "grower", Some(facility_id))
}

pub fn viewer_token(facility_id: DbId) -> String {
    token(3, "viewer", Some(facility_id))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should be served")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, None, &body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), &body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), &body)).await
}

/// Send a raw request (e.g. multipart) through the app.
pub async fn send_raw(app: Router, request: Request<Body>) -> Response {
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// One facility with a single flower room, rack and tray plus one strain.
pub struct Site {
    pub facility_id: DbId,
    pub room_id: DbId,
    pub rack_id: DbId,
    pub tray_id: DbId,
    pub strain_id: DbId,
}

pub async fn site(pool: &PgPool, name: &str, capacity: i32) -> Site {
    let facility = FacilityRepo::create(
        pool,
        &CreateFacility {
            name: name.to_string(),
            license_number: None,
            layout: None,
        },
    )
    .await
    .unwrap();
    let room = RoomRepo::create(
        pool,
        facility.id,
        &CreateRoom {
            name: "Flower A".to_string(),
            room_type: RoomType::Flower,
            rows: None,
            cols: None,
            floor_count: None,
        },
    )
    .await
    .unwrap();
    let rack = RackRepo::create(
        pool,
        room.id,
        &CreateRack {
            floor: None,
            position: 0,
            name: None,
        },
    )
    .await
    .unwrap();
    let tray = TrayRepo::create(
        pool,
        rack.id,
        &CreateTray {
            position: 0,
            capacity,
            name: None,
        },
    )
    .await
    .unwrap();
    let strain = StrainRepo::create(
        pool,
        facility.id,
        &CreateStrain {
            name: "Blue Dream".to_string(),
            category: Some("hybrid".to_string()),
        },
    )
    .await
    .unwrap();

    Site {
        facility_id: facility.id,
        room_id: room.id,
        rack_id: rack.id,
        tray_id: tray.id,
        strain_id: strain.id,
    }
}

pub async fn place(pool: &PgPool, site: &Site, phase: GrowthPhase) -> Plant {
    PlantRepo::create(
        pool,
        &CreatePlant {
            tray_id: site.tray_id,
            strain_id: site.strain_id,
            plant_batch_id: None,
            growth_phase: Some(phase),
        },
        None,
    )
    .await
    .unwrap()
}

pub fn tag(n: u32) -> String {
    format!("1A4{n:018}")
}
