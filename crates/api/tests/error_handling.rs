//! Tests for `AppError` -> HTTP response mapping.
//!
//! They call `IntoResponse` directly on `AppError` values and need neither a
//! server nor a database.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use canopy_api::error::AppError;
use canopy_core::error::{CoreError, GrowError};
use canopy_core::harvest::{HarvestAction, HarvestStatus};
use canopy_core::metrc::{TagFormatIssue, TagStatus};
use canopy_core::plant::PlantStatus;
use canopy_db::RepoError;
use http_body_util::BodyExt;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "tray",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "tray with id 42 not found");
}

#[tokio::test]
async fn capacity_exceeded_returns_409_with_domain_code() {
    let err = AppError::Grow(GrowError::CapacityExceeded {
        tray_id: 7,
        capacity: 2,
        occupancy: 2,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CAPACITY_EXCEEDED");
    assert_eq!(json["error"], "Tray 7 is full (2/2 plants)");
    assert_eq!(json["details"]["tray_id"], 7);
    assert_eq!(json["details"]["occupancy"], 2);
}

#[tokio::test]
async fn harvest_transition_details_name_status_and_action() {
    let err = AppError::Grow(GrowError::InvalidHarvestTransition {
        status: HarvestStatus::DryingStarted,
        action: HarvestAction::FinishCuring,
    });

    let (_, json) = error_to_response(err).await;

    assert_eq!(json["details"]["status"], "drying_started");
    assert_eq!(json["details"]["action"], "finish_curing");
}

#[tokio::test]
async fn errors_without_facts_omit_details() {
    let (_, json) = error_to_response(AppError::Grow(GrowError::EmptyObservation)).await;
    assert!(json.get("details").is_none());

    let (_, json) = error_to_response(AppError::BadRequest("nope".into())).await;
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn state_conflicts_return_409() {
    let cases = [
        (
            GrowError::TagNotAvailable {
                tag: "1A4000000000000000001".into(),
                status: TagStatus::Assigned,
            },
            "TAG_NOT_AVAILABLE",
        ),
        (
            GrowError::PlantNotActive {
                plant_id: 1,
                status: PlantStatus::Destroyed,
            },
            "PLANT_NOT_ACTIVE",
        ),
        (
            GrowError::InvalidHarvestTransition {
                status: HarvestStatus::Created,
                action: HarvestAction::FinishCuring,
            },
            "INVALID_HARVEST_TRANSITION",
        ),
    ];

    for (err, code) in cases {
        let (status, json) = error_to_response(AppError::Grow(err)).await;
        assert_eq!(status, StatusCode::CONFLICT, "{code}");
        assert_eq!(json["code"], code);
    }
}

#[tokio::test]
async fn unknown_tag_and_plant_return_404() {
    let (status, json) =
        error_to_response(AppError::Grow(GrowError::TagNotFound("X".into()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "TAG_NOT_FOUND");

    let (status, json) =
        error_to_response(AppError::Grow(GrowError::PlantNotFound("PLT-1".into()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "PLANT_NOT_FOUND");
}

#[tokio::test]
async fn malformed_input_returns_422() {
    let cases = [
        (
            GrowError::InvalidTagFormat {
                tag: "abc".into(),
                issue: TagFormatIssue::TooShort,
            },
            "INVALID_TAG_FORMAT",
        ),
        (GrowError::EmptyObservation, "EMPTY_OBSERVATION"),
        (
            GrowError::BatchStrainMismatch {
                batch_strain_id: 1,
                plant_strain_id: 2,
            },
            "BATCH_STRAIN_MISMATCH",
        ),
        (
            GrowError::InvalidWeight {
                field: "dry",
                value: -1.0,
            },
            "INVALID_WEIGHT",
        ),
    ];

    for (err, code) in cases {
        let (status, json) = error_to_response(AppError::Grow(err)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{code}");
        assert_eq!(json["code"], code);
    }

    let (_, json) = error_to_response(AppError::Grow(GrowError::BatchStrainMismatch {
        batch_strain_id: 1,
        plant_strain_id: 2,
    }))
    .await;
    assert_eq!(json["details"]["batch_strain_id"], 1);
    assert_eq!(json["details"]["plant_strain_id"], 2);
}

#[tokio::test]
async fn repo_errors_keep_their_kind() {
    let err: AppError = RepoError::Grow(GrowError::EmptyObservation).into();
    let (status, _) = error_to_response(err).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let err: AppError = RepoError::Core(CoreError::Conflict("floor in use".into())).into();
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");

    let err: AppError = RepoError::Database(sqlx::Error::RowNotFound).into();
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unauthorized_and_forbidden_map_to_401_and_403() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("no token".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("wrong facility".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("disk path /var/secret not writable".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
