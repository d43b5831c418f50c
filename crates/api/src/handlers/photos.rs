//! Observation photo upload.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireGrower;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage::StoredPhoto;

/// POST /api/v1/photos
///
/// Accept one or more image files (multipart) and return their URLs, to be
/// passed as `photo_urls` when adding an observation.
pub async fn upload_photos(
    RequireGrower(auth): RequireGrower,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<StoredPhoto>>>)> {
    let mut stored = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        // Plain form fields carry no file name and are ignored.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        stored.push(state.photos.save(&file_name, &data).await?);
    }

    if stored.is_empty() {
        return Err(AppError::BadRequest(
            "No files received in multipart upload".to_string(),
        ));
    }

    tracing::info!(count = stored.len(), user_id = auth.user_id, "Photos uploaded");

    Ok((StatusCode::CREATED, Json(DataResponse { data: stored })))
}
