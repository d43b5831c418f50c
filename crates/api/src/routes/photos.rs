use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::photos;
use crate::state::AppState;

/// Files accepted in one upload request.
const MAX_FILES_PER_UPLOAD: usize = 8;

/// Photo upload routes mounted at `/photos`.
///
/// ```text
/// POST   /    -> upload_photos (multipart)
/// ```
///
/// The body limit is raised from axum's 2 MB default so a request can carry
/// several full-size photos; each file is still checked against
/// `max_photo_bytes`.
pub fn router(max_photo_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(photos::upload_photos))
        .layer(DefaultBodyLimit::max(
            max_photo_bytes.saturating_mul(MAX_FILES_PER_UPLOAD),
        ))
}
