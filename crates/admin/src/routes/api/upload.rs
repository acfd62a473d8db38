//! Image upload API.

use axum::{Json, Router, extract::DefaultBodyLimit, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::routes::api::ApiJson;
use crate::services::uploads::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Base64 inflates by 4/3; leave room for the data URL prefix and JSON.
const MAX_BODY_BYTES: usize = MAX_IMAGE_BYTES / 3 * 4 + 64 * 1024;

/// Build the upload API router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/upload/image",
        post(upload_image).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    )
}

/// `{"image": "data:image/png;base64,..."}`
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub image: String,
}

/// `{"url": "/uploads/<file>"}`
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Store an image sent as a data URL.
///
/// POST /api/upload/image
#[instrument(skip(state, account, body))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
    ApiJson(body): ApiJson<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    if body.image.trim().is_empty() {
        return Err(AppError::BadRequest("No image provided".to_string()));
    }
    let url = state.images().save_data_url(&body.image).await?;
    info!(account_id = %account.id, %url, "Image uploaded");
    Ok(Json(UploadResponse { url }))
}
