//! Directory users API.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use backoffice_core::UserId;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{User, UserForm};
use crate::routes::api::{ApiJson, ApiPath};
use crate::services::undo::remember_deleted;
use crate::state::AppState;

/// Build the users API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/restore", post(restore))
        .route("/api/users/{id}", get(show).put(update).delete(delete))
}

/// GET /api/users
#[instrument(skip(state, _account))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(UserRepository::new(state.pool()).list_all().await?))
}

/// GET /api/users/{id}
#[instrument(skip(state, _account))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>, AppError> {
    UserRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// POST /api/users
#[instrument(skip(state, _account, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiJson(form): ApiJson<UserForm>,
) -> Result<impl IntoResponse, AppError> {
    let draft = form.validate().map_err(AppError::Validation)?;
    let user = UserRepository::new(state.pool()).create(&draft).await?;
    info!(user_id = %user.id, "User created via API");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}
#[instrument(skip(state, _account, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(form): ApiJson<UserForm>,
) -> Result<Json<User>, AppError> {
    let draft = form.validate().map_err(AppError::Validation)?;
    let user = UserRepository::new(state.pool()).update(id, &draft).await?;
    Ok(Json(user))
}

/// Delete a user; the deleted record is returned and kept for undo.
///
/// DELETE /api/users/{id}
#[instrument(skip(state, session, _account))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_account): RequireAuth,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>, AppError> {
    let user = UserRepository::new(state.pool()).delete(id).await?;
    if let Err(e) = remember_deleted(&session, user.clone()).await {
        warn!(error = %e, "Failed to store undo ticket");
    }
    info!(user_id = %id, "User deleted via API");
    Ok(Json(user))
}

/// Re-insert a previously deleted user with its original id.
///
/// POST /api/users/restore
#[instrument(skip(state, _account, user))]
pub async fn restore(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiJson(user): ApiJson<User>,
) -> Result<impl IntoResponse, AppError> {
    user.to_form().validate().map_err(AppError::Validation)?;
    let restored = UserRepository::new(state.pool()).restore(&user).await?;
    info!(user_id = %restored.id, "User restored via API");
    Ok((StatusCode::CREATED, Json(restored)))
}
