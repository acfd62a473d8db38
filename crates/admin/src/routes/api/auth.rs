//! Authentication API.
//!
//! Register and login are rate limited; `me` backs the browser-side session
//! poll.

use axum::{
    Json, Router,
    extract::State,
    handler::Handler,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{error, info, instrument};

use crate::error::AppError;
use crate::middleware::{
    RequireAuth, auth_rate_limiter, clear_current_account, set_current_account,
};
use crate::models::CurrentAccount;
use crate::routes::api::{ApiJson, MessageResponse};
use crate::routes::auth::send_welcome_email;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Build the auth API router.
pub fn router(trust_proxy: bool) -> Router<AppState> {
    let limiter = auth_rate_limiter(trust_proxy);
    Router::new()
        .route("/api/auth/register", post(register.layer(limiter.clone())))
        .route("/api/auth/login", post(login.layer(limiter)))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/profile", put(update_profile))
        .route("/api/auth/change-password", put(change_password))
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for a profile update.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: String,
    pub photo: Option<String>,
}

/// Request body for a password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// `{"user": ...}`
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: CurrentAccount,
}

/// `{"message": ..., "user": ...}`
#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub message: String,
    pub user: CurrentAccount,
}

/// Create an account.
///
/// POST /api/auth/register
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = AuthService::new(state.pool())
        .register(&body.name, &body.email, &body.password)
        .await?;
    info!(account_id = %account.id, "Account registered via API");
    send_welcome_email(&state, account.email.as_str(), &account.name);

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: "User registered successfully".to_string(),
            user: CurrentAccount::from(&account),
        }),
    ))
}

/// Sign in and start a session.
///
/// POST /api/auth/login
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let account = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;
    let user = CurrentAccount::from(&account);

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_current_account(&session, &user)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;

    info!(account_id = %user.id, "Account logged in via API");
    Ok(Json(UserResponse { user }))
}

/// End the session. Always succeeds.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Json<MessageResponse> {
    if let Err(e) = clear_current_account(&session).await {
        error!(error = %e, "Failed to clear session");
    }
    Json(MessageResponse::new("Logged out"))
}

/// The signed-in account, reloaded from the database, or 401.
///
/// A changed account refreshes the session copy; a deleted one ends the
/// session.
///
/// GET /api/auth/me
#[instrument(skip(state, session, account))]
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
) -> Result<Json<UserResponse>, AppError> {
    let Some(stored) = AuthService::new(state.pool()).get_account(account.id).await? else {
        if let Err(e) = clear_current_account(&session).await {
            error!(error = %e, "Failed to clear session");
        }
        return Err(AppError::Unauthorized("Not authenticated".to_string()));
    };

    let user = CurrentAccount::from(&stored);
    if user != account {
        set_current_account(&session, &user)
            .await
            .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    }
    Ok(Json(UserResponse { user }))
}

/// Update name and photo; the session copy is refreshed.
///
/// PUT /api/auth/profile
#[instrument(skip(state, session, account, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    ApiJson(body): ApiJson<ProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = AuthService::new(state.pool())
        .update_profile(account.id, &body.name, body.photo.as_deref())
        .await?;
    let user = CurrentAccount::from(&updated);
    set_current_account(&session, &user)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    Ok(Json(UserResponse { user }))
}

/// Change the password after checking the current one.
///
/// PUT /api/auth/change-password
#[instrument(skip(state, account, body))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::new(state.pool())
        .change_password(account.id, &body.current_password, &body.new_password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                AppError::BadRequest("Current password is incorrect".to_string())
            }
            other => other.into(),
        })?;
    info!(account_id = %account.id, "Password changed via API");
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
