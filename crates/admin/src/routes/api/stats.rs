//! Dashboard statistics API.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::routes::dashboard::{DashboardQuery, load_stats};
use crate::services::DashboardStats;
use crate::state::AppState;

/// Build the stats API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/stats", get(stats))
}

/// Same numbers as the dashboard page.
///
/// GET /api/stats
#[instrument(skip(state, _account))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(load_stats(state.pool(), query.show_all()).await?))
}
