//! Dashboard home page with stat cards and charts.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use sqlx::PgPool;
use tower_sessions::Session;
use tracing::{error, instrument};

use crate::db::{ProductRepository, RepositoryError, SessionStats, UserRepository};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Flash;
use crate::routes::PageContext;
use crate::services::DashboardStats;
use crate::state::AppState;

/// Query parameters for the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// `1` expands the recent users panel.
    pub show_all: Option<String>,
}

impl DashboardQuery {
    pub(crate) fn show_all(&self) -> bool {
        matches!(self.show_all.as_deref(), Some("1" | "true"))
    }
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: DashboardStats,
}

/// Load everything the dashboard shows.
///
/// # Errors
///
/// Returns `RepositoryError` if any query fails.
pub async fn load_stats(pool: &PgPool, show_all: bool) -> Result<DashboardStats, RepositoryError> {
    let users = UserRepository::new(pool).list_all().await?;
    let products = ProductRepository::new(pool).list_all().await?;
    let active_sessions = SessionStats::new(pool).active_sessions().await?;

    let product_total = i64::try_from(products.len()).unwrap_or(i64::MAX);
    Ok(DashboardStats::compute(
        &users,
        product_total,
        &products,
        active_sessions,
        show_all,
    ))
}

/// Dashboard page.
#[instrument(skip(state, session, account))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Query(query): Query<DashboardQuery>,
) -> DashboardTemplate {
    let mut ctx = PageContext::load(&state, &session, account, "dashboard").await;
    let show_all = query.show_all();

    let stats = match load_stats(state.pool(), show_all).await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Failed to load dashboard stats");
            ctx.flash = Some(Flash::error("Failed to load dashboard data"));
            DashboardStats::compute(&[], 0, &[], 0, show_all)
        }
    };

    DashboardTemplate { ctx, stats }
}
