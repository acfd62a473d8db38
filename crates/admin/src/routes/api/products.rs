//! Products API.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use backoffice_core::ProductId;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{PaginationResponse, ProductForm, ProductPatchForm, ProductResponse};
use crate::routes::api::{ApiJson, ApiPath, MessageResponse};
use crate::routes::products::import_demo_products;
use crate::state::AppState;

/// Largest page a client may ask for.
pub const MAX_LIMIT: u32 = 100;

const DEFAULT_LIMIT: u32 = 10;

/// Build the products API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/populate", post(populate))
        .route("/api/products/{id}", get(show).put(update).delete(delete))
}

/// `?page=&limit=`, both lenient.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    /// 1-based page, at least 1.
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Page size clamped to `1..=MAX_LIMIT`.
    fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .map_or(DEFAULT_LIMIT, |l| {
                u32::try_from(l.clamp(1, i64::from(MAX_LIMIT))).unwrap_or(DEFAULT_LIMIT)
            })
    }
}

/// `{"data": [...], "pagination": {...}}`
#[derive(Debug, Serialize)]
pub struct ProductListResponse<'a> {
    pub data: Vec<ProductResponse<'a>>,
    pub pagination: PaginationResponse,
}

/// `{"message": ..., "count": n}`
#[derive(Debug, Serialize)]
pub struct PopulateResponse {
    pub message: String,
    pub count: u64,
}

/// GET /api/products?page=&limit=
#[instrument(skip(state, _account))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit) = (params.page(), params.limit());
    let (products, total) = ProductRepository::new(state.pool())
        .list_page(page, limit)
        .await?;

    let body = ProductListResponse {
        data: products.iter().map(ProductResponse::from).collect(),
        pagination: PaginationResponse::new(page, limit, total),
    };
    Ok(Json(body).into_response())
}

/// GET /api/products/{id}
#[instrument(skip(state, _account))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(ProductResponse::from(&product)).into_response())
}

/// POST /api/products
#[instrument(skip(state, _account, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiJson(form): ApiJson<ProductForm>,
) -> Result<impl IntoResponse, AppError> {
    let draft = form.validate().map_err(AppError::Validation)?;
    let product = ProductRepository::new(state.pool()).create(&draft).await?;
    info!(product_id = %product.id, "Product created via API");
    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))).into_response())
}

/// Apply the fields present in the body.
///
/// PUT /api/products/{id}
#[instrument(skip(state, _account, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(form): ApiJson<ProductPatchForm>,
) -> Result<impl IntoResponse, AppError> {
    let patch = form.validate().map_err(AppError::Validation)?;
    let repo = ProductRepository::new(state.pool());

    let product = if patch.is_empty() {
        repo.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?
    } else {
        repo.update(id, &patch).await?
    };
    Ok(Json(ProductResponse::from(&product)).into_response())
}

/// DELETE /api/products/{id}
#[instrument(skip(state, _account))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(_account): RequireAuth,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>, AppError> {
    ProductRepository::new(state.pool()).delete(id).await?;
    info!(product_id = %id, "Product deleted via API");
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// Import products from the demo API (admins only).
///
/// POST /api/products/populate
#[instrument(skip(state, _account))]
pub async fn populate(
    State(state): State<AppState>,
    RequireAdmin(_account): RequireAdmin,
) -> Result<Json<PopulateResponse>, AppError> {
    let count = import_demo_products(&state).await?;
    Ok(Json(PopulateResponse {
        message: format!("Imported {count} products"),
        count,
    }))
}
