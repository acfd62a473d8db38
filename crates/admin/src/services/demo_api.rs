//! Client for the public demo data API (dummyjson-compatible).
//!
//! Lists are cached with `moka` for the configured TTL (5 minutes by
//! default) so table navigation does not hit the remote service every time.

use std::sync::Arc;

use moka::future::Cache;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use backoffice_core::{Percentage, Price};

use crate::config::DemoApiConfig;
use crate::db::products::ExternalProduct;
use crate::models::ProductDraft;

/// How many users the "API Users" page loads.
pub const DEMO_USERS_LIMIT: u32 = 200;

/// How many products "Populate" imports by default.
pub const DEMO_PRODUCTS_LIMIT: u32 = 100;

/// Used when the API omits a birth date.
const DEFAULT_DATE_OF_BIRTH: &str = "1990-01-01";

/// Errors from the demo API.
#[derive(Debug, Error)]
pub enum DemoApiError {
    /// Transport failure (DNS, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

// =============================================================================
// Records
// =============================================================================

/// A user from the demo API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub image: Option<String>,
}

/// A product from the demo API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoProduct {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub price: Decimal,
    pub discount_percentage: Decimal,
    pub stock: i32,
    pub thumbnail: Option<String>,
}

impl DemoProduct {
    /// Convert into an importable product, or `None` if the values are out of range.
    #[must_use]
    pub fn to_external(&self) -> Option<ExternalProduct> {
        let price = Price::new(
            self.price
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )?;
        let discount_percentage = Percentage::new(
            self.discount_percentage
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
        .ok()?;
        let title = self.title.trim();
        let category = self.category.trim();
        if title.is_empty() || category.is_empty() || self.stock < 0 {
            return None;
        }

        Some(ExternalProduct {
            external_id: self.id,
            draft: ProductDraft {
                title: title.to_string(),
                category: category.to_string(),
                price,
                discount_percentage,
                stock: self.stock,
                image: self.thumbnail.clone(),
            },
        })
    }
}

// Wire formats

#[derive(Debug, Deserialize)]
struct UsersResponse {
    users: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    id: i32,
    first_name: String,
    last_name: String,
    age: i32,
    #[serde(default)]
    gender: String,
    email: String,
    #[serde(default)]
    phone: String,
    birth_date: Option<String>,
    image: Option<String>,
}

impl From<RawUser> for DemoUser {
    fn from(raw: RawUser) -> Self {
        Self {
            id: raw.id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            age: raw.age,
            gender: raw.gender.to_lowercase(),
            email: raw.email,
            phone: raw.phone,
            date_of_birth: raw
                .birth_date
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATE_OF_BIRTH.to_string()),
            image: raw.image,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProduct {
    id: i32,
    title: String,
    #[serde(default)]
    category: String,
    price: Decimal,
    #[serde(default)]
    discount_percentage: Decimal,
    #[serde(default)]
    stock: i32,
    thumbnail: Option<String>,
}

impl From<RawProduct> for DemoProduct {
    fn from(raw: RawProduct) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            category: raw.category,
            price: raw.price,
            discount_percentage: raw.discount_percentage,
            stock: raw.stock,
            thumbnail: raw.thumbnail,
        }
    }
}

fn parse_users(body: &str) -> Result<Vec<DemoUser>, DemoApiError> {
    let parsed: UsersResponse =
        serde_json::from_str(body).map_err(|e| DemoApiError::Decode(e.to_string()))?;
    Ok(parsed.users.into_iter().map(Into::into).collect())
}

fn parse_products(body: &str) -> Result<Vec<DemoProduct>, DemoApiError> {
    let parsed: ProductsResponse =
        serde_json::from_str(body).map_err(|e| DemoApiError::Decode(e.to_string()))?;
    Ok(parsed.products.into_iter().map(Into::into).collect())
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
enum CacheValue {
    Users(Arc<Vec<DemoUser>>),
    Products(Arc<Vec<DemoProduct>>),
}

/// Demo API client with an in-memory response cache.
#[derive(Clone)]
pub struct DemoApiClient {
    inner: Arc<DemoApiClientInner>,
}

struct DemoApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, CacheValue>,
}

impl DemoApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `DemoApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &DemoApiConfig) -> Result<Self, DemoApiError> {
        let cache = Cache::builder()
            .max_capacity(32)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("backoffice-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(DemoApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Fetch up to `limit` users.
    ///
    /// # Errors
    ///
    /// Returns `DemoApiError` if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn fetch_users(&self, limit: u32) -> Result<Arc<Vec<DemoUser>>, DemoApiError> {
        let cache_key = format!("users:{limit}");
        if let Some(CacheValue::Users(users)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for demo users");
            return Ok(users);
        }

        let body = self.get_text("users", limit).await?;
        let users = Arc::new(parse_users(&body)?);
        debug!(count = users.len(), "Fetched demo users");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Users(Arc::clone(&users)))
            .await;
        Ok(users)
    }

    /// Fetch up to `limit` products.
    ///
    /// # Errors
    ///
    /// Returns `DemoApiError` if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self, limit: u32) -> Result<Arc<Vec<DemoProduct>>, DemoApiError> {
        let cache_key = format!("products:{limit}");
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for demo products");
            return Ok(products);
        }

        let body = self.get_text("products", limit).await?;
        let products = Arc::new(parse_products(&body)?);
        debug!(count = products.len(), "Fetched demo products");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Drop every cached response.
    pub fn invalidate(&self) {
        self.inner.cache.invalidate_all();
    }

    async fn get_text(&self, resource: &str, limit: u32) -> Result<String, DemoApiError> {
        let url = format!(
            "{}/{resource}",
            self.inner.base_url.as_str().trim_end_matches('/')
        );

        let response = self
            .inner
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Demo API request failed");
            return Err(DemoApiError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{Router, extract::State, routing::get};

    use super::*;

    const USERS_JSON: &str = r#"{
        "users": [
            {"id": 1, "firstName": "Emily", "lastName": "Johnson", "age": 28, "gender": "female",
             "email": "emily.johnson@x.dummyjson.com", "phone": "+81 965-431-3024",
             "birthDate": "1996-5-30", "image": "https://dummyjson.com/icon/emilys/128"},
            {"id": 2, "firstName": "Michael", "lastName": "Williams", "age": 35, "gender": "Male",
             "email": "michael.williams@x.dummyjson.com", "phone": "+49 258-627-6644"}
        ],
        "total": 208, "skip": 0, "limit": 2
    }"#;

    const PRODUCTS_JSON: &str = r#"{
        "products": [
            {"id": 1, "title": "Essence Mascara Lash Princess", "category": "beauty",
             "price": 9.99, "discountPercentage": 7.17, "stock": 5,
             "thumbnail": "https://cdn.dummyjson.com/products/images/beauty/1/thumbnail.png"},
            {"id": 2, "title": "  ", "category": "beauty", "price": 19.99,
             "discountPercentage": 5.5, "stock": 44}
        ],
        "total": 194, "skip": 0, "limit": 2
    }"#;

    #[test]
    fn test_parse_users_maps_fields() {
        let users = parse_users(USERS_JSON).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].date_of_birth, "1996-5-30");
        assert_eq!(users[1].gender, "male");
        // Missing birthDate falls back to a fixed date
        assert_eq!(users[1].date_of_birth, "1990-01-01");
        assert!(users[1].image.is_none());
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(matches!(
            parse_users(r#"{"message": "nope"}"#),
            Err(DemoApiError::Decode(_))
        ));
    }

    #[test]
    fn test_product_to_external() {
        let products = parse_products(PRODUCTS_JSON).unwrap();
        let external = products[0].to_external().unwrap();
        assert_eq!(external.external_id, 1);
        assert_eq!(external.draft.price.to_string(), "$9.99");
        assert_eq!(external.draft.discount_percentage.to_string(), "7.17%");
        // Blank titles are skipped
        assert!(products[1].to_external().is_none());
    }

    async fn spawn_api(hits: Arc<AtomicUsize>) -> Url {
        async fn users(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
            hits.fetch_add(1, Ordering::SeqCst);
            USERS_JSON
        }

        let app = Router::new()
            .route("/users", get(users))
            .route(
                "/products",
                get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "down") }),
            )
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn client_for(base_url: Url) -> DemoApiClient {
        DemoApiClient::new(&DemoApiConfig {
            base_url,
            cache_ttl: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_users_is_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = client_for(spawn_api(Arc::clone(&hits)).await);

        let first = client.fetch_users(2).await.unwrap();
        let second = client.fetch_users(2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        client.invalidate();
        client.fetch_users(2).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let client = client_for(spawn_api(Arc::new(AtomicUsize::new(0))).await);
        let err = client.fetch_products(10).await.unwrap_err();
        assert!(matches!(err, DemoApiError::Status(503)));
    }
}
