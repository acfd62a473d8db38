//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use backoffice_core::{Percentage, Price, ProductId};

use super::RepositoryError;
use crate::models::{Product, ProductDraft, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, external_id, title, category, price, discount_percentage, \
                               stock, image, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    external_id: Option<i32>,
    title: String,
    category: String,
    price: Decimal,
    discount_percentage: Decimal,
    stock: i32,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("price out of range for product {}", row.id))
        })?;
        let discount_percentage = Percentage::new(row.discount_percentage).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            external_id: row.external_id,
            title: row.title,
            category: row.category,
            price,
            discount_percentage,
            stock: row.stock,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A product coming from the demo API, keyed by its remote id.
#[derive(Debug, Clone)]
pub struct ExternalProduct {
    pub external_id: i32,
    pub draft: ProductDraft,
}

/// Repository for products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products (1-based) plus the total row count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_page(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM admin.product ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        let total = self.count().await?;

        let products = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((products, total))
    }

    /// Every product ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM admin.product ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM admin.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO admin.product
                 (title, category, price, discount_percentage, stock, image)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.title)
        .bind(&draft.category)
        .bind(draft.price.amount())
        .bind(draft.discount_percentage.value())
        .bind(draft.stock)
        .bind(draft.image.as_deref())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        // $7 distinguishes "leave image alone" from "clear image"
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE admin.product SET
                 title = COALESCE($2, title),
                 category = COALESCE($3, category),
                 price = COALESCE($4, price),
                 discount_percentage = COALESCE($5, discount_percentage),
                 stock = COALESCE($6, stock),
                 image = CASE WHEN $7 THEN $8 ELSE image END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.category.as_deref())
        .bind(patch.price.map(|p| p.amount()))
        .bind(patch.discount_percentage.map(|p| p.value()))
        .bind(patch.stock)
        .bind(patch.image.is_some())
        .bind(patch.image.clone().flatten())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Import demo API products, skipping ones already imported.
    ///
    /// Returns how many rows were inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn upsert_external(&self, batch: &[ExternalProduct]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for item in batch {
            let result = sqlx::query(
                "INSERT INTO admin.product
                     (external_id, title, category, price, discount_percentage, stock, image)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (external_id) DO NOTHING",
            )
            .bind(item.external_id)
            .bind(&item.draft.title)
            .bind(&item.draft.category)
            .bind(item.draft.price.amount())
            .bind(item.draft.discount_percentage.value())
            .bind(item.draft.stock)
            .bind(item.draft.image.as_deref())
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
