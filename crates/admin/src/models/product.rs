//! Products managed on the "API Products" page.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use backoffice_core::{FieldErrors, Percentage, Price, ProductId};

use super::de::{opt_string_or_number, string_or_number};

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Demo API id when the product was imported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<i32>,
    pub title: String,
    pub category: String,
    pub price: Price,
    pub discount_percentage: Percentage,
    pub stock: i32,
    pub image: Option<String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price after the discount, rounded to cents.
    #[must_use]
    pub fn final_price(&self) -> Price {
        self.price.discounted(self.discount_percentage)
    }

    /// The editable fields, e.g. to prefill the edit dialog.
    #[must_use]
    pub fn to_form(&self) -> ProductForm {
        ProductForm {
            title: self.title.clone(),
            category: self.category.clone(),
            price: self.price.amount().to_string(),
            discount_percentage: self.discount_percentage.value().to_string(),
            stock: self.stock.to_string(),
            image: self.image.clone().unwrap_or_default(),
        }
    }
}

/// JSON shape of a product: the stored fields plus `finalPrice`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub final_price: Price,
}

impl<'a> From<&'a Product> for ProductResponse<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            final_price: product.final_price(),
            product,
        }
    }
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub title: String,
    pub category: String,
    pub price: Price,
    pub discount_percentage: Percentage,
    pub stock: i32,
    pub image: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub discount_percentage: Option<Percentage>,
    pub stock: Option<i32>,
    pub image: Option<Option<String>>,
}

impl ProductPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<ProductDraft> for ProductPatch {
    fn from(draft: ProductDraft) -> Self {
        Self {
            title: Some(draft.title),
            category: Some(draft.category),
            price: Some(draft.price),
            discount_percentage: Some(draft.discount_percentage),
            stock: Some(draft.stock),
            image: Some(draft.image),
        }
    }
}

/// Raw product input from the add/edit dialog or `POST /api/products`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductForm {
    pub title: String,
    pub category: String,
    #[serde(deserialize_with = "string_or_number")]
    pub price: String,
    #[serde(deserialize_with = "string_or_number")]
    pub discount_percentage: String,
    #[serde(deserialize_with = "string_or_number")]
    pub stock: String,
    #[serde(deserialize_with = "empty_as_default")]
    pub image: String,
}

/// Raw partial input for `PUT /api/products/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatchForm {
    pub title: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "opt_string_or_number")]
    pub price: Option<String>,
    #[serde(deserialize_with = "opt_string_or_number")]
    pub discount_percentage: Option<String>,
    #[serde(deserialize_with = "opt_string_or_number")]
    pub stock: Option<String>,
    pub image: Option<String>,
}

fn empty_as_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_price(raw: &str, errors: &mut FieldErrors) -> Option<Price> {
    let amount = raw.trim().parse::<Decimal>().ok();
    let price = amount.and_then(Price::new);
    if price.is_none() {
        let message = if amount.is_some_and(|a| a > Price::MAX.amount()) {
            "Price must be less than 10,000,000,000"
        } else {
            "Price must be zero or more"
        };
        errors.add("price", message);
    }
    price
}

fn parse_discount(raw: &str, errors: &mut FieldErrors) -> Option<Percentage> {
    let raw = raw.trim();
    // An empty discount means "no discount"
    if raw.is_empty() {
        return Some(Percentage::default());
    }
    let pct = raw
        .parse::<Decimal>()
        .ok()
        .and_then(|d| Percentage::new(d).ok());
    errors.check(
        pct.is_none(),
        "discountPercentage",
        "Discount must be between 0 and 100",
    );
    pct
}

fn parse_stock(raw: &str, errors: &mut FieldErrors) -> Option<i32> {
    let stock = raw.trim().parse::<i32>().ok().filter(|s| *s >= 0);
    errors.check(stock.is_none(), "stock", "Stock must be zero or more");
    stock
}

fn normalize_image(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ProductForm {
    /// Validate into a [`ProductDraft`].
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn validate(&self) -> Result<ProductDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        errors.check(title.is_empty(), "title", "Title is required");
        let category = self.category.trim();
        errors.check(category.is_empty(), "category", "Category is required");

        let price = parse_price(&self.price, &mut errors);
        let discount_percentage = parse_discount(&self.discount_percentage, &mut errors);
        let stock = parse_stock(&self.stock, &mut errors);

        match (price, discount_percentage, stock) {
            (Some(price), Some(discount_percentage), Some(stock)) if errors.is_empty() => {
                Ok(ProductDraft {
                    title: title.to_string(),
                    category: category.to_string(),
                    price,
                    discount_percentage,
                    stock,
                    image: normalize_image(&self.image),
                })
            }
            _ => Err(errors),
        }
    }
}

impl ProductPatchForm {
    /// Validate only the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn validate(&self) -> Result<ProductPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut patch = ProductPatch::default();

        if let Some(title) = &self.title {
            errors.check(title.trim().is_empty(), "title", "Title is required");
            patch.title = Some(title.trim().to_string());
        }
        if let Some(category) = &self.category {
            errors.check(category.trim().is_empty(), "category", "Category is required");
            patch.category = Some(category.trim().to_string());
        }
        if let Some(price) = &self.price {
            patch.price = parse_price(price, &mut errors);
        }
        if let Some(discount) = &self.discount_percentage {
            patch.discount_percentage = parse_discount(discount, &mut errors);
        }
        if let Some(stock) = &self.stock {
            patch.stock = parse_stock(stock, &mut errors);
        }
        if let Some(image) = &self.image {
            patch.image = Some(normalize_image(image));
        }

        errors.into_result(patch)
    }
}

/// Pagination block of `GET /api/products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationResponse {
    /// Build the block for a 1-based `page` of `limit` rows out of `total`.
    #[must_use]
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit = i64::from(limit.max(1));
        let total_pages = u32::try_from((total + limit - 1) / limit).unwrap_or(u32::MAX);
        Self {
            current_page: page,
            total_pages,
            total_products: total,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}
