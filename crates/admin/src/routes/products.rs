//! API products page: server-paged table, add/edit/delete and demo import.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument};

use backoffice_core::ProductId;

use crate::components::data_table::{
    CellValue, TableQuery, TableView, Tabular, href, products_table_config, server_page,
};
use crate::db::{ProductRepository, RepositoryError};
use crate::filters;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{CurrentAccount, Flash, Product, ProductForm, ProductPatch};
use crate::routes::{
    FormDialog, PageContext, flash_redirect, path_query_pairs, query_value, return_path,
};
use crate::services::demo_api::DEMO_PRODUCTS_LIMIT;
use crate::state::AppState;

const BASE_PATH: &str = "/admin/api-products";

impl Tabular for Product {
    fn cell(&self, key: &str) -> CellValue {
        match key {
            "image" => self.image.as_deref().into(),
            "title" => self.title.as_str().into(),
            "category" => self.category.as_str().into(),
            "price" => self.price.to_string().into(),
            "discountPercentage" => self.discount_percentage.to_string().into(),
            "finalPrice" => self.final_price().to_string().into(),
            "stock" => self.stock.into(),
            _ => CellValue::Empty,
        }
    }
}

/// Posted add/edit dialog.
#[derive(Debug, Deserialize)]
pub struct ProductAction {
    #[serde(flatten)]
    pub product: ProductForm,
    pub return_to: Option<String>,
}

/// Posted row action (delete, populate).
#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    pub return_to: Option<String>,
}

/// Products page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsTemplate {
    pub ctx: PageContext,
    pub table: TableView,
    pub dialog: Option<FormDialog<ProductForm>>,
    /// Whether the "Populate" button is shown.
    pub can_populate: bool,
}

/// Fetch the requested page, falling back to the last page on overshoot.
async fn load_page(
    repo: &ProductRepository<'_>,
    query: &TableQuery,
) -> Result<(Vec<Product>, TableQuery, u64), RepositoryError> {
    let (rows, total) = repo.list_page(query.page, query.per_page).await?;
    let total = u64::try_from(total).unwrap_or(0);

    if rows.is_empty() && total > 0 && query.page > 1 {
        let last = u32::try_from(total.div_ceil(u64::from(query.per_page))).unwrap_or(1);
        let query = query.with_page(last);
        let (rows, _) = repo.list_page(query.page, query.per_page).await?;
        return Ok((rows, query, total));
    }
    Ok((rows, query.clone(), total))
}

async fn render(
    state: &AppState,
    session: &Session,
    account: CurrentAccount,
    pairs: &[(String, String)],
    dialog: Option<FormDialog<ProductForm>>,
) -> ProductsTemplate {
    let can_populate = account.is_admin();
    let mut ctx = PageContext::load(state, session, account, "products").await;
    let config = products_table_config();
    let requested = TableQuery::from_pairs(&config, pairs);
    let repo = ProductRepository::new(state.pool());

    let (rows, query, total) = match load_page(&repo, &requested).await {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %e, "Failed to load products");
            ctx.flash = Some(Flash::error("Failed to load products"));
            (Vec::new(), requested, 0)
        }
    };

    let dialog = match dialog {
        Some(dialog) => Some(dialog),
        None => {
            let self_href = href(&config, &query);
            if let Some(id) = query_value(pairs, "edit").and_then(|v| v.parse::<ProductId>().ok()) {
                match repo.get(id).await {
                    Ok(found) => found.map(|p| {
                        FormDialog::edit(
                            "Edit Product",
                            BASE_PATH,
                            p.id.as_i32(),
                            p.to_form(),
                            &self_href,
                        )
                    }),
                    Err(e) => {
                        error!(error = %e, product_id = %id, "Failed to load product");
                        None
                    }
                }
            } else if query_value(pairs, "dialog") == Some("add") {
                Some(FormDialog::add(
                    "Add Product",
                    BASE_PATH,
                    ProductForm::default(),
                    &self_href,
                ))
            } else {
                None
            }
        }
    };

    let page = server_page(rows, &query, total);
    let table = TableView::new(&config, &query, &page, |p| p.id.as_i32()).with_row_actions();

    ProductsTemplate {
        ctx,
        table,
        dialog,
        can_populate,
    }
}

/// Products table page.
#[instrument(skip(state, session, account, pairs))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ProductsTemplate {
    render(&state, &session, account, &pairs, None).await
}

/// Add a product.
#[instrument(skip(state, session, account, input))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Form(input): Form<ProductAction>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let draft = match input.product.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let dialog =
                FormDialog::add("Add Product", BASE_PATH, input.product, &back).with_errors(errors);
            let query = path_query_pairs(&back);
            let page = render(&state, &session, account, &query, Some(dialog)).await;
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let flash = match ProductRepository::new(state.pool()).create(&draft).await {
        Ok(product) => {
            info!(product_id = %product.id, "Product created");
            Flash::success("Product added successfully!")
        }
        Err(e) => {
            error!(error = %e, "Failed to add product");
            Flash::error("Failed to add product")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

/// Save the edit dialog.
#[instrument(skip(state, session, account, input))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Path(id): Path<ProductId>,
    Form(input): Form<ProductAction>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let patch = match input.product.validate() {
        Ok(draft) => ProductPatch::from(draft),
        Err(errors) => {
            let dialog =
                FormDialog::edit("Edit Product", BASE_PATH, id.as_i32(), input.product, &back)
                    .with_errors(errors);
            let query = path_query_pairs(&back);
            let page = render(&state, &session, account, &query, Some(dialog)).await;
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let flash = match ProductRepository::new(state.pool()).update(id, &patch).await {
        Ok(_) => {
            info!(product_id = %id, "Product updated");
            Flash::success("Product updated successfully!")
        }
        Err(e) => {
            error!(error = %e, product_id = %id, "Failed to update product");
            Flash::error("Failed to update product")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

/// Delete a product.
#[instrument(skip(state, session, _account, input))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_account): RequireAuth,
    Path(id): Path<ProductId>,
    Form(input): Form<ReturnTo>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let flash = match ProductRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            info!(product_id = %id, "Product deleted");
            Flash::success("Product deleted successfully!")
        }
        Err(e) => {
            error!(error = %e, product_id = %id, "Failed to delete product");
            Flash::error("Failed to delete product")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

/// Import products from the demo API.
///
/// Returns how many new rows were inserted.
///
/// # Errors
///
/// Returns an error if the demo API or the database fails.
pub async fn import_demo_products(state: &AppState) -> Result<u64, crate::error::AppError> {
    let remote = state.demo_api().fetch_products(DEMO_PRODUCTS_LIMIT).await?;
    let batch: Vec<_> = remote.iter().filter_map(|p| p.to_external()).collect();
    let inserted = ProductRepository::new(state.pool())
        .upsert_external(&batch)
        .await?;
    info!(fetched = remote.len(), inserted, "Imported demo products");
    Ok(inserted)
}

/// Populate the table from the demo API (admins only).
#[instrument(skip(state, session, _account, input))]
pub async fn populate(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_account): RequireAdmin,
    Form(input): Form<ReturnTo>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let flash = match import_demo_products(&state).await {
        Ok(0) => Flash::info("All demo products are already imported"),
        Ok(n) => Flash::success(format!("Imported {n} products from the demo API")),
        Err(e) => {
            error!(error = %e, "Failed to populate products");
            Flash::error("Failed to populate products")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use backoffice_core::{Percentage, Price};
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(3),
            external_id: Some(12),
            title: "Essence Mascara Lash Princess".to_string(),
            category: "beauty".to_string(),
            price: Price::new(Decimal::new(999, 2)).unwrap(),
            discount_percentage: Percentage::new(Decimal::new(10, 0)).unwrap(),
            stock: 5,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_product_cells() {
        let p = product();
        assert_eq!(p.cell("price").display(), "$9.99");
        assert_eq!(p.cell("discountPercentage").display(), "10%");
        assert_eq!(p.cell("finalPrice").display(), "$8.99");
        assert_eq!(p.cell("stock"), CellValue::Number(5.0));
        assert_eq!(p.cell("image"), CellValue::Empty);
    }

    #[test]
    fn test_table_view_in_server_mode() {
        let config = products_table_config();
        let query = TableQuery::from_pairs(
            &config,
            &[
                ("page".to_string(), "2".to_string()),
                ("per_page".to_string(), "20".to_string()),
            ],
        );
        let page = server_page(vec![product()], &query, 45);
        let view = TableView::new(&config, &query, &page, |p| p.id.as_i32()).with_row_actions();

        assert_eq!(view.summary, "Showing 21-40 of 45 rows");
        assert!(view.info.has_next_page);
        assert_eq!(view.rows[0].delete_action, "/admin/api-products/3/delete");
        assert!(!view.searchable);
    }

    #[test]
    fn test_product_action_form_decodes() {
        let body = "title=Lamp&category=home&price=12.50&discountPercentage=&stock=3&image=\
                    &return_to=%2Fadmin%2Fapi-products%3Fpage%3D3";
        let action: ProductAction = serde_urlencoded::from_str(body).unwrap();
        let draft = action.product.validate().unwrap();
        assert_eq!(draft.stock, 3);
        assert!(draft.image.is_none());
        assert_eq!(
            return_path(action.return_to.as_deref(), BASE_PATH),
            "/admin/api-products?page=3"
        );
    }
}
