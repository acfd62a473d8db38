//! API users page: read-only table over the demo API's users.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tower_sessions::Session;
use tracing::{error, instrument};

use crate::components::data_table::{
    CellValue, TableQuery, TableView, Tabular, apply, demo_users_table_config,
};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Flash;
use crate::routes::PageContext;
use crate::services::DemoUser;
use crate::services::demo_api::DEMO_USERS_LIMIT;
use crate::state::AppState;

impl Tabular for DemoUser {
    fn cell(&self, key: &str) -> CellValue {
        match key {
            "id" => self.id.into(),
            "firstName" => self.first_name.as_str().into(),
            "lastName" => self.last_name.as_str().into(),
            "age" => self.age.into(),
            "gender" => self.gender.as_str().into(),
            "email" => self.email.as_str().into(),
            "phone" => self.phone.as_str().into(),
            "dateOfBirth" => self.date_of_birth.as_str().into(),
            _ => CellValue::Empty,
        }
    }
}

/// API users page template.
#[derive(Template, WebTemplate)]
#[template(path = "demo_users/index.html")]
pub struct DemoUsersTemplate {
    pub ctx: PageContext,
    pub table: TableView,
}

/// API users table page.
#[instrument(skip(state, session, account, pairs))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Query(pairs): Query<Vec<(String, String)>>,
) -> DemoUsersTemplate {
    let mut ctx = PageContext::load(&state, &session, account, "api-users").await;
    let config = demo_users_table_config();
    let query = TableQuery::from_pairs(&config, &pairs);

    let users = match state.demo_api().fetch_users(DEMO_USERS_LIMIT).await {
        Ok(users) => users.as_ref().clone(),
        Err(e) => {
            error!(error = %e, "Failed to fetch demo users");
            ctx.flash = Some(Flash::error("Failed to load API users"));
            Vec::new()
        }
    };

    let page = apply(users, &config, &query);
    let table = TableView::new(&config, &query, &page, |u| u.id);

    DemoUsersTemplate { ctx, table }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_user(id: i32, first: &str, gender: &str) -> DemoUser {
        DemoUser {
            id,
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            age: 30,
            gender: gender.to_string(),
            email: format!("{}@x.dummyjson.com", first.to_lowercase()),
            phone: "+1 555".to_string(),
            date_of_birth: "1994-2-3".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_demo_users_are_read_only_and_filterable() {
        let config = demo_users_table_config();
        let rows = vec![
            demo_user(1, "Emily", "female"),
            demo_user(2, "Michael", "male"),
            demo_user(3, "Sophia", "female"),
        ];
        let query = TableQuery::from_pairs(
            &config,
            &[
                ("f_gender".to_string(), "male".to_string()),
                ("sort".to_string(), "id".to_string()),
            ],
        );
        let page = apply(rows, &config, &query);
        let view = TableView::new(&config, &query, &page, |u| u.id);

        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].id, 2);
        assert!(!view.actions);
        assert!(view.rows[0].edit_href.is_empty());
        assert_eq!(view.summary, "Page 1 of 1");
    }
}
