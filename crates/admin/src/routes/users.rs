//! Local users page: data table with add/edit dialogs, delete and undo.

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
use tracing::{error, info, instrument, warn};

use backoffice_core::{Gender, UserId};

use crate::components::data_table::{
    CellValue, TableQuery, TableView, Tabular, apply, href, users_table_config,
};
use crate::db::{RepositoryError, UserRepository};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentAccount, Flash, User, UserForm};
use crate::routes::{
    FormDialog, PageContext, flash_redirect, path_query_pairs, query_value, return_path,
};
use crate::services::undo::{remember_deleted, take_deleted};
use crate::state::AppState;

const BASE_PATH: &str = "/admin/local-users";

impl Tabular for User {
    fn cell(&self, key: &str) -> CellValue {
        match key {
            "firstName" => self.first_name.as_str().into(),
            "lastName" => self.last_name.as_str().into(),
            "age" => self.age.into(),
            "gender" => self.gender.label().into(),
            "email" => self.email.as_str().into(),
            "phone" => self.phone.as_str().into(),
            "dateOfBirth" => self.date_of_birth.format("%Y-%m-%d").to_string().into(),
            _ => CellValue::Empty,
        }
    }
}

/// Posted add/edit dialog.
#[derive(Debug, Deserialize)]
pub struct UserAction {
    #[serde(flatten)]
    pub user: UserForm,
    pub return_to: Option<String>,
}

/// Posted row action (delete, undo).
#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    pub return_to: Option<String>,
}

/// Local users page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub ctx: PageContext,
    pub table: TableView,
    pub dialog: Option<FormDialog<UserForm>>,
    pub genders: [Gender; 3],
}

async fn render(
    state: &AppState,
    session: &Session,
    account: CurrentAccount,
    pairs: &[(String, String)],
    dialog: Option<FormDialog<UserForm>>,
) -> UsersTemplate {
    let mut ctx = PageContext::load(state, session, account, "users").await;
    let config = users_table_config();
    let query = TableQuery::from_pairs(&config, pairs);

    let users = match UserRepository::new(state.pool()).list_all().await {
        Ok(users) => users,
        Err(e) => {
            error!(error = %e, "Failed to load users");
            ctx.flash = Some(Flash::error("Failed to load users"));
            Vec::new()
        }
    };

    // Dialogs opened by link; a dialog from a failed post wins
    let dialog = dialog.or_else(|| {
        let self_href = href(&config, &query);
        if let Some(id) = query_value(pairs, "edit").and_then(|v| v.parse::<i32>().ok()) {
            users.iter().find(|u| u.id.as_i32() == id).map(|u| {
                FormDialog::edit("Edit User", BASE_PATH, id, u.to_form(), &self_href)
            })
        } else if query_value(pairs, "dialog") == Some("add") {
            Some(FormDialog::add(
                "Add User",
                BASE_PATH,
                UserForm::default(),
                &self_href,
            ))
        } else {
            None
        }
    });

    let page = apply(users, &config, &query);
    let table = TableView::new(&config, &query, &page, |u| u.id.as_i32()).with_row_actions();

    UsersTemplate {
        ctx,
        table,
        dialog,
        genders: Gender::ALL,
    }
}

/// Users table page.
#[instrument(skip(state, session, account, pairs))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Query(pairs): Query<Vec<(String, String)>>,
) -> UsersTemplate {
    render(&state, &session, account, &pairs, None).await
}

/// Add a user.
#[instrument(skip(state, session, account, input))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Form(input): Form<UserAction>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let draft = match input.user.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let dialog =
                FormDialog::add("Add User", BASE_PATH, input.user, &back).with_errors(errors);
            let query = path_query_pairs(&back);
            let page = render(&state, &session, account, &query, Some(dialog)).await;
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let flash = match UserRepository::new(state.pool()).create(&draft).await {
        Ok(user) => {
            info!(user_id = %user.id, "User created");
            Flash::success("User added successfully!")
        }
        Err(e) => {
            error!(error = %e, "Failed to add user");
            Flash::error("Failed to add user")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

/// Replace a user's fields.
#[instrument(skip(state, session, account, input))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Path(id): Path<UserId>,
    Form(input): Form<UserAction>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let draft = match input.user.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let dialog = FormDialog::edit("Edit User", BASE_PATH, id.as_i32(), input.user, &back)
                .with_errors(errors);
            let query = path_query_pairs(&back);
            let page = render(&state, &session, account, &query, Some(dialog)).await;
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    let flash = match UserRepository::new(state.pool()).update(id, &draft).await {
        Ok(_) => {
            info!(user_id = %id, "User updated");
            Flash::success("User updated successfully!")
        }
        Err(e) => {
            error!(error = %e, user_id = %id, "Failed to update user");
            Flash::error("Failed to update user")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

/// Delete a user and keep a copy in the session for undo.
#[instrument(skip(state, session, _account, input))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_account): RequireAuth,
    Path(id): Path<UserId>,
    Form(input): Form<ReturnTo>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let flash = match UserRepository::new(state.pool()).delete(id).await {
        Ok(user) => {
            info!(user_id = %id, "User deleted");
            let message = format!("{} deleted!", user.full_name());
            if let Err(e) = remember_deleted(&session, user).await {
                warn!(error = %e, "Failed to store undo ticket");
                Flash::success(message)
            } else {
                Flash::success(message).with_undo()
            }
        }
        Err(e) => {
            error!(error = %e, user_id = %id, "Failed to delete user");
            Flash::error("Failed to delete user")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

/// Restore the most recently deleted user while the undo window is open.
#[instrument(skip(state, session, _account, input))]
pub async fn undo(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_account): RequireAuth,
    Form(input): Form<ReturnTo>,
) -> Response {
    let back = return_path(input.return_to.as_deref(), BASE_PATH);

    let user = match take_deleted(&session, state.undo_window()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return flash_redirect(&session, Flash::info("Nothing to undo"), &back)
                .await
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to read undo ticket");
            return flash_redirect(&session, Flash::error("Failed to restore user"), &back)
                .await
                .into_response();
        }
    };

    let flash = match UserRepository::new(state.pool()).restore(&user).await {
        Ok(user) => {
            info!(user_id = %user.id, "User restored");
            Flash::success("User restored successfully!")
        }
        Err(RepositoryError::Conflict(msg)) => {
            warn!(user_id = %user.id, %msg, "Restore conflicted");
            Flash::error("Failed to restore user")
        }
        Err(e) => {
            error!(error = %e, "Failed to restore user");
            Flash::error("Failed to restore user")
        }
    };
    flash_redirect(&session, flash, &back).await.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use backoffice_core::Email;
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn user(id: i32, first: &str, age: i32, gender: Gender) -> User {
        User {
            id: UserId::new(id),
            first_name: first.to_string(),
            last_name: "Smith".to_string(),
            age,
            gender,
            email: Email::parse(&format!("{}@x.dummyjson.com", first.to_lowercase())).unwrap(),
            phone: "+1 555-0100".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 2).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_user_cells() {
        let u = user(1, "Emily", 28, Gender::Female);
        assert_eq!(u.cell("gender").display(), "Female");
        assert_eq!(u.cell("age"), CellValue::Number(28.0));
        assert_eq!(u.cell("dateOfBirth").display(), "1990-01-02");
        assert_eq!(u.cell("nope"), CellValue::Empty);
    }

    #[test]
    fn test_gender_filter_and_sort_on_users() {
        let config = users_table_config();
        let rows = vec![
            user(1, "Emily", 28, Gender::Female),
            user(2, "Michael", 35, Gender::Male),
            user(3, "Sophia", 42, Gender::Female),
        ];
        let query = TableQuery::from_pairs(
            &config,
            &pairs(&[("f_gender", "female"), ("sort", "age"), ("dir", "desc")]),
        );
        let page = apply(rows, &config, &query);
        let names: Vec<&str> = page.rows.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(names, vec!["Sophia", "Emily"]);
    }

    #[test]
    fn test_global_search_matches_email() {
        let config = users_table_config();
        let rows = vec![
            user(1, "Emily", 28, Gender::Female),
            user(2, "Michael", 35, Gender::Male),
        ];
        let query = TableQuery::from_pairs(&config, &pairs(&[("q", "MICHAEL@")]));
        let page = apply(rows, &config, &query);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].id, UserId::new(2));
    }

    #[test]
    fn test_user_action_form_decodes() {
        let body = "firstName=Emily&lastName=Johnson&age=28&gender=female\
                    &email=emily%40x.dummyjson.com&phone=%2B81+965&dateOfBirth=1996-05-30\
                    &return_to=%2Fadmin%2Flocal-users%3Fpage%3D2";
        let action: UserAction = serde_urlencoded::from_str(body).unwrap();
        assert_eq!(action.user.age, "28");
        assert_eq!(action.user.phone, "+81 965");
        assert_eq!(action.return_to.as_deref(), Some("/admin/local-users?page=2"));
        assert!(action.user.validate().is_ok());
    }
}
