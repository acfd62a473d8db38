//! Profile page: display name, photo and password.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument};

use backoffice_core::FieldErrors;

use crate::filters;
use crate::middleware::{RequireAuth, set_current_account};
use crate::models::{CurrentAccount, Flash};
use crate::routes::{PageContext, flash_redirect};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

const PROFILE_PATH: &str = "/admin/profile";

/// Profile form data.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    /// Photo URL, usually filled in by the upload widget.
    #[serde(default)]
    pub photo: String,
}

/// Change password form data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    /// Checks that do not need the stored hash.
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.check(
            self.current_password.is_empty(),
            "currentPassword",
            "Current password is required",
        );
        errors.check(
            self.new_password.is_empty(),
            "newPassword",
            "New password is required",
        );
        errors.check(
            self.new_password != self.confirm_password,
            "confirmPassword",
            "Passwords do not match",
        );
        errors
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/index.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub photo: String,
    pub profile_errors: FieldErrors,
    pub password_errors: FieldErrors,
}

async fn render(
    state: &AppState,
    session: &Session,
    account: CurrentAccount,
    form: Option<ProfileForm>,
    profile_errors: FieldErrors,
    password_errors: FieldErrors,
) -> ProfileTemplate {
    let form = form.unwrap_or_else(|| ProfileForm {
        name: account.name.clone(),
        photo: account.photo.clone().unwrap_or_default(),
    });
    ProfileTemplate {
        ctx: PageContext::load(state, session, account, "profile").await,
        name: form.name,
        photo: form.photo,
        profile_errors,
        password_errors,
    }
}

/// Profile page.
#[instrument(skip(state, session, account))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
) -> ProfileTemplate {
    render(
        &state,
        &session,
        account,
        None,
        FieldErrors::new(),
        FieldErrors::new(),
    )
    .await
}

/// Update display name and photo.
#[instrument(skip(state, session, account, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Response {
    let result = AuthService::new(state.pool())
        .update_profile(account.id, &form.name, Some(&form.photo))
        .await;

    match result {
        Ok(updated) => {
            if let Err(e) = set_current_account(&session, &CurrentAccount::from(&updated)).await {
                error!(error = %e, "Failed to refresh session account");
            }
            info!(account_id = %updated.id, "Profile updated");
            flash_redirect(&session, Flash::success("Profile updated successfully!"), PROFILE_PATH)
                .await
                .into_response()
        }
        Err(AuthError::Validation(errors)) => {
            let page = render(
                &state,
                &session,
                account,
                Some(form),
                errors,
                FieldErrors::new(),
            )
            .await;
            (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to update profile");
            flash_redirect(&session, Flash::error("Failed to update profile"), PROFILE_PATH)
                .await
                .into_response()
        }
    }
}

/// Change the account password.
#[instrument(skip(state, session, account, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(account): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Response {
    let mut errors = form.validate();

    if errors.is_empty() {
        match AuthService::new(state.pool())
            .change_password(account.id, &form.current_password, &form.new_password)
            .await
        {
            Ok(()) => {
                info!(account_id = %account.id, "Password changed");
                return flash_redirect(
                    &session,
                    Flash::success("Password changed successfully!"),
                    PROFILE_PATH,
                )
                .await
                .into_response();
            }
            Err(AuthError::InvalidCredentials) => {
                errors.add("currentPassword", "Current password is incorrect");
            }
            Err(AuthError::WeakPassword(msg)) => errors.add("newPassword", msg),
            Err(e) => {
                error!(error = %e, "Failed to change password");
                return flash_redirect(
                    &session,
                    Flash::error("Failed to change password"),
                    PROFILE_PATH,
                )
                .await
                .into_response();
            }
        }
    }

    let page = render(&state, &session, account, None, FieldErrors::new(), errors).await;
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_form_checks() {
        let errors = PasswordForm::default().validate();
        assert_eq!(errors.get("currentPassword"), Some("Current password is required"));
        assert_eq!(errors.get("newPassword"), Some("New password is required"));
        assert!(!errors.has("confirmPassword"));

        let errors = PasswordForm {
            current_password: "secret1".to_string(),
            new_password: "secret2".to_string(),
            confirm_password: "secret3".to_string(),
        }
        .validate();
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
        assert_eq!(errors.len(), 1);
    }
}
