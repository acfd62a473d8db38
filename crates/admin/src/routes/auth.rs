//! Login, registration and logout pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use backoffice_core::{Email, FieldErrors};

use crate::filters;
use crate::middleware::auth::{HOME_PATH, LOGIN_PATH};
use crate::middleware::{OptionalAuth, clear_current_account, set_current_account, set_flash};
use crate::models::{CurrentAccount, Flash};
use crate::services::auth::{AuthError, AuthService, validate_registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    /// Checkbox: present ("on") only when ticked.
    pub terms: Option<String>,
}

/// Query parameters for notices on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub success: Option<String>,
    pub expired: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub errors: FieldErrors,
    /// Form-level error (bad credentials).
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub name: String,
    pub email: String,
    pub terms: bool,
    pub errors: FieldErrors,
}

// =============================================================================
// Login
// =============================================================================

fn login_notice(query: &LoginQuery) -> (Option<String>, Option<String>) {
    let success = match query.success.as_deref() {
        Some("registered") => Some("Registration successful! Please sign in.".to_string()),
        Some("logged_out") => Some("You have been signed out.".to_string()),
        _ => None,
    };
    let error = query
        .expired
        .as_ref()
        .map(|_| "Session expired. Please login again.".to_string());
    (error, success)
}

/// Display the login page.
pub async fn login_page(
    OptionalAuth(account): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if account.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    let (error, success) = login_notice(&query);
    LoginTemplate {
        email: String::new(),
        errors: FieldErrors::new(),
        error,
        success,
    }
    .into_response()
}

fn validate_login(form: &LoginForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check(
        Email::parse(&form.email).is_err(),
        "email",
        "Invalid email address",
    );
    errors.check(form.password.is_empty(), "password", "Password is required");
    errors
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let errors = validate_login(&form);
    let rerender = |errors: FieldErrors, error: Option<String>, status: StatusCode| {
        (
            status,
            LoginTemplate {
                email: form.email.trim().to_string(),
                errors,
                error,
                success: None,
            },
        )
            .into_response()
    };

    if !errors.is_empty() {
        return rerender(errors, None, StatusCode::UNPROCESSABLE_ENTITY);
    }

    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(account) => {
            // New session id on privilege change
            if let Err(e) = session.cycle_id().await {
                error!(error = %e, "Failed to cycle session id");
            }
            if let Err(e) = set_current_account(&session, &CurrentAccount::from(&account)).await {
                error!(error = %e, "Failed to store session");
                return rerender(
                    FieldErrors::new(),
                    Some("Login failed. Please try again.".to_string()),
                    StatusCode::INTERNAL_SERVER_ERROR,
                );
            }
            let _ = set_flash(&session, Flash::success("Login successful!")).await;
            info!(account_id = %account.id, "Account logged in");
            Redirect::to(HOME_PATH).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            warn!("Invalid login attempt");
            rerender(
                FieldErrors::new(),
                Some("Invalid email or password".to_string()),
                StatusCode::UNAUTHORIZED,
            )
        }
        Err(e) => {
            error!(error = %e, "Login failed");
            rerender(
                FieldErrors::new(),
                Some("Login failed. Please try again.".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(account): OptionalAuth) -> Response {
    if account.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    RegisterTemplate {
        name: String::new(),
        email: String::new(),
        terms: false,
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Validate everything the registration page asks for.
///
/// Account rules come from the auth service; the page adds confirmation and
/// the terms checkbox.
pub(crate) fn validate_register_form(form: &RegisterForm) -> FieldErrors {
    let mut errors = validate_registration(&form.name, &form.email, &form.password)
        .err()
        .unwrap_or_default();
    errors.check(
        form.password != form.confirm_password,
        "confirmPassword",
        "Passwords do not match",
    );
    errors.check(form.terms.is_none(), "terms", "You must agree to terms");
    errors
}

/// Handle registration form submission.
#[instrument(skip(state, form))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let rerender = |errors: FieldErrors, status: StatusCode| {
        (
            status,
            RegisterTemplate {
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                terms: form.terms.is_some(),
                errors,
            },
        )
            .into_response()
    };

    let errors = validate_register_form(&form);
    if !errors.is_empty() {
        return rerender(errors, StatusCode::UNPROCESSABLE_ENTITY);
    }

    match AuthService::new(state.pool())
        .register(&form.name, &form.email, &form.password)
        .await
    {
        Ok(account) => {
            info!(account_id = %account.id, "Account registered");
            send_welcome_email(&state, account.email.as_str(), &account.name);
            Redirect::to(&format!("{LOGIN_PATH}?success=registered")).into_response()
        }
        Err(AuthError::UserAlreadyExists) => {
            let mut errors = FieldErrors::new();
            errors.add("email", "User already exists");
            rerender(errors, StatusCode::CONFLICT)
        }
        Err(AuthError::Validation(errors)) => rerender(errors, StatusCode::UNPROCESSABLE_ENTITY),
        Err(e) => {
            error!(error = %e, "Registration failed");
            let mut errors = FieldErrors::new();
            errors.add("form", "Registration failed. Please try again.");
            rerender(errors, StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Send the welcome email in the background; failures are only logged.
pub(crate) fn send_welcome_email(state: &AppState, to: &str, name: &str) {
    let Some(email) = state.email().cloned() else {
        return;
    };
    let (to, name) = (to.to_string(), name.to_string());
    tokio::spawn(async move {
        if let Err(e) = email.send_welcome_email(&to, &name).await {
            warn!(error = %e, "Failed to send welcome email");
        }
    });
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_account(&session).await {
        error!(error = %e, "Failed to clear session");
    }
    Redirect::to(LOGIN_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            terms: Some("on".to_string()),
        }
    }

    #[test]
    fn test_register_form_valid() {
        assert!(validate_register_form(&form()).is_empty());
    }

    #[test]
    fn test_register_form_checks_confirmation_and_terms() {
        let errors = validate_register_form(&RegisterForm {
            confirm_password: "secret2".to_string(),
            terms: None,
            ..form()
        });
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
        assert_eq!(errors.get("terms"), Some("You must agree to terms"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_register_form_includes_account_rules() {
        let errors = validate_register_form(&RegisterForm {
            name: "J".to_string(),
            password: "abc".to_string(),
            confirm_password: "abc".to_string(),
            ..form()
        });
        assert_eq!(errors.get("name"), Some("Name must be at least 2 characters"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
    }

    #[test]
    fn test_login_validation_messages() {
        let errors = validate_login(&LoginForm::default());
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn test_login_notices() {
        let (error, success) = login_notice(&LoginQuery {
            success: Some("registered".to_string()),
            expired: None,
        });
        assert!(error.is_none());
        assert_eq!(
            success.as_deref(),
            Some("Registration successful! Please sign in.")
        );

        let (error, _) = login_notice(&LoginQuery {
            success: None,
            expired: Some("1".to_string()),
        });
        assert_eq!(error.as_deref(), Some("Session expired. Please login again."));
    }
}
