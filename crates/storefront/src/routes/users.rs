//! Account lifecycle route handlers.
//!
//! Registration, email confirmation, password reset, login, and logout.
//! Validation failures re-render the submitting form with a field message;
//! lookup misses on tokens and emails surface as a generic not-found page
//! (deliberately indistinguishable from "never existed").

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::accounts::RegisterRequest;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Password reset form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
}

/// Query flags for success banners on the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
    pub confirmed: Option<String>,
    pub reset: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub email: String,
    pub phone: String,
    pub country: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Password reset page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub error: Option<String>,
    pub email: String,
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        error: None,
        email: String::new(),
        phone: String::new(),
        country: String::new(),
    }
}

/// Handle registration form submission.
///
/// On success the account is left pending verification and the user is sent
/// to the login page; the confirmation link goes out by email.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let request = RegisterRequest {
        email: form.email.trim().to_owned(),
        password: form.password,
        password_confirm: form.password_confirm,
        phone: form.phone.clone().filter(|v| !v.trim().is_empty()),
        country: form.country.clone().filter(|v| !v.trim().is_empty()),
    };

    match state.accounts().register(request).await {
        Ok(_) => Ok(Redirect::to("/users/login?registered=1").into_response()),
        Err(e) => match e.form_message() {
            Some(message) => Ok(RegisterTemplate {
                error: Some(message),
                email: form.email,
                phone: form.phone.unwrap_or_default(),
                country: form.country.unwrap_or_default(),
            }
            .into_response()),
            None => Err(e.into()),
        },
    }
}

/// Activate an account from an emailed confirmation link.
///
/// The token is consumed on success; hitting the link again lands on the
/// same not-found page as a token that never existed.
#[instrument(skip(state, token))]
pub async fn email_confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Redirect> {
    let identity = state.accounts().confirm_email(&token).await?;

    tracing::info!(user_id = %identity.id, "Email confirmed");
    Ok(Redirect::to("/users/login?confirmed=1"))
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the password reset page.
pub async fn reset_password_page() -> impl IntoResponse {
    ResetPasswordTemplate {
        error: None,
        email: String::new(),
    }
}

/// Handle password reset form submission.
///
/// Sends a freshly issued temporary password to the given address and
/// redirects to the login page.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    match state.accounts().reset_password(form.email.trim()).await {
        Ok(()) => Ok(Redirect::to("/users/login?reset=1").into_response()),
        Err(e) => match e.form_message() {
            Some(message) => Ok(ResetPasswordTemplate {
                error: Some(message),
                email: form.email,
            }
            .into_response()),
            None => Err(e.into()),
        },
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    let success = if query.confirmed.is_some() {
        Some("Email confirmed. You can now log in.".to_owned())
    } else if query.registered.is_some() {
        Some("Account created. Check your email for a confirmation link.".to_owned())
    } else if query.reset.is_some() {
        Some("A new password has been emailed to you.".to_owned())
    } else {
        None
    };

    LoginTemplate {
        error: None,
        success,
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match state
        .accounts()
        .login(form.email.trim(), &form.password)
        .await
    {
        Ok(identity) => {
            let user = CurrentUser::new(identity.id, identity.email);
            set_current_user(&session, &user)
                .await
                .map_err(|e| AppError::Internal(format!("failed to write session: {e}")))?;

            Ok(Redirect::to("/users/profile").into_response())
        }
        Err(e) => match e.form_message() {
            Some(message) => Ok(LoginTemplate {
                error: Some(message),
                success: None,
            }
            .into_response()),
            None => Err(e.into()),
        },
    }
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;

    Ok(Redirect::to("/"))
}
