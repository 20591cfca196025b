//! Profile route handlers.
//!
//! These routes require authentication; the extractor redirects anonymous
//! visitors to the login page. A user can only ever reach their own record.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::auth::RequireAuth;
use crate::models::ProfileChanges;
use crate::services::uploads::{self, FormData};
use crate::state::AppState;

/// Query flag for the saved banner.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub saved: Option<String>,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/profile.html")]
pub struct ProfileTemplate {
    pub email: String,
    pub phone: String,
    pub country: String,
    pub avatar: Option<String>,
    pub saved: bool,
}

/// Display the profile page for the logged-in user.
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn profile_page(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    Query(query): Query<ProfileQuery>,
) -> Result<ProfileTemplate> {
    let identity = state.accounts().get(current_user.id).await?;

    Ok(ProfileTemplate {
        email: identity.email.to_string(),
        phone: identity.phone.unwrap_or_default(),
        country: identity.country.unwrap_or_default(),
        avatar: identity.avatar,
        saved: query.saved.is_some(),
    })
}

/// Update the logged-in user's profile fields.
///
/// The avatar is only replaced when a new file was uploaded; phone and
/// country are written as submitted.
#[instrument(skip(state, current_user, multipart), fields(user_id = %current_user.id))]
pub async fn profile_update(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = FormData::parse(multipart).await?;

    let avatar = match &form.upload {
        Some(file) => Some(uploads::store_file(&state.config().upload_dir, file).await?),
        None => None,
    };

    state
        .accounts()
        .update_profile(
            current_user.id,
            ProfileChanges {
                phone: form.optional("phone"),
                country: form.optional("country"),
                avatar,
            },
        )
        .await?;

    Ok(Redirect::to("/users/profile?saved=1"))
}
