//! Contact form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::instrument;

use crate::filters;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contacts.html")]
pub struct ContactTemplate {
    pub submitted: bool,
}

/// Display the contact form.
pub async fn page() -> impl IntoResponse {
    ContactTemplate { submitted: false }
}

/// Accept a contact form submission.
///
/// Messages are not persisted; they land in the application log for the
/// shop staff to pick up.
#[instrument(skip(form), fields(name = %form.name))]
pub async fn submit(Form(form): Form<ContactForm>) -> impl IntoResponse {
    tracing::info!(
        name = %form.name.trim(),
        phone = %form.phone.trim(),
        message = %form.message.trim(),
        "Contact form message received"
    );

    ContactTemplate { submitted: true }
}
