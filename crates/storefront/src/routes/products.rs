//! Product route handlers.
//!
//! Create and edit forms are multipart (they carry a photo upload) and run
//! the content moderation policy before anything is persisted; a rejection
//! re-renders the form with the field-scoped message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use oakwood_core::{CategoryId, ProductId, Slug};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::{Category, NewProduct, NewVersion, Product, ProductChanges, Version};
use crate::services::uploads::{self, FormData};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Version form data.
#[derive(Debug, Deserialize)]
pub struct VersionForm {
    pub version_number: String,
    pub version_name: String,
    /// Present when the checkbox was ticked.
    pub is_active: Option<String>,
}

/// Product fields parsed out of a submitted multipart form.
struct ParsedProduct {
    name: String,
    description: String,
    category_id: CategoryId,
    price: Decimal,
    manufactured_at: Option<NaiveDate>,
}

// =============================================================================
// Templates
// =============================================================================

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/detail.html")]
pub struct ProductDetailTemplate {
    pub product: Product,
    pub category: Category,
    pub versions: Vec<Version>,
    /// View count including this visit.
    pub views: i32,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    /// Where the form posts back to.
    pub action: String,
    pub categories: Vec<Category>,
    pub name: String,
    pub description: String,
    pub price: String,
    pub manufactured_at: String,
    /// Selected category, 0 when none.
    pub category_id: i32,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a product, recording the view.
///
/// Every render of this page increments the counter; a refresh counts
/// again. The increment is atomic at the storage layer.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductDetailTemplate> {
    let repo = ProductRepository::new(state.pool());

    let product = repo
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let views = repo.record_view(product.id).await?;

    let category = CategoryRepository::new(state.pool())
        .get(product.category_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("missing category for product {id}")))?;

    let versions = repo.versions(product.id).await?;

    Ok(ProductDetailTemplate {
        product,
        category,
        versions,
        views,
    })
}

/// Display the new-product form.
#[instrument(skip(state))]
pub async fn new_form(State(state): State<AppState>) -> Result<ProductFormTemplate> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(ProductFormTemplate {
        action: "/products/new".to_owned(),
        categories,
        name: String::new(),
        description: String::new(),
        price: String::new(),
        manufactured_at: String::new(),
        category_id: 0,
        error: None,
    })
}

/// Create a product from a multipart form submission.
#[instrument(skip(state, multipart))]
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let form = FormData::parse(multipart).await?;

    let parsed = match validate_product_form(&state, &form) {
        Ok(parsed) => parsed,
        Err(message) => {
            let template = form_with_values(&state, "/products/new".to_owned(), &form, message)
                .await?;
            return Ok(template.into_response());
        }
    };

    let photo = match &form.upload {
        Some(file) => Some(uploads::store_file(&state.config().upload_dir, file).await?),
        None => None,
    };

    let product = ProductRepository::new(state.pool())
        .create(NewProduct {
            slug: Slug::from_title(&parsed.name),
            name: parsed.name,
            description: parsed.description,
            photo,
            category_id: parsed.category_id,
            price: parsed.price,
            manufactured_at: parsed.manufactured_at,
        })
        .await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok(Redirect::to("/").into_response())
}

/// Display the edit form for an existing product.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductFormTemplate> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let categories = CategoryRepository::new(state.pool()).list().await?;

    Ok(ProductFormTemplate {
        action: format!("/products/{id}/edit"),
        categories,
        name: product.name,
        description: product.description,
        price: product.price.to_string(),
        manufactured_at: product
            .manufactured_at
            .map(|d| d.to_string())
            .unwrap_or_default(),
        category_id: product.category_id.as_i32(),
        error: None,
    })
}

/// Update a product from a multipart form submission.
///
/// The slug is left untouched: it was derived from the name at creation.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let repo = ProductRepository::new(state.pool());
    let product_id = ProductId::new(id);

    if repo.get(product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let form = FormData::parse(multipart).await?;

    let parsed = match validate_product_form(&state, &form) {
        Ok(parsed) => parsed,
        Err(message) => {
            let template =
                form_with_values(&state, format!("/products/{id}/edit"), &form, message).await?;
            return Ok(template.into_response());
        }
    };

    let photo = match &form.upload {
        Some(file) => Some(uploads::store_file(&state.config().upload_dir, file).await?),
        None => None,
    };

    repo.update(
        product_id,
        ProductChanges {
            name: parsed.name,
            description: parsed.description,
            photo,
            category_id: parsed.category_id,
            price: parsed.price,
            manufactured_at: parsed.manufactured_at,
        },
    )
    .await?;

    Ok(Redirect::to(&format!("/products/{id}")).into_response())
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Redirect> {
    let deleted = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    tracing::info!(product_id = id, "Product deleted");
    Ok(Redirect::to("/"))
}

/// Record a new version for a product.
#[instrument(skip(state, form))]
pub async fn add_version(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<VersionForm>,
) -> Result<Redirect> {
    let repo = ProductRepository::new(state.pool());
    let product_id = ProductId::new(id);

    if repo.get(product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let version_number = form.version_number.trim();
    let version_name = form.version_name.trim();
    if version_number.is_empty() || version_name.is_empty() {
        return Err(AppError::BadRequest(
            "version number and name are required".to_owned(),
        ));
    }

    repo.add_version(NewVersion {
        product_id,
        version_number: version_number.to_owned(),
        version_name: version_name.to_owned(),
        is_active: form.is_active.is_some(),
    })
    .await?;

    Ok(Redirect::to(&format!("/products/{id}")))
}

// =============================================================================
// Form Helpers
// =============================================================================

/// Parse and validate a submitted product form.
///
/// Returns the parsed fields, or the message to show on the re-rendered
/// form. Moderation runs last so typed fields are checked as they will be
/// stored.
fn validate_product_form(state: &AppState, form: &FormData) -> std::result::Result<ParsedProduct, String> {
    let name = form.optional("name").ok_or("Enter a product name.")?;
    let description = form
        .optional("description")
        .ok_or("Enter a product description.")?;

    let category_id = form
        .text("category_id")
        .and_then(|v| v.parse::<i32>().ok())
        .filter(|v| *v > 0)
        .map(CategoryId::new)
        .ok_or("Choose a category.")?;

    let price = form
        .text("price")
        .and_then(|v| v.parse::<Decimal>().ok())
        .ok_or("Enter a valid price.")?;

    let manufactured_at = match form.optional("manufactured_at") {
        Some(value) => Some(
            NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .map_err(|_| "Enter the manufacturing date as YYYY-MM-DD.")?,
        ),
        None => None,
    };

    state
        .policy()
        .validate(&name, &description)
        .map_err(|e| e.to_string())?;

    Ok(ParsedProduct {
        name,
        description,
        category_id,
        price,
        manufactured_at,
    })
}

/// Rebuild the form template with the submitted values and an error.
async fn form_with_values(
    state: &AppState,
    action: String,
    form: &FormData,
    error: impl Into<String>,
) -> Result<ProductFormTemplate> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(ProductFormTemplate {
        action,
        categories,
        name: form.text("name").unwrap_or_default().to_owned(),
        description: form.text("description").unwrap_or_default().to_owned(),
        price: form.text("price").unwrap_or_default().to_owned(),
        manufactured_at: form.text("manufactured_at").unwrap_or_default().to_owned(),
        category_id: form
            .text("category_id")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        error: Some(error.into()),
    })
}
