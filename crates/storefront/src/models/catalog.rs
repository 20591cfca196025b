//! Catalog domain types: categories, products, and product versions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use oakwood_core::{CategoryId, ProductId, Slug, VersionId};

/// A product category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// A catalog product (domain type).
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    pub name: String,
    /// Derived from the name at creation time; never recomputed on edit.
    pub slug: Slug,
    pub description: String,
    /// Stored path of the uploaded photo, if any.
    pub photo: Option<String>,
    pub category_id: CategoryId,
    pub price: Decimal,
    /// Optional manufacturing date.
    pub manufactured_at: Option<NaiveDate>,
    /// Detail-page access counter; never decreases.
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product row as shown on listing pages, with its category name joined in.
#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub price: Decimal,
    pub category_name: String,
    pub views_count: i32,
}

/// Input for creating a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    /// Derived from the name by the caller, stored verbatim.
    pub slug: Slug,
    pub description: String,
    pub photo: Option<String>,
    pub category_id: CategoryId,
    pub price: Decimal,
    pub manufactured_at: Option<NaiveDate>,
}

/// Editable product fields.
///
/// The slug is deliberately absent: it is fixed at creation time. `photo`
/// is only written when a new upload was provided.
#[derive(Debug, Clone)]
pub struct ProductChanges {
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub category_id: CategoryId,
    pub price: Decimal,
    pub manufactured_at: Option<NaiveDate>,
}

/// Input for recording a new product version.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub product_id: ProductId,
    pub version_number: String,
    pub version_name: String,
    pub is_active: bool,
}

/// A released version of a product.
///
/// At most one version per product is active; the active one is shown on
/// the product detail page.
#[derive(Debug, Clone)]
pub struct Version {
    pub id: VersionId,
    pub product_id: ProductId,
    pub version_number: String,
    pub version_name: String,
    pub is_active: bool,
}
