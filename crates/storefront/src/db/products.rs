//! Product and version repository.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use oakwood_core::{CategoryId, ProductId, Slug, VersionId};

use super::RepositoryError;
use crate::models::{NewProduct, NewVersion, Product, ProductChanges, ProductSummary, Version};

/// Columns selected for every product lookup.
const PRODUCT_COLUMNS: &str = "id, name, slug, description, photo, category_id, price, \
     manufactured_at, views_count, created_at, updated_at";

/// Database row for a product.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    photo: Option<String>,
    category_id: i32,
    price: Decimal,
    manufactured_at: Option<NaiveDate>,
    views_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            description: row.description,
            photo: row.photo,
            category_id: CategoryId::new(row.category_id),
            price: row.price,
            manufactured_at: row.manufactured_at,
            views_count: row.views_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a product listing entry.
#[derive(sqlx::FromRow)]
struct ProductSummaryRow {
    id: i32,
    name: String,
    description: String,
    photo: Option<String>,
    price: Decimal,
    category_name: String,
    views_count: i32,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            photo: row.photo,
            price: row.price,
            category_name: row.category_name,
            views_count: row.views_count,
        }
    }
}

/// Database row for a product version.
#[derive(sqlx::FromRow)]
struct VersionRow {
    id: i32,
    product_id: i32,
    version_number: String,
    version_name: String,
    is_active: bool,
}

impl From<VersionRow> for Version {
    fn from(row: VersionRow) -> Self {
        Self {
            id: VersionId::new(row.id),
            product_id: ProductId::new(row.product_id),
            version_number: row.version_number,
            version_name: row.version_name,
            is_active: row.is_active,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products, newest first, with category names joined in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_newest(&self) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductSummaryRow>(
            "SELECT p.id, p.name, p.description, p.photo, p.price, \
                    c.name AS category_name, p.views_count \
             FROM products p \
             JOIN categories c ON c.id = p.category_id \
             ORDER BY p.created_at DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products \
                 (name, slug, description, photo, category_id, price, manufactured_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.slug.as_str())
        .bind(&new.description)
        .bind(&new.photo)
        .bind(new.category_id.as_i32())
        .bind(new.price)
        .bind(new.manufactured_at)
        .fetch_one(self.pool)
        .await?;

        Ok(Product::from(row))
    }

    /// Update an existing product.
    ///
    /// The slug is never touched: it was fixed when the product was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, description = $3, photo = COALESCE($4, photo), \
                 category_id = $5, price = $6, manufactured_at = $7, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.photo)
        .bind(changes.category_id.as_i32())
        .bind(changes.price)
        .bind(changes.manufactured_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a product and its versions.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record one detail-page view and return the new count.
    ///
    /// A single atomic increment at the storage layer: concurrent views of
    /// the same product cannot lose updates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn record_view(&self, id: ProductId) -> Result<i32, RepositoryError> {
        let count: Option<(i32,)> = sqlx::query_as(
            "UPDATE products SET views_count = views_count + 1 WHERE id = $1 \
             RETURNING views_count",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match count {
            Some((views,)) => Ok(views),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// List the versions of a product, newest row first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn versions(&self, product_id: ProductId) -> Result<Vec<Version>, RepositoryError> {
        let rows = sqlx::query_as::<_, VersionRow>(
            "SELECT id, product_id, version_number, version_name, is_active \
             FROM versions WHERE product_id = $1 ORDER BY id DESC",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Version::from).collect())
    }

    /// Record a new version of a product.
    ///
    /// When the new version is active, all previously active versions of the
    /// product are deactivated in the same transaction: a product never has
    /// two active versions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn add_version(&self, new: NewVersion) -> Result<Version, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if new.is_active {
            sqlx::query("UPDATE versions SET is_active = FALSE WHERE product_id = $1")
                .bind(new.product_id.as_i32())
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, VersionRow>(
            "INSERT INTO versions (product_id, version_number, version_name, is_active) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, product_id, version_number, version_name, is_active",
        )
        .bind(new.product_id.as_i32())
        .bind(&new.version_number)
        .bind(&new.version_name)
        .bind(new.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Version::from(row))
    }
}
