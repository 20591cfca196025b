//! Blog article repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use oakwood_core::{ArticleId, Slug};

use super::RepositoryError;
use crate::models::{Article, ArticleChanges, NewArticle};

/// Columns selected for every article lookup.
const ARTICLE_COLUMNS: &str =
    "id, title, slug, content, photo, is_published, views_count, created_at";

/// Database row for an article.
#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i32,
    title: String,
    slug: String,
    content: String,
    photo: Option<String>,
    is_published: bool,
    views_count: i32,
    created_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: ArticleId::new(row.id),
            title: row.title,
            slug: Slug::from_stored(row.slug),
            content: row.content,
            photo: row.photo,
            is_published: row.is_published,
            views_count: row.views_count,
            created_at: row.created_at,
        }
    }
}

/// Repository for blog article database operations.
pub struct ArticleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List published articles, newest first.
    ///
    /// Unpublished articles are excluded here but still reachable by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<Article>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE is_published = TRUE ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Get an article by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Article::from))
    }

    /// Insert a new article.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, new: NewArticle) -> Result<Article, RepositoryError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            "INSERT INTO articles (title, slug, content, photo, is_published) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(&new.title)
        .bind(new.slug.as_str())
        .bind(&new.content)
        .bind(&new.photo)
        .bind(new.is_published)
        .fetch_one(self.pool)
        .await?;

        Ok(Article::from(row))
    }

    /// Update an existing article.
    ///
    /// The slug is never touched: it was fixed when the article was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the article doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ArticleId,
        changes: ArticleChanges,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE articles SET title = $2, content = $3, photo = COALESCE($4, photo), \
                 is_published = $5 \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.photo)
        .bind(changes.is_published)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete an article.
    ///
    /// # Returns
    ///
    /// Returns `true` if the article was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ArticleId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record one detail-page view and return the new count.
    ///
    /// A single atomic increment at the storage layer: concurrent views of
    /// the same article cannot lose updates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the article doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn record_view(&self, id: ArticleId) -> Result<i32, RepositoryError> {
        let count: Option<(i32,)> = sqlx::query_as(
            "UPDATE articles SET views_count = views_count + 1 WHERE id = $1 \
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
}
