//! Blog article domain type.

use chrono::{DateTime, Utc};

use oakwood_core::{ArticleId, Slug};

/// A blog article.
#[derive(Debug, Clone)]
pub struct Article {
    /// Unique article ID.
    pub id: ArticleId,
    pub title: String,
    /// Derived from the title at creation time; never recomputed on edit.
    pub slug: Slug,
    pub content: String,
    /// Stored path of the uploaded preview image, if any.
    pub photo: Option<String>,
    /// Unpublished articles are hidden from the listing but still reachable
    /// by ID.
    pub is_published: bool,
    /// Detail-page access counter; never decreases.
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    /// Derived from the title by the caller, stored verbatim.
    pub slug: Slug,
    pub content: String,
    pub photo: Option<String>,
    pub is_published: bool,
}

/// Editable article fields.
///
/// The slug is deliberately absent: it is fixed at creation time. `photo`
/// is only written when a new upload was provided.
#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub title: String,
    pub content: String,
    pub photo: Option<String>,
    pub is_published: bool,
}
