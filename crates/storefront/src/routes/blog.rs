//! Blog route handlers.
//!
//! The listing shows published articles only; unpublished ones stay
//! reachable by ID. Create and edit forms are multipart (preview image)
//! and run the content moderation policy before anything is persisted.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use oakwood_core::{ArticleId, Slug};

use crate::db::ArticleRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::{Article, ArticleChanges, NewArticle};
use crate::services::uploads::{self, FormData};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/list.html")]
pub struct BlogListTemplate {
    pub articles: Vec<Article>,
}

/// Article detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/detail.html")]
pub struct BlogDetailTemplate {
    pub article: Article,
    /// View count including this visit.
    pub views: i32,
}

/// Article create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/form.html")]
pub struct BlogFormTemplate {
    /// Where the form posts back to.
    pub action: String,
    pub title: String,
    pub content: String,
    pub is_published: bool,
    pub error: Option<String>,
}

/// Article fields parsed out of a submitted multipart form.
struct ParsedArticle {
    title: String,
    content: String,
    is_published: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the blog index with published articles, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<BlogListTemplate> {
    let articles = ArticleRepository::new(state.pool()).list_published().await?;
    Ok(BlogListTemplate { articles })
}

/// Display an article, recording the view.
///
/// Every render of this page increments the counter; a refresh counts
/// again. The increment is atomic at the storage layer.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<BlogDetailTemplate> {
    let repo = ArticleRepository::new(state.pool());

    let article = repo
        .get(ArticleId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("article {id}")))?;

    let views = repo.record_view(article.id).await?;

    Ok(BlogDetailTemplate { article, views })
}

/// Display the new-article form.
pub async fn new_form() -> impl IntoResponse {
    BlogFormTemplate {
        action: "/blog/new".to_owned(),
        title: String::new(),
        content: String::new(),
        is_published: true,
        error: None,
    }
}

/// Create an article from a multipart form submission.
#[instrument(skip(state, multipart))]
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let form = FormData::parse(multipart).await?;

    let parsed = match validate_article_form(&state, &form) {
        Ok(parsed) => parsed,
        Err(message) => {
            return Ok(form_with_values("/blog/new".to_owned(), &form, message).into_response());
        }
    };

    let photo = match &form.upload {
        Some(file) => Some(uploads::store_file(&state.config().upload_dir, file).await?),
        None => None,
    };

    let article = ArticleRepository::new(state.pool())
        .create(NewArticle {
            slug: Slug::from_title(&parsed.title),
            title: parsed.title,
            content: parsed.content,
            photo,
            is_published: parsed.is_published,
        })
        .await?;

    tracing::info!(article_id = %article.id, "Article created");
    Ok(Redirect::to("/blog").into_response())
}

/// Display the edit form for an existing article.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<BlogFormTemplate> {
    let article = ArticleRepository::new(state.pool())
        .get(ArticleId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("article {id}")))?;

    Ok(BlogFormTemplate {
        action: format!("/blog/{id}/edit"),
        title: article.title,
        content: article.content,
        is_published: article.is_published,
        error: None,
    })
}

/// Update an article from a multipart form submission.
///
/// The slug is left untouched: it was derived from the title at creation.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let repo = ArticleRepository::new(state.pool());
    let article_id = ArticleId::new(id);

    if repo.get(article_id).await?.is_none() {
        return Err(AppError::NotFound(format!("article {id}")));
    }

    let form = FormData::parse(multipart).await?;

    let parsed = match validate_article_form(&state, &form) {
        Ok(parsed) => parsed,
        Err(message) => {
            return Ok(
                form_with_values(format!("/blog/{id}/edit"), &form, message).into_response()
            );
        }
    };

    let photo = match &form.upload {
        Some(file) => Some(uploads::store_file(&state.config().upload_dir, file).await?),
        None => None,
    };

    repo.update(
        article_id,
        ArticleChanges {
            title: parsed.title,
            content: parsed.content,
            photo,
            is_published: parsed.is_published,
        },
    )
    .await?;

    Ok(Redirect::to(&format!("/blog/{id}")).into_response())
}

/// Delete an article.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Redirect> {
    let deleted = ArticleRepository::new(state.pool())
        .delete(ArticleId::new(id))
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("article {id}")));
    }

    tracing::info!(article_id = id, "Article deleted");
    Ok(Redirect::to("/blog"))
}

// =============================================================================
// Form Helpers
// =============================================================================

/// Parse and validate a submitted article form.
fn validate_article_form(
    state: &AppState,
    form: &FormData,
) -> std::result::Result<ParsedArticle, String> {
    let title = form.optional("title").ok_or("Enter a title.")?;
    let content = form.optional("content").ok_or("Enter the article text.")?;

    state
        .policy()
        .validate(&title, &content)
        .map_err(|e| e.to_string())?;

    Ok(ParsedArticle {
        title,
        content,
        is_published: form.checkbox("is_published"),
    })
}

/// Rebuild the form template with the submitted values and an error.
fn form_with_values(action: String, form: &FormData, error: impl Into<String>) -> BlogFormTemplate {
    BlogFormTemplate {
        action,
        title: form.text("title").unwrap_or_default().to_owned(),
        content: form.text("content").unwrap_or_default().to_owned(),
        is_published: form.checkbox("is_published"),
        error: Some(error.into()),
    }
}
