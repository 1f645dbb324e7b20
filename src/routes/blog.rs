/**
 * Blog Routes
 * Public listing plus admin CRUD for blog posts
 */
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{
    self, blog,
    models::{BlogPost, NewBlogPost},
};
use crate::error::ApiError;
use crate::routes::{auth::AdminAuth, require_pool, validation, CategoryQuery, SuccessResponse};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogListResponse {
    pub items: Vec<BlogPost>,
    pub total: usize,
}

impl From<Vec<BlogPost>> for BlogListResponse {
    fn from(items: Vec<BlogPost>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Request body for POST /api/admin/blog
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
    pub read_time: Option<String>,
    pub image_url: Option<String>,
    pub published: Option<bool>,
}

/// Request body for PATCH /api/admin/blog/{id}
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub read_time: Option<String>,
    pub image_url: Option<String>,
    pub published: Option<bool>,
}

/// Sanitized HTML body.
fn prepare_content(raw: &str) -> Result<String, ApiError> {
    let content = validation::sanitize_html(&validation::required("Content", raw)?);
    if content.trim().is_empty() {
        return Err(ApiError::bad_request("Content is required"));
    }
    Ok(content)
}

/// The editor's read time when given, otherwise an estimate from the content.
fn read_time_or_estimate(read_time: Option<&str>, content: &str) -> String {
    validation::optional(read_time).unwrap_or_else(|| validation::estimate_read_time(content))
}

impl CreateBlogRequest {
    fn validate(self) -> Result<NewBlogPost, ApiError> {
        let title = validation::required("Title", &self.title)?;
        let excerpt = validation::required("Excerpt", &self.excerpt)?;
        let content = prepare_content(&self.content)?;
        let read_time = read_time_or_estimate(self.read_time.as_deref(), &content);

        Ok(NewBlogPost {
            title,
            excerpt,
            content,
            category: validation::category(self.category.as_deref()),
            read_time,
            image_url: validation::image_url(self.image_url.as_deref())?,
            published: self.published.unwrap_or(false),
        })
    }
}

impl UpdateBlogRequest {
    fn merge(self, existing: BlogPost) -> Result<NewBlogPost, ApiError> {
        let title =
            validation::required("Title", self.title.as_deref().unwrap_or(&existing.title))?;
        let excerpt =
            validation::required("Excerpt", self.excerpt.as_deref().unwrap_or(&existing.excerpt))?;

        let (content, content_changed) = match self.content {
            Some(raw) => (prepare_content(&raw)?, true),
            None => (existing.content, false),
        };

        // A blank readTime asks for a fresh estimate.
        let read_time = match self.read_time {
            Some(rt) => read_time_or_estimate(Some(rt.as_str()), &content),
            None if content_changed => validation::estimate_read_time(&content),
            None => existing.read_time,
        };

        let image_url = match self.image_url {
            Some(url) => validation::image_url(Some(&url))?,
            None => existing.image_url,
        };

        Ok(NewBlogPost {
            title,
            excerpt,
            content,
            category: match self.category {
                Some(c) => validation::category(Some(&c)),
                None => existing.category,
            },
            read_time,
            image_url,
            published: self.published.unwrap_or(existing.published),
        })
    }
}

// ============================================================================
// Public Handlers
// ============================================================================

/// GET /api/blog?category= - Published posts, newest first
pub async fn list_posts(Query(query): Query<CategoryQuery>) -> impl IntoResponse {
    let Some(pool) = db::get_pool() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(BlogListResponse::from(Vec::new())),
        );
    };

    let items = blog::list_published(&pool, query.category())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Error fetching blog posts: {}", e);
            Vec::new()
        });

    (StatusCode::OK, Json(BlogListResponse::from(items)))
}

/// GET /api/blog/categories
pub async fn list_categories() -> Result<Json<Vec<String>>, ApiError> {
    let pool = require_pool()?;
    let categories = blog::published_categories(&pool)
        .await
        .map_err(|e| ApiError::database("Failed to load categories", e))?;
    Ok(Json(categories))
}

/// GET /api/blog/{id}
pub async fn get_post(Path(id): Path<Uuid>) -> Result<Json<BlogPost>, ApiError> {
    let pool = require_pool()?;
    blog::get_published(&pool, id)
        .await
        .map_err(|e| ApiError::database("Failed to load blog post", e))?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /api/admin/blog
pub async fn admin_list_posts(_admin: AdminAuth) -> Result<Json<BlogListResponse>, ApiError> {
    let pool = require_pool()?;
    let items = blog::list_all(&pool)
        .await
        .map_err(|e| ApiError::database("Failed to load blog posts", e))?;
    Ok(Json(BlogListResponse::from(items)))
}

/// POST /api/admin/blog
pub async fn create_post(
    _admin: AdminAuth,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = payload.validate()?;
    let pool = require_pool()?;

    let created = blog::create(&pool, &post)
        .await
        .map_err(|e| ApiError::database("Failed to save blog post", e))?;

    tracing::info!(post_id = %created.id, published = created.published, "blog post created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/admin/blog/{id}
pub async fn update_post(
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Result<Json<BlogPost>, ApiError> {
    let pool = require_pool()?;

    let existing = blog::get(&pool, id)
        .await
        .map_err(|e| ApiError::database("Failed to load blog post", e))?
        .ok_or_else(ApiError::not_found)?;

    let post = payload.merge(existing)?;

    blog::update(&pool, id, &post)
        .await
        .map_err(|e| ApiError::database("Failed to update blog post", e))?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// DELETE /api/admin/blog/{id}
pub async fn delete_post(
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let pool = require_pool()?;

    if !blog::delete(&pool, id)
        .await
        .map_err(|e| ApiError::database("Failed to delete blog post", e))?
    {
        return Err(ApiError::not_found());
    }

    tracing::info!(post_id = %id, "blog post deleted");
    Ok(Json(SuccessResponse { success: true }))
}
