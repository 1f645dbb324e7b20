/**
 * Poem Routes
 * Public listing plus admin CRUD for poems
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
    self,
    models::{NewPoem, Poem},
    poems,
};
use crate::error::ApiError;
use crate::routes::{auth::AdminAuth, require_pool, validation, CategoryQuery, SuccessResponse};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PoemListResponse {
    pub items: Vec<Poem>,
    pub total: usize,
}

impl From<Vec<Poem>> for PoemListResponse {
    fn from(items: Vec<Poem>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Request body for POST /api/admin/poems
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoemRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub published: Option<bool>,
}

/// Request body for PATCH /api/admin/poems/{id}. Absent fields keep their value;
/// an empty `imageUrl` clears the image.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePoemRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub published: Option<bool>,
}

impl CreatePoemRequest {
    fn validate(self) -> Result<NewPoem, ApiError> {
        Ok(NewPoem {
            title: validation::required("Title", &self.title)?,
            content: validation::required("Content", &self.content)?,
            category: validation::category(self.category.as_deref()),
            image_url: validation::image_url(self.image_url.as_deref())?,
            published: self.published.unwrap_or(false),
        })
    }
}

impl UpdatePoemRequest {
    /// Overlay the provided fields on `existing` and validate the result.
    fn merge(self, existing: Poem) -> Result<NewPoem, ApiError> {
        let image_url = match self.image_url {
            Some(url) => validation::image_url(Some(&url))?,
            None => existing.image_url,
        };
        Ok(NewPoem {
            title: validation::required("Title", self.title.as_deref().unwrap_or(&existing.title))?,
            content: validation::required(
                "Content",
                self.content.as_deref().unwrap_or(&existing.content),
            )?,
            category: match self.category {
                Some(c) => validation::category(Some(&c)),
                None => existing.category,
            },
            image_url,
            published: self.published.unwrap_or(existing.published),
        })
    }
}

// ============================================================================
// Public Handlers
// ============================================================================

/// GET /api/poems?category= - Published poems, newest first.
/// A database failure is logged and reported as an empty list.
pub async fn list_poems(Query(query): Query<CategoryQuery>) -> impl IntoResponse {
    let Some(pool) = db::get_pool() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(PoemListResponse::from(Vec::new())),
        );
    };

    let items = poems::list_published(&pool, query.category())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Error fetching poems: {}", e);
            Vec::new()
        });

    (StatusCode::OK, Json(PoemListResponse::from(items)))
}

/// GET /api/poems/categories
pub async fn list_categories() -> Result<Json<Vec<String>>, ApiError> {
    let pool = require_pool()?;
    let categories = poems::published_categories(&pool)
        .await
        .map_err(|e| ApiError::database("Failed to load categories", e))?;
    Ok(Json(categories))
}

/// GET /api/poems/{id} - One published poem
pub async fn get_poem(Path(id): Path<Uuid>) -> Result<Json<Poem>, ApiError> {
    let pool = require_pool()?;
    poems::get_published(&pool, id)
        .await
        .map_err(|e| ApiError::database("Failed to load poem", e))?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /api/admin/poems - All poems including drafts
pub async fn admin_list_poems(_admin: AdminAuth) -> Result<Json<PoemListResponse>, ApiError> {
    let pool = require_pool()?;
    let items = poems::list_all(&pool)
        .await
        .map_err(|e| ApiError::database("Failed to load poems", e))?;
    Ok(Json(PoemListResponse::from(items)))
}

/// POST /api/admin/poems
pub async fn create_poem(
    _admin: AdminAuth,
    Json(payload): Json<CreatePoemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let poem = payload.validate()?;
    let pool = require_pool()?;

    let created = poems::create(&pool, &poem)
        .await
        .map_err(|e| ApiError::database("Failed to save poem", e))?;

    tracing::info!(poem_id = %created.id, published = created.published, "poem created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/admin/poems/{id}
pub async fn update_poem(
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePoemRequest>,
) -> Result<Json<Poem>, ApiError> {
    let pool = require_pool()?;

    let existing = poems::get(&pool, id)
        .await
        .map_err(|e| ApiError::database("Failed to load poem", e))?
        .ok_or_else(ApiError::not_found)?;

    let poem = payload.merge(existing)?;

    poems::update(&pool, id, &poem)
        .await
        .map_err(|e| ApiError::database("Failed to update poem", e))?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// DELETE /api/admin/poems/{id}
pub async fn delete_poem(
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let pool = require_pool()?;

    if !poems::delete(&pool, id)
        .await
        .map_err(|e| ApiError::database("Failed to delete poem", e))?
    {
        return Err(ApiError::not_found());
    }

    tracing::info!(poem_id = %id, "poem deleted");
    Ok(Json(SuccessResponse { success: true }))
}
