/**
 * Bio Routes
 * The writer's public bio and its admin editor
 */
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{bio, models::WriterBio};
use crate::error::ApiError;
use crate::routes::{auth::AdminAuth, require_pool, validation};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateBioRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub email: String,
}

/// GET /api/bio
pub async fn get_bio() -> Result<Json<WriterBio>, ApiError> {
    let pool = require_pool()?;
    bio::get(&pool)
        .await
        .map_err(|e| ApiError::database("Failed to load bio", e))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Bio not found".to_string()))
}

/// PUT /api/admin/bio
pub async fn update_bio(
    _admin: AdminAuth,
    Json(payload): Json<UpdateBioRequest>,
) -> Result<Json<WriterBio>, ApiError> {
    let name = validation::required("Name", &payload.name)?;
    let title = validation::required("Title", &payload.title)?;
    let text = validation::required("Bio", &payload.bio)?;
    let email = validation::email(&payload.email)?;

    let pool = require_pool()?;
    let saved = bio::upsert(&pool, &name, &title, &text, &email)
        .await
        .map_err(|e| ApiError::database("Failed to save bio", e))?;

    tracing::info!("writer bio updated");
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{admin_token, send};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::{get, put};
    use axum::Router;

    fn bio_router() -> Router {
        Router::new()
            .route("/api/bio", get(get_bio))
            .route("/api/admin/bio", put(update_bio))
    }

    #[tokio::test]
    async fn test_get_bio_without_database_is_unavailable() {
        let req = Request::get("/api/bio").body(Body::empty()).unwrap();
        let (status, _) = send(bio_router(), req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_update_requires_token() {
        let req = Request::put("/api/admin/bio")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"A","title":"Poet","bio":"b","email":"a@b.co"}"#))
            .unwrap();
        let (status, _) = send(bio_router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_validates_fields() {
        let req = Request::put("/api/admin/bio")
            .header("authorization", format!("Bearer {}", admin_token()))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"A","title":"Poet","bio":"","email":"a@b.co"}"#))
            .unwrap();
        let (status, bytes) = send(bio_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: crate::error::ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Bio is required");
    }
}
