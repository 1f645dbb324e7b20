/**
 * Comment Routes
 * Visitor comments with admin moderation
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
    self, comments,
    models::{Comment, NewComment, PostType, PublicComment},
};
use crate::error::ApiError;
use crate::routes::{auth::AdminAuth, require_pool, validation, SuccessResponse};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Identifies the post a comment or like belongs to: `?postId=&postType=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRef {
    pub post_id: Uuid,
    pub post_type: PostType,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Option<Uuid>,
    pub post_type: Option<PostType>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentResponse {
    pub success: bool,
    pub message: String,
    pub comment: PublicComment,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminCommentQuery {
    pub approved: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ModerateRequest {
    pub approved: bool,
}

impl CreateCommentRequest {
    fn validate(self) -> Result<NewComment, ApiError> {
        let (Some(post_id), Some(post_type)) = (self.post_id, self.post_type) else {
            return Err(ApiError::bad_request("postId and postType are required"));
        };

        Ok(NewComment {
            post_id,
            post_type,
            author_name: validation::required("Name", &self.author_name)?,
            author_email: validation::email(&self.author_email)?,
            content: validation::required("Comment", &self.content)?,
        })
    }
}

// ============================================================================
// Public Handlers
// ============================================================================

/// GET /api/comments?postId=&postType= - Approved comments, oldest first
pub async fn list_comments(Query(post): Query<PostRef>) -> impl IntoResponse {
    let Some(pool) = db::get_pool() else {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(Vec::<PublicComment>::new()));
    };

    let items: Vec<PublicComment> = comments::list_approved(&pool, post.post_id, post.post_type)
        .await
        .map(|rows| rows.into_iter().map(PublicComment::from).collect())
        .unwrap_or_else(|e| {
            tracing::error!("Error fetching comments: {}", e);
            Vec::new()
        });

    (StatusCode::OK, Json(items))
}

/// POST /api/comments - Queued for moderation
pub async fn create_comment(
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = payload.validate()?;
    let pool = require_pool()?;

    let exists = db::post_is_published(&pool, comment.post_id, comment.post_type)
        .await
        .map_err(|e| ApiError::database("Failed to submit comment", e))?;
    if !exists {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let created = comments::create(&pool, &comment)
        .await
        .map_err(|e| ApiError::database("Failed to submit comment", e))?;

    tracing::info!(
        comment_id = %created.id,
        post_id = %created.post_id,
        post_type = %created.post_type,
        "comment queued for review"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateCommentResponse {
            success: true,
            message: "Your comment has been submitted and is awaiting review.".to_string(),
            comment: created.into(),
        }),
    ))
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /api/admin/comments?approved=
pub async fn admin_list_comments(
    _admin: AdminAuth,
    Query(query): Query<AdminCommentQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let pool = require_pool()?;
    let items = comments::list_for_admin(&pool, query.approved)
        .await
        .map_err(|e| ApiError::database("Failed to load comments", e))?;
    Ok(Json(items))
}

/// PATCH /api/admin/comments/{id}
pub async fn moderate_comment(
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateRequest>,
) -> Result<Json<Comment>, ApiError> {
    let pool = require_pool()?;

    let comment = comments::set_approved(&pool, id, payload.approved)
        .await
        .map_err(|e| ApiError::database("Failed to update comment", e))?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(comment_id = %id, approved = comment.approved, "comment moderated");
    Ok(Json(comment))
}

/// DELETE /api/admin/comments/{id}
pub async fn delete_comment(
    _admin: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let pool = require_pool()?;

    if !comments::delete(&pool, id)
        .await
        .map_err(|e| ApiError::database("Failed to delete comment", e))?
    {
        return Err(ApiError::not_found());
    }

    tracing::info!(comment_id = %id, "comment deleted");
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{post_json, send};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, patch};
    use axum::Router;
    use serde_json::json;

    fn comment_router() -> Router {
        Router::new()
            .route("/api/comments", get(list_comments).post(create_comment))
            .route("/api/admin/comments", get(admin_list_comments))
            .route(
                "/api/admin/comments/{id}",
                patch(moderate_comment).delete(delete_comment),
            )
    }

    fn valid_request() -> CreateCommentRequest {
        CreateCommentRequest {
            post_id: Some(Uuid::new_v4()),
            post_type: Some(PostType::Poem),
            author_name: " Ada ".to_string(),
            author_email: "ada@example.com".to_string(),
            content: "Beautiful imagery".to_string(),
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let comment = valid_request().validate().unwrap();
        assert_eq!(comment.author_name, "Ada");
        assert_eq!(comment.post_type, PostType::Poem);
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let err = CreateCommentRequest {
            author_email: "not-an-email".to_string(),
            ..valid_request()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[test]
    fn test_validate_requires_post_reference() {
        let err = CreateCommentRequest {
            post_type: None,
            ..valid_request()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_with_blank_content_is_rejected() {
        let req = post_json(
            "/api/comments",
            &json!({
                "postId": Uuid::new_v4(),
                "postType": "blog_post",
                "authorName": "Ada",
                "authorEmail": "ada@example.com",
                "content": "   "
            }),
        );
        let (status, _) = send(comment_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_post_type_is_rejected() {
        let uri = format!("/api/comments?postId={}&postType=video", Uuid::new_v4());
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let (status, _) = send(comment_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_list_without_database_is_empty() {
        let uri = format!("/api/comments?postId={}&postType=poem", Uuid::new_v4());
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let (status, bytes) = send(comment_router(), req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let body: Vec<PublicComment> = serde_json::from_slice(&bytes).unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_moderation_requires_token() {
        let req = Request::patch(format!("/api/admin/comments/{}", Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"approved":true}"#))
            .unwrap();
        let (status, _) = send(comment_router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
