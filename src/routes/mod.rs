/**
 * Routes Module
 * API route handlers
 */

pub mod auth;
pub mod bio;
pub mod blog;
pub mod comments;
pub mod contact;
pub mod dashboard;
pub mod health;
pub mod images;
pub mod likes;
pub mod poems;
pub mod rss;
pub mod subscriptions;
pub mod validation;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

use crate::db;
use crate::error::ApiError;

pub use crate::error::ErrorResponse;

/// Success response (for delete)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Optional `?category=` filter shared by the public list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

impl CategoryQuery {
    /// Trimmed category, or None when absent or blank.
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Pool handle for handlers that cannot work without the database.
pub fn require_pool() -> Result<Arc<PgPool>, ApiError> {
    db::get_pool().ok_or(ApiError::ServiceUnavailable)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{Body, Bytes};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    pub fn admin_token() -> String {
        super::auth::create_access_token(&uuid::Uuid::nil().to_string(), "poet").unwrap()
    }

    pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_query_ignores_blank() {
        let q = CategoryQuery {
            category: Some("   ".to_string()),
        };
        assert_eq!(q.category(), None);

        let q = CategoryQuery {
            category: Some(" Nature ".to_string()),
        };
        assert_eq!(q.category(), Some("Nature"));

        assert_eq!(CategoryQuery::default().category(), None);
    }

    #[test]
    fn test_require_pool_without_database() {
        assert!(matches!(require_pool(), Err(ApiError::ServiceUnavailable)));
    }
}
