/**
 * Like Routes
 * Per-visitor like toggling. The visitor identity is derived here, never
 * taken from the request body.
 */
use axum::{
    extract::{ConnectInfo, Query},
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use sha2::{Digest, Sha256};
use std::net::{IpAddr, SocketAddr};

use crate::db::{
    self,
    likes::{self, LikeStatus},
};
use crate::error::ApiError;
use crate::routes::{auth::JWT_SECRET, comments::PostRef, require_pool};

lazy_static::lazy_static! {
    /// Salt mixed into every visitor key. Falls back to the JWT secret so a
    /// deployment never hashes with an empty salt.
    static ref VISITOR_SALT: String = std::env::var("VISITOR_SALT")
        .unwrap_or_else(|_| JWT_SECRET.clone());
}

/// Opaque per-visitor key: hex SHA-256 over salt, peer IP and User-Agent.
pub fn visitor_key(salt: &str, ip: IpAddr, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([0u8]);
    hasher.update(ip.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(user_agent.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn request_visitor_key(addr: SocketAddr, headers: &HeaderMap) -> String {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    visitor_key(&VISITOR_SALT, addr.ip(), user_agent)
}

/// GET /api/likes?postId=&postType=
pub async fn like_status(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(post): Query<PostRef>,
) -> Result<Json<LikeStatus>, ApiError> {
    let pool = require_pool()?;

    let exists = db::post_is_published(&pool, post.post_id, post.post_type)
        .await
        .map_err(|e| ApiError::database("Failed to load likes", e))?;
    if !exists {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let key = request_visitor_key(addr, &headers);
    likes::status(&pool, post.post_id, post.post_type, &key)
        .await
        .map(Json)
        .map_err(|e| ApiError::database("Failed to load likes", e))
}

/// POST /api/likes/toggle
pub async fn toggle_like(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(post): Json<PostRef>,
) -> Result<Json<LikeStatus>, ApiError> {
    let pool = require_pool()?;

    let exists = db::post_is_published(&pool, post.post_id, post.post_type)
        .await
        .map_err(|e| ApiError::database("Failed to update like", e))?;
    if !exists {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let key = request_visitor_key(addr, &headers);
    let status = likes::toggle(&pool, post.post_id, post.post_type, &key)
        .await
        .map_err(|e| ApiError::database("Failed to update like", e))?;

    tracing::debug!(
        post_id = %post.post_id,
        post_type = %post.post_type,
        has_liked = status.has_liked,
        "like toggled"
    );
    Ok(Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{post_json, send};
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use serde_json::json;
    use std::net::Ipv4Addr;

    fn like_router() -> Router {
        Router::new()
            .route("/api/likes", get(like_status))
            .route("/api/likes/toggle", post(toggle_like))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    #[test]
    fn test_visitor_key_is_stable_and_distinguishes_visitors() {
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
        let a = visitor_key("salt", ip, "Firefox");
        assert_eq!(a, visitor_key("salt", ip, "Firefox"));
        assert_eq!(a.len(), 64);

        assert_ne!(a, visitor_key("salt", ip, "Safari"));
        assert_ne!(a, visitor_key("other", ip, "Firefox"));
        assert_ne!(
            a,
            visitor_key("salt", IpAddr::V4(Ipv4Addr::new(203, 0, 113, 8)), "Firefox")
        );
    }

    #[test]
    fn test_request_visitor_key_tolerates_missing_user_agent() {
        let addr = SocketAddr::from(([10, 0, 0, 1], 80));
        let key = request_visitor_key(addr, &HeaderMap::new());
        assert_eq!(key, visitor_key(&VISITOR_SALT, addr.ip(), ""));
    }

    #[tokio::test]
    async fn test_toggle_without_database_is_unavailable() {
        let req = post_json(
            "/api/likes/toggle",
            &json!({ "postId": uuid::Uuid::new_v4(), "postType": "poem" }),
        );
        let (status, _) = send(like_router(), req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_status_requires_post_reference() {
        let req = Request::get("/api/likes?postType=poem")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(like_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
