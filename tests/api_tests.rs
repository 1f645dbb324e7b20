mod common;

#[cfg(test)]
pub mod api_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::common::*;

    use poetry_backend::create_app;
    use poetry_backend::db::poems;
    use poetry_backend::routes::auth::create_access_token;

    fn bearer() -> String {
        let token = create_access_token(&Uuid::nil().to_string(), "poet").expect("token");
        format!("Bearer {}", token)
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn admin_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", bearer())
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires DATABASE_URL"]
    async fn test_poem_with_empty_title_is_rejected_and_not_stored(pool: PgPool) {
        setup(&pool).await;

        let (status, body) = call(
            create_app(),
            admin_json(
                "POST",
                "/api/admin/poems",
                json!({ "title": "   ", "content": "A verse", "category": "Nature" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");
        assert_eq!(poems::count(&pool).await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_blog_post_without_excerpt_is_rejected() {
        let (status, body) = call(
            create_app(),
            admin_json(
                "POST",
                "/api/admin/blog",
                json!({ "title": "Notes", "content": "<p>Body</p>" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Excerpt is required");
    }

    #[tokio::test]
    async fn test_oversized_inline_image_is_rejected() {
        let image = format!("data:image/png;base64,{}", "A".repeat(2 * 1024 * 1024));
        let (status, _) = call(
            create_app(),
            admin_json(
                "POST",
                "/api/admin/poems",
                json!({ "title": "Pic", "content": "verse", "imageUrl": image }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_lists_degrade_to_empty_without_database() {
        for uri in ["/api/poems", "/api/blog?category=Craft"] {
            let (status, body) = call(
                create_app(),
                Request::get(uri).body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
            assert_eq!(body["items"], json!([]), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_subscription_rejects_malformed_email() {
        let req = Request::post("/api/subscriptions")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "email": "not-an-email" }).to_string()))
            .unwrap();
        let (status, body) = call(create_app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email format");
    }

    #[tokio::test]
    async fn test_verify_reports_token_state() {
        let req = Request::post("/api/auth/verify")
            .header("authorization", bearer())
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(create_app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], true);
        assert_eq!(body["user"]["username"], "poet");
    }
}
