//! Poetry Backend - library for app logic and testing

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::StartupError;
use crate::routes::{
    auth, bio, blog, comments, contact, dashboard, health, images, likes, poems, rss,
    subscriptions,
};

/// JSON bodies carry at most one inline image data URI plus text fields.
const JSON_BODY_LIMIT: usize = 3 * 1024 * 1024;

/// Multipart image uploads
const UPLOAD_BODY_LIMIT: usize = images::MAX_FILE_SIZE + 1024 * 1024;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

fn public_routes() -> Router {
    Router::new()
        .route("/api/poems", get(poems::list_poems))
        .route("/api/poems/categories", get(poems::list_categories))
        .route("/api/poems/{id}", get(poems::get_poem))
        .route("/api/blog", get(blog::list_posts))
        .route("/api/blog/categories", get(blog::list_categories))
        .route("/api/blog/{id}", get(blog::get_post))
        .route(
            "/api/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/likes", get(likes::like_status))
        .route("/api/likes/toggle", post(likes::toggle_like))
        .route(
            "/api/subscriptions",
            post(subscriptions::create_subscription),
        )
        .route(
            "/api/subscriptions/unsubscribe",
            post(subscriptions::unsubscribe),
        )
        .route("/api/contact", post(contact::send_message))
        .route("/api/bio", get(bio::get_bio))
        .route("/rss.xml", get(rss::rss_feed))
}

fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", post(auth::verify_token))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
}

/// Every handler here takes the `AdminAuth` extractor.
fn admin_routes() -> Router {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard::get_dashboard))
        .route(
            "/api/admin/poems",
            get(poems::admin_list_poems).post(poems::create_poem),
        )
        .route(
            "/api/admin/poems/{id}",
            patch(poems::update_poem).delete(poems::delete_poem),
        )
        .route(
            "/api/admin/blog",
            get(blog::admin_list_posts).post(blog::create_post),
        )
        .route(
            "/api/admin/blog/{id}",
            patch(blog::update_post).delete(blog::delete_post),
        )
        .route("/api/admin/comments", get(comments::admin_list_comments))
        .route(
            "/api/admin/comments/{id}",
            patch(comments::moderate_comment).delete(comments::delete_comment),
        )
        .route(
            "/api/admin/subscriptions",
            get(subscriptions::admin_list_subscriptions),
        )
        .route("/api/admin/messages", get(contact::admin_list_messages))
        .route("/api/admin/bio", put(bio::update_bio))
        .route(
            "/api/admin/images",
            get(images::list_images)
                .post(images::upload_image)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/admin/images/{filename}",
            axum::routing::delete(images::delete_image),
        )
}

fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health::health_ping))
        .route("/health/detailed", get(health::health_detailed))
        .route("/health/database", get(health::health_database))
        .route("/health/ready", get(health::health_ready))
}

/// Create and configure the application router.
pub fn create_app() -> Router {
    let cors = configure_cors();
    tracing::info!("CORS configured");

    Router::new()
        .merge(public_routes())
        .merge(auth_routes())
        .merge(admin_routes())
        .merge(health_routes())
        .nest_service("/uploads", ServeDir::new(images::UPLOAD_ROOT))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Hard cap on any request body, uploads included
        .layer(RequestBodyLimitLayer::new(UPLOAD_BODY_LIMIT))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Held until the server stops; dropping them loses buffered log lines.
    let _log_guards = logging::init();

    health::init_start_time();

    let server = ServerConfig::from_env();

    if server.is_production() {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.is_empty() || secret == auth::DEFAULT_JWT_SECRET {
            tracing::error!("Refusing to start in production with the default JWT secret");
            return Err(StartupError::InsecureJwtSecret);
        }
        if std::env::var("VISITOR_SALT").is_err() {
            tracing::warn!("VISITOR_SALT is not set; like identities are salted with JWT_SECRET");
        }
    }

    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(None).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize database pool: {}. Continuing without database.",
                    e
                );
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Running without database connection.");
        if auth::ADMIN_PASSWORD_HASH.is_none() {
            tracing::warn!(
                "Neither DATABASE_URL nor ADMIN_HASH_PASSWORD is set; admin login is disabled"
            );
        }
    }

    let app = create_app();

    let addr = server.socket_addr()?;
    tracing::info!(environment = %server.environment, "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::send;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    #[test]
    fn test_create_app_has_no_conflicting_routes() {
        let _app = create_app();
    }

    #[tokio::test]
    async fn test_health_through_full_stack_carries_request_id() {
        let res = tower::ServiceExt::oneshot(
            create_app(),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_admin_routes_reject_anonymous_requests() {
        for uri in [
            "/api/admin/dashboard",
            "/api/admin/poems",
            "/api/admin/blog",
            "/api/admin/comments",
            "/api/admin/subscriptions",
            "/api/admin/messages",
            "/api/admin/images",
        ] {
            let req = Request::get(uri).body(Body::empty()).unwrap();
            let (status, _) = send(create_app(), req).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let req = Request::get("/api/does-not-exist").body(Body::empty()).unwrap();
        let (status, _) = send(create_app(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
