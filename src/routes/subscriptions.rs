/**
 * Subscription Routes
 * Newsletter sign-up, unsubscribe, and the admin subscriber list
 */
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{models::Subscription, subscriptions};
use crate::error::{is_unique_violation, ApiError};
use crate::routes::{auth::AdminAuth, require_pool, validation, SuccessResponse};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UnsubscribeRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    pub already_subscribed: bool,
}

/// Result of a sign-up attempt.
#[derive(Debug, Clone)]
pub enum SubscribeOutcome {
    Subscribed(Subscription),
    Reactivated(Subscription),
    AlreadySubscribed,
}

/// Lowercased, trimmed, well-formed email.
pub fn normalize_email(raw: &str) -> Result<String, ApiError> {
    validation::email(raw).map(|e| e.to_lowercase())
}

/// Inserts a subscription; a duplicate email either reactivates a lapsed
/// subscription or reports that the address is already on the list.
pub async fn subscribe(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
) -> Result<SubscribeOutcome, sqlx::Error> {
    match subscriptions::insert(pool, email, name).await {
        Ok(sub) => Ok(SubscribeOutcome::Subscribed(sub)),
        Err(e) if is_unique_violation(&e) => {
            match subscriptions::find_by_email(pool, email).await? {
                Some(existing) if existing.is_active => Ok(SubscribeOutcome::AlreadySubscribed),
                _ => Ok(subscriptions::reactivate(pool, email, name)
                    .await?
                    .map(SubscribeOutcome::Reactivated)
                    .unwrap_or(SubscribeOutcome::AlreadySubscribed)),
            }
        }
        Err(e) => Err(e),
    }
}

/// POST /api/subscriptions
pub async fn create_subscription(
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&payload.email)?;
    let name = validation::optional(payload.name.as_deref());
    let pool = require_pool()?;

    let outcome = subscribe(&pool, &email, name.as_deref())
        .await
        .map_err(|e| ApiError::database("Failed to subscribe", e))?;

    let (status, message, already_subscribed) = match outcome {
        SubscribeOutcome::Subscribed(sub) => {
            tracing::info!(subscription_id = %sub.id, "new subscriber");
            (StatusCode::CREATED, "Thank you for subscribing!", false)
        }
        SubscribeOutcome::Reactivated(sub) => {
            tracing::info!(subscription_id = %sub.id, "subscriber reactivated");
            (StatusCode::OK, "Welcome back! Your subscription is active again.", false)
        }
        SubscribeOutcome::AlreadySubscribed => {
            (StatusCode::OK, "You're already subscribed.", true)
        }
    };

    Ok((
        status,
        Json(SubscribeResponse {
            success: true,
            message: message.to_string(),
            already_subscribed,
        }),
    ))
}

/// POST /api/subscriptions/unsubscribe
pub async fn unsubscribe(
    Json(payload): Json<UnsubscribeRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let email = normalize_email(&payload.email)?;
    let pool = require_pool()?;

    let removed = subscriptions::deactivate(&pool, &email)
        .await
        .map_err(|e| ApiError::database("Failed to unsubscribe", e))?;
    if !removed {
        return Err(ApiError::NotFound("Subscription not found".to_string()));
    }

    tracing::info!("subscriber unsubscribed");
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/admin/subscriptions
pub async fn admin_list_subscriptions(
    _admin: AdminAuth,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    let pool = require_pool()?;
    subscriptions::list(&pool)
        .await
        .map(Json)
        .map_err(|e| ApiError::database("Failed to load subscriptions", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{post_json, send};
    use axum::routing::post;
    use axum::Router;
    use serde_json::json;

    fn subscription_router() -> Router {
        Router::new()
            .route("/api/subscriptions", post(create_subscription))
            .route("/api/subscriptions/unsubscribe", post(unsubscribe))
    }

    #[test]
    fn test_normalize_email_lowercases_and_trims() {
        assert_eq!(
            normalize_email("  Reader@Example.COM ").unwrap(),
            "reader@example.com"
        );
        assert!(normalize_email("reader").is_err());
        assert!(normalize_email("").is_err());
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let req = post_json("/api/subscriptions", &json!({ "email": "nope" }));
        let (status, bytes) = send(subscription_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: crate::error::ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Invalid email format");
    }

    #[tokio::test]
    async fn test_subscribe_without_database_is_unavailable() {
        let req = post_json(
            "/api/subscriptions",
            &json!({ "email": "reader@example.com", "name": "Reader" }),
        );
        let (status, _) = send(subscription_router(), req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unsubscribe_missing_email_is_rejected() {
        let req = post_json("/api/subscriptions/unsubscribe", &json!({}));
        let (status, _) = send(subscription_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
