use sqlx::PgPool;

use super::models::Subscription;

const SUBSCRIPTION_COLUMNS: &str = "id, email, name, subscribed_at, is_active";

/// Plain insert; a repeated email surfaces as a unique violation.
pub async fn insert(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        INSERT INTO subscriptions (email, name)
        VALUES ($1, $2)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Re-activates a lapsed subscription. Returns None when the email is unknown.
pub async fn reactivate(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        UPDATE subscriptions
        SET is_active = true, name = COALESCE($2, name), subscribed_at = now()
        WHERE email = $1
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(name)
    .fetch_optional(pool)
    .await
}

/// Marks the subscription inactive. Returns false when no active row matched.
pub async fn deactivate(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE subscriptions SET is_active = false WHERE email = $1 AND is_active")
            .bind(email)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list(pool: &PgPool) -> Result<Vec<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY subscribed_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE is_active")
        .fetch_one(pool)
        .await
}
