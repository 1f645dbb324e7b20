use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::AdminUser;

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_users")
        .fetch_one(pool)
        .await
}

/// Advisory lock key serialising first-admin registration.
const REGISTRATION_LOCK_KEY: i64 = 0x0AD_4E61;

/// Creates the account only if no admin exists yet. Concurrent callers are
/// serialised on an advisory lock, so at most one of them gets `Some`.
pub async fn insert_first(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
) -> Result<Option<AdminUser>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(REGISTRATION_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let admin = sqlx::query_as::<_, AdminUser>(
        r#"
        INSERT INTO admin_users (username, password_hash)
        SELECT $1, $2
        WHERE NOT EXISTS (SELECT 1 FROM admin_users)
        RETURNING id, username, password_hash, is_active, created_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(admin)
}

pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(
        r#"
        SELECT id, username, password_hash, is_active, created_at
        FROM admin_users
        WHERE LOWER(username) = LOWER($1)
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn record_failed_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE admin_users \
         SET login_attempts = login_attempts + 1, updated_at = now() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_login(pool: &PgPool, id: Uuid, ip: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE admin_users \
         SET last_login_at = now(), last_login_ip = $1, login_attempts = 0, updated_at = now() \
         WHERE id = $2",
    )
    .bind(ip)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_refresh_token(
    pool: &PgPool,
    admin_user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO admin_refresh_tokens (admin_user_id, token_hash, expires_at)
           VALUES ($1, $2, $3)"#,
    )
    .bind(admin_user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Owner of a refresh token: (user id, username, expiry, revoked, owner active).
pub async fn find_refresh_token(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<(Uuid, String, DateTime<Utc>, bool, bool)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, String, DateTime<Utc>, bool, bool)>(
        r#"SELECT au.id, au.username, art.expires_at, art.revoked, au.is_active
           FROM admin_refresh_tokens art
           JOIN admin_users au ON au.id = art.admin_user_id
           WHERE art.token_hash = $1"#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn revoke_refresh_token(pool: &PgPool, token_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admin_refresh_tokens SET revoked = true WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn revoke_all_refresh_tokens(pool: &PgPool, admin_user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admin_refresh_tokens SET revoked = true WHERE admin_user_id = $1")
        .bind(admin_user_id)
        .execute(pool)
        .await?;
    Ok(())
}
