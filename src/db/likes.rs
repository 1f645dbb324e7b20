use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::PostType;

/// Like count for a post plus whether the asking visitor is among the likers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub likes_count: i64,
    pub has_liked: bool,
}

pub async fn status(
    pool: &PgPool,
    post_id: Uuid,
    post_type: PostType,
    visitor_key: &str,
) -> Result<LikeStatus, sqlx::Error> {
    sqlx::query_as::<_, LikeStatus>(
        r#"
        SELECT COUNT(*) AS likes_count,
               COALESCE(BOOL_OR(visitor_key = $3), false) AS has_liked
        FROM likes
        WHERE post_id = $1 AND post_type = $2
        "#,
    )
    .bind(post_id)
    .bind(post_type.as_str())
    .bind(visitor_key)
    .fetch_one(pool)
    .await
}

/// Removes the visitor's like if present, otherwise adds one, in a single
/// statement. A concurrent duplicate insert is absorbed by the unique key.
pub async fn toggle(
    pool: &PgPool,
    post_id: Uuid,
    post_type: PostType,
    visitor_key: &str,
) -> Result<LikeStatus, sqlx::Error> {
    sqlx::query(
        r#"
        WITH removed AS (
            DELETE FROM likes
            WHERE post_id = $1 AND post_type = $2 AND visitor_key = $3
            RETURNING id
        )
        INSERT INTO likes (post_id, post_type, visitor_key)
        SELECT $1::UUID, $2::TEXT, $3::TEXT
        WHERE NOT EXISTS (SELECT 1 FROM removed)
        ON CONFLICT (post_id, post_type, visitor_key) DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(post_type.as_str())
    .bind(visitor_key)
    .execute(pool)
    .await?;

    status(pool, post_id, post_type, visitor_key).await
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes")
        .fetch_one(pool)
        .await
}
