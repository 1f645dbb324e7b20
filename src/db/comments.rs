use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Comment, NewComment, PostType};

const COMMENT_COLUMNS: &str =
    "id, post_id, post_type, author_name, author_email, content, approved, created_at";

/// Approved comments on one published post, oldest first. Empty while the
/// post is a draft or missing.
pub async fn list_approved(
    pool: &PgPool,
    post_id: Uuid,
    post_type: PostType,
) -> Result<Vec<Comment>, sqlx::Error> {
    let posts = post_type.table();
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE post_id = $1 AND post_type = $2 AND approved = true
          AND EXISTS (SELECT 1 FROM {posts} p WHERE p.id = $1 AND p.published = true)
        ORDER BY created_at ASC
        "#
    ))
    .bind(post_id)
    .bind(post_type.as_str())
    .fetch_all(pool)
    .await
}

/// All comments for the admin view, newest first, optionally filtered by approval.
pub async fn list_for_admin(
    pool: &PgPool,
    approved: Option<bool>,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE ($1::BOOLEAN IS NULL OR approved = $1)
        ORDER BY created_at DESC
        "#
    ))
    .bind(approved)
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, comment: &NewComment) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        INSERT INTO comments (post_id, post_type, author_name, author_email, content)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(comment.post_id)
    .bind(comment.post_type.as_str())
    .bind(&comment.author_name)
    .bind(&comment.author_email)
    .bind(&comment.content)
    .fetch_one(pool)
    .await
}

pub async fn set_approved(
    pool: &PgPool,
    id: Uuid,
    approved: bool,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "UPDATE comments SET approved = $1 WHERE id = $2 RETURNING {COMMENT_COLUMNS}"
    ))
    .bind(approved)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Size of the moderation queue.
pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE approved = false")
        .fetch_one(pool)
        .await
}
