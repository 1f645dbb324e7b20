use sqlx::PgPool;
use uuid::Uuid;

use super::models::{BlogPost, NewBlogPost};

const BLOG_COLUMNS: &str = "id, title, excerpt, content, category, read_time, image_url, \
                            published, created_at, updated_at";

/// Published posts, newest first. `category` matches case-insensitively.
pub async fn list_published(
    pool: &PgPool,
    category: Option<&str>,
) -> Result<Vec<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        r#"
        SELECT {BLOG_COLUMNS}
        FROM blog_posts
        WHERE published = true
          AND ($1::TEXT IS NULL OR LOWER(category) = LOWER($1))
        ORDER BY created_at DESC
        "#
    ))
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        "SELECT {BLOG_COLUMNS} FROM blog_posts ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        "SELECT {BLOG_COLUMNS} FROM blog_posts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_published(pool: &PgPool, id: Uuid) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        "SELECT {BLOG_COLUMNS} FROM blog_posts WHERE id = $1 AND published = true"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn published_categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM blog_posts WHERE published = true ORDER BY category",
    )
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, post: &NewBlogPost) -> Result<BlogPost, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        r#"
        INSERT INTO blog_posts (title, excerpt, content, category, read_time, image_url, published)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.category)
    .bind(&post.read_time)
    .bind(&post.image_url)
    .bind(post.published)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    post: &NewBlogPost,
) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!(
        r#"
        UPDATE blog_posts
        SET title = $1, excerpt = $2, content = $3, category = $4, read_time = $5,
            image_url = $6, published = $7, updated_at = now()
        WHERE id = $8
        RETURNING {BLOG_COLUMNS}
        "#
    ))
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.category)
    .bind(&post.read_time)
    .bind(&post.image_url)
    .bind(post.published)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Deletes the post along with its comments and likes.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM comments WHERE post_id = $1 AND post_type = 'blog_post'")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM likes WHERE post_id = $1 AND post_type = 'blog_post'")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn count(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE published) FROM blog_posts",
    )
    .fetch_one(pool)
    .await
}
