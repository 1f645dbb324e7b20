use sqlx::PgPool;
use uuid::Uuid;

use super::models::{NewPoem, Poem};

const POEM_COLUMNS: &str =
    "id, title, content, category, image_url, published, created_at, updated_at";

/// Published poems, newest first. `category` matches case-insensitively.
pub async fn list_published(
    pool: &PgPool,
    category: Option<&str>,
) -> Result<Vec<Poem>, sqlx::Error> {
    sqlx::query_as::<_, Poem>(&format!(
        r#"
        SELECT {POEM_COLUMNS}
        FROM poems
        WHERE published = true
          AND ($1::TEXT IS NULL OR LOWER(category) = LOWER($1))
        ORDER BY created_at DESC
        "#
    ))
    .bind(category)
    .fetch_all(pool)
    .await
}

/// Every poem, drafts included, newest first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Poem>, sqlx::Error> {
    sqlx::query_as::<_, Poem>(&format!(
        "SELECT {POEM_COLUMNS} FROM poems ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Poem>, sqlx::Error> {
    sqlx::query_as::<_, Poem>(&format!("SELECT {POEM_COLUMNS} FROM poems WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_published(pool: &PgPool, id: Uuid) -> Result<Option<Poem>, sqlx::Error> {
    sqlx::query_as::<_, Poem>(&format!(
        "SELECT {POEM_COLUMNS} FROM poems WHERE id = $1 AND published = true"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Distinct categories among published poems, alphabetical.
pub async fn published_categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM poems WHERE published = true ORDER BY category",
    )
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, poem: &NewPoem) -> Result<Poem, sqlx::Error> {
    sqlx::query_as::<_, Poem>(&format!(
        r#"
        INSERT INTO poems (title, content, category, image_url, published)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {POEM_COLUMNS}
        "#
    ))
    .bind(&poem.title)
    .bind(&poem.content)
    .bind(&poem.category)
    .bind(&poem.image_url)
    .bind(poem.published)
    .fetch_one(pool)
    .await
}

/// Overwrites every editable field. Returns None when the poem does not exist.
pub async fn update(pool: &PgPool, id: Uuid, poem: &NewPoem) -> Result<Option<Poem>, sqlx::Error> {
    sqlx::query_as::<_, Poem>(&format!(
        r#"
        UPDATE poems
        SET title = $1, content = $2, category = $3, image_url = $4, published = $5,
            updated_at = now()
        WHERE id = $6
        RETURNING {POEM_COLUMNS}
        "#
    ))
    .bind(&poem.title)
    .bind(&poem.content)
    .bind(&poem.category)
    .bind(&poem.image_url)
    .bind(poem.published)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Deletes the poem along with its comments and likes. Returns false when nothing matched.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM poems WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("DELETE FROM comments WHERE post_id = $1 AND post_type = 'poem'")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM likes WHERE post_id = $1 AND post_type = 'poem'")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn count(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE published) FROM poems",
    )
    .fetch_one(pool)
    .await
}
