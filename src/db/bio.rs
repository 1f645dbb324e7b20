use sqlx::PgPool;

use super::models::WriterBio;

pub async fn get(pool: &PgPool) -> Result<Option<WriterBio>, sqlx::Error> {
    sqlx::query_as::<_, WriterBio>(
        "SELECT id, name, title, bio, email, updated_at FROM writer_bio WHERE id = 1",
    )
    .fetch_optional(pool)
    .await
}

/// Writes the single bio row, creating it on first use.
pub async fn upsert(
    pool: &PgPool,
    name: &str,
    title: &str,
    bio: &str,
    email: &str,
) -> Result<WriterBio, sqlx::Error> {
    sqlx::query_as::<_, WriterBio>(
        r#"
        INSERT INTO writer_bio (id, name, title, bio, email, updated_at)
        VALUES (1, $1, $2, $3, $4, now())
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            title = EXCLUDED.title,
            bio = EXCLUDED.bio,
            email = EXCLUDED.email,
            updated_at = now()
        RETURNING id, name, title, bio, email, updated_at
        "#,
    )
    .bind(name)
    .bind(title)
    .bind(bio)
    .bind(email)
    .fetch_one(pool)
    .await
}
