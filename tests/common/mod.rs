#![allow(dead_code)]

use sqlx::PgPool;

use poetry_backend::db::{
    self,
    models::{BlogPost, NewBlogPost, NewPoem, Poem},
};

/// Creates the schema in the per-test database.
pub async fn setup(pool: &PgPool) {
    db::run_migrations(pool)
        .await
        .expect("Failed to create schema");
}

pub fn new_poem(title: &str, category: &str, published: bool) -> NewPoem {
    NewPoem {
        title: title.to_string(),
        content: format!("{} - first line\nsecond line", title),
        category: category.to_string(),
        image_url: None,
        published,
    }
}

pub async fn seed_poem(pool: &PgPool, title: &str, category: &str, published: bool) -> Poem {
    db::poems::create(pool, &new_poem(title, category, published))
        .await
        .expect("Failed to insert poem")
}

pub async fn seed_blog_post(pool: &PgPool, title: &str, published: bool) -> BlogPost {
    let post = NewBlogPost {
        title: title.to_string(),
        excerpt: format!("About {}", title),
        content: "<p>Some thoughts on writing.</p>".to_string(),
        category: "Craft".to_string(),
        read_time: "1 min read".to_string(),
        image_url: None,
        published,
    };
    db::blog::create(pool, &post)
        .await
        .expect("Failed to insert blog post")
}
