//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of content a comment or like is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Poem,
    BlogPost,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poem => "poem",
            Self::BlogPost => "blog_post",
        }
    }

    /// Table holding the posts of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Poem => "poems",
            Self::BlogPost => "blog_posts",
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "poem" => Ok(Self::Poem),
            "blog_post" => Ok(Self::BlogPost),
            _ => Err(format!("invalid post type: {}", s)),
        }
    }
}

/// Poem model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new poem
#[derive(Debug, Clone)]
pub struct NewPoem {
    pub title: String,
    pub content: String,
    pub category: String,
    pub image_url: Option<String>,
    pub published: bool,
}

/// Blog post model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub read_time: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new blog post
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub read_time: String,
    pub image_url: Option<String>,
    pub published: bool,
}

/// Writer bio (single row)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterBio {
    pub id: i32,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

/// Contact form message
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Visitor comment. `approved` starts false; unapproved rows form the moderation queue.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub post_type: String,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Comment as shown on public pages (no email)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicComment {
    pub id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for PublicComment {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            author_name: c.author_name,
            content: c.content,
            created_at: c.created_at,
        }
    }
}

/// Validated fields for a new comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub post_type: PostType,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
}

/// Newsletter subscription
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Admin account
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_type_wire_format() {
        assert_eq!(serde_json::to_string(&PostType::BlogPost).unwrap(), "\"blog_post\"");
        let parsed: PostType = serde_json::from_str("\"poem\"").unwrap();
        assert_eq!(parsed, PostType::Poem);
        assert_eq!("blog_post".parse::<PostType>().unwrap(), PostType::BlogPost);
        assert!("Poem".parse::<PostType>().is_err());
    }

    #[test]
    fn test_public_comment_drops_email() {
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            post_type: "poem".to_string(),
            author_name: "Ada".to_string(),
            author_email: "ada@example.com".to_string(),
            content: "Lovely".to_string(),
            approved: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&PublicComment::from(comment)).unwrap();
        assert!(json.contains("authorName"));
        assert!(!json.contains("ada@example.com"));
    }
}
