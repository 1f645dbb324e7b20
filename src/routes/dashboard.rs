/**
 * Admin Dashboard Route
 * Everything the dashboard shows on first load, fetched concurrently
 */
use axum::Json;
use serde::Serialize;

use crate::db::{
    bio, blog, comments, contact, likes,
    models::{BlogPost, Comment, ContactMessage, Poem, Subscription, WriterBio},
    poems, subscriptions,
};
use crate::error::ApiError;
use crate::routes::{auth::AdminAuth, require_pool};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_poems: i64,
    pub published_poems: i64,
    pub total_blog_posts: i64,
    pub published_blog_posts: i64,
    pub pending_comments: i64,
    pub messages: usize,
    pub active_subscribers: i64,
    pub total_likes: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub poems: Vec<Poem>,
    pub blog_posts: Vec<BlogPost>,
    pub comments: Vec<Comment>,
    pub messages: Vec<ContactMessage>,
    pub subscriptions: Vec<Subscription>,
    pub bio: Option<WriterBio>,
    pub stats: DashboardStats,
}

/// Database-side counters shown next to the lists.
#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    /// (total, published)
    poems: (i64, i64),
    blog_posts: (i64, i64),
    pending_comments: i64,
    active_subscribers: i64,
    total_likes: i64,
}

impl DashboardStats {
    fn new(messages: &[ContactMessage], counters: Counters) -> Self {
        Self {
            total_poems: counters.poems.0,
            published_poems: counters.poems.1,
            total_blog_posts: counters.blog_posts.0,
            published_blog_posts: counters.blog_posts.1,
            pending_comments: counters.pending_comments,
            messages: messages.len(),
            active_subscribers: counters.active_subscribers,
            total_likes: counters.total_likes,
        }
    }
}

/// GET /api/admin/dashboard
pub async fn get_dashboard(_admin: AdminAuth) -> Result<Json<DashboardResponse>, ApiError> {
    let pool = require_pool()?;

    let (
        poems,
        blog_posts,
        comments,
        messages,
        subscriptions,
        bio,
        poem_counts,
        post_counts,
        pending,
        active,
        likes,
    ) = tokio::join!(
        poems::list_all(&pool),
        blog::list_all(&pool),
        comments::list_for_admin(&pool, None),
        contact::list(&pool),
        subscriptions::list(&pool),
        bio::get(&pool),
        poems::count(&pool),
        blog::count(&pool),
        comments::count_pending(&pool),
        subscriptions::count_active(&pool),
        likes::count_all(&pool),
    );

    let poems = poems.map_err(|e| ApiError::database("Failed to load poems", e))?;
    let blog_posts = blog_posts.map_err(|e| ApiError::database("Failed to load blog posts", e))?;
    let comments = comments.map_err(|e| ApiError::database("Failed to load comments", e))?;
    let messages = messages.map_err(|e| ApiError::database("Failed to load messages", e))?;
    let subscriptions =
        subscriptions.map_err(|e| ApiError::database("Failed to load subscriptions", e))?;
    let bio = bio.map_err(|e| ApiError::database("Failed to load bio", e))?;
    let counters = Counters {
        poems: poem_counts.map_err(|e| ApiError::database("Failed to count poems", e))?,
        blog_posts: post_counts
            .map_err(|e| ApiError::database("Failed to count blog posts", e))?,
        pending_comments: pending.map_err(|e| ApiError::database("Failed to count comments", e))?,
        active_subscribers: active
            .map_err(|e| ApiError::database("Failed to count subscribers", e))?,
        total_likes: likes.map_err(|e| ApiError::database("Failed to count likes", e))?,
    };

    let stats = DashboardStats::new(&messages, counters);

    Ok(Json(DashboardResponse {
        poems,
        blog_posts,
        comments,
        messages,
        subscriptions,
        bio,
        stats,
    }))
}
