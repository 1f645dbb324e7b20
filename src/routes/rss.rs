use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::db::{
    self, blog,
    models::{BlogPost, Poem},
    poems,
};

/// Items published in the feed
const FEED_LIMIT: usize = 50;

/// Characters of a poem's text used as its feed description
const POEM_PREVIEW_CHARS: usize = 280;

/// One entry of the feed, from either a poem or a blog post.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub category: String,
    pub published_at: DateTime<Utc>,
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(POEM_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

/// Newest-first merge of both content kinds, capped at [`FEED_LIMIT`].
pub fn collect_items(
    site: &SiteConfig,
    poems: Vec<Poem>,
    posts: Vec<BlogPost>,
) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = poems
        .into_iter()
        .map(|p| FeedItem {
            link: format!("{}/poetry/{}", site.url, p.id),
            description: preview(&p.content),
            title: p.title,
            category: p.category,
            published_at: p.created_at,
        })
        .chain(posts.into_iter().map(|b| FeedItem {
            link: format!("{}/blog/{}", site.url, b.id),
            description: b.excerpt,
            title: b.title,
            category: b.category,
            published_at: b.created_at,
        }))
        .collect();

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items.truncate(FEED_LIMIT);
    items
}

pub fn render_feed(site: &SiteConfig, items: &[FeedItem]) -> String {
    let mut entries = String::new();
    for item in items {
        entries.push_str(&format!(
            "    <item>\n\
                   <title>{}</title>\n\
                   <link>{}</link>\n\
                   <description>{}</description>\n\
                   <category>{}</category>\n\
                   <pubDate>{}</pubDate>\n\
                   <guid isPermaLink=\"true\">{}</guid>\n\
                 </item>\n",
            escape_xml(&item.title),
            escape_xml(&item.link),
            escape_xml(&item.description),
            escape_xml(&item.category),
            rfc822(&item.published_at),
            escape_xml(&item.link),
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>en-us</language>
    <atom:link href="{}/rss.xml" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        escape_xml(&site.title),
        escape_xml(&site.url),
        escape_xml(&site.description),
        escape_xml(&site.url),
        items
            .first()
            .map(|i| rfc822(&i.published_at))
            .unwrap_or_default(),
        entries,
    )
}

/// GET /rss.xml
pub async fn rss_feed() -> Response {
    let Some(pool) = db::get_pool() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response();
    };

    let (poems, posts) = tokio::join!(
        poems::list_published(&pool, None),
        blog::list_published(&pool, None)
    );
    let poems = poems.unwrap_or_else(|e| {
        tracing::error!("Error fetching poems for feed: {}", e);
        Vec::new()
    });
    let posts = posts.unwrap_or_else(|e| {
        tracing::error!("Error fetching blog posts for feed: {}", e);
        Vec::new()
    });

    let site = SiteConfig::from_env();
    let xml = render_feed(&site, &collect_items(&site, poems, posts));

    (
        [
            (header::CONTENT_TYPE, "application/rss+xml; charset=utf-8"),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, stale-while-revalidate=600",
            ),
        ],
        xml,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn site() -> SiteConfig {
        SiteConfig {
            url: "https://poems.example.com".to_string(),
            title: "Verses & Voices".to_string(),
            description: "New work".to_string(),
        }
    }

    fn poem(title: &str, at: DateTime<Utc>) -> Poem {
        Poem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: "Line one\nLine two".to_string(),
            category: "Nature".to_string(),
            image_url: None,
            published: true,
            created_at: at,
            updated_at: at,
        }
    }

    fn post(title: &str, at: DateTime<Utc>) -> BlogPost {
        BlogPost {
            id: Uuid::new_v4(),
            title: title.to_string(),
            excerpt: "An excerpt".to_string(),
            content: "<p>Body</p>".to_string(),
            category: "Craft".to_string(),
            read_time: "1 min read".to_string(),
            image_url: None,
            published: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<title>"), "&lt;title&gt;");
        assert_eq!(escape_xml("\"quote\""), "&quot;quote&quot;");
    }

    #[test]
    fn test_rfc822_format() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(rfc822(&dt), "Mon, 15 Jan 2024 12:00:00 +0000");
    }

    #[test]
    fn test_collect_items_merges_newest_first() {
        let now = Utc::now();
        let items = collect_items(
            &site(),
            vec![poem("Old Poem", now - Duration::days(2))],
            vec![post("New Post", now)],
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "New Post");
        assert!(items[0].link.starts_with("https://poems.example.com/blog/"));
        assert!(items[1].link.starts_with("https://poems.example.com/poetry/"));
    }

    #[test]
    fn test_collect_items_caps_feed_length() {
        let now = Utc::now();
        let poems = (0..40)
            .map(|i| poem("p", now - Duration::minutes(i)))
            .collect();
        let posts = (0..40)
            .map(|i| post("b", now - Duration::minutes(i)))
            .collect();
        assert_eq!(collect_items(&site(), poems, posts).len(), FEED_LIMIT);
    }

    #[test]
    fn test_long_poem_preview_is_truncated() {
        let long = "x".repeat(POEM_PREVIEW_CHARS + 10);
        let p = preview(&long);
        assert!(p.ends_with('…'));
        assert_eq!(p.chars().count(), POEM_PREVIEW_CHARS + 1);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_render_feed_escapes_channel_and_items() {
        let items = collect_items(&site(), vec![poem("Salt & Sea", Utc::now())], Vec::new());
        let xml = render_feed(&site(), &items);
        assert!(xml.contains("<title>Verses &amp; Voices</title>"));
        assert!(xml.contains("<title>Salt &amp; Sea</title>"));
        assert!(xml.contains("<category>Nature</category>"));
        assert!(xml.contains("https://poems.example.com/rss.xml"));
    }
}
