//! Raw row shapes shared by the SQL backends

use anyhow::{Context, Result};
use sqlx::FromRow;
use tracing::warn;

use crate::models::{BlogInteractionEvent, BlogPost, CallToAction, EventType, NewPost};

pub(crate) const POST_COLUMNS: &str = "id, slug, title, intro, content, tags, image_urls, cta, \
     author, published, reading_time, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct BlogEventRow {
    pub blog_slug: String,
    pub blog_title: String,
    pub event_type: String,
    pub created_at: i64,
}

/// Decode event rows, dropping any whose event type is not recognised.
pub(crate) fn decode_blog_events(rows: Vec<BlogEventRow>) -> Vec<BlogInteractionEvent> {
    rows.into_iter()
        .filter_map(|row| match row.event_type.parse::<EventType>() {
            Ok(event_type) => Some(BlogInteractionEvent {
                blog_slug: row.blog_slug,
                blog_title: row.blog_title,
                event_type,
                created_at: row.created_at,
            }),
            Err(e) => {
                warn!(slug = %row.blog_slug, "skipping blog event: {}", e);
                None
            }
        })
        .collect()
}

/// Blog post as stored: list and object fields are JSON text columns.
#[derive(Debug, FromRow)]
pub(crate) struct PostRow {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub intro: String,
    pub content: String,
    pub tags: String,
    pub image_urls: String,
    pub cta: Option<String>,
    pub author: String,
    pub published: bool,
    pub reading_time: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<PostRow> for BlogPost {
    type Error = anyhow::Error;

    fn try_from(row: PostRow) -> Result<Self> {
        let tags: Vec<String> = serde_json::from_str(&row.tags)
            .with_context(|| format!("corrupt tags column for post '{}'", row.slug))?;
        let image_urls: Vec<String> = serde_json::from_str(&row.image_urls)
            .with_context(|| format!("corrupt image_urls column for post '{}'", row.slug))?;
        let cta = row
            .cta
            .as_deref()
            .map(serde_json::from_str::<CallToAction>)
            .transpose()
            .with_context(|| format!("corrupt cta column for post '{}'", row.slug))?;

        Ok(BlogPost {
            id: row.id,
            slug: row.slug,
            title: row.title,
            intro: row.intro,
            content: row.content,
            tags,
            image_urls,
            cta,
            author: row.author,
            published: row.published,
            reading_time: row.reading_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn decode_posts(rows: Vec<PostRow>) -> Result<Vec<BlogPost>> {
    rows.into_iter().map(BlogPost::try_from).collect()
}

/// JSON-encoded list and object columns for a post about to be written
pub(crate) struct EncodedPostFields {
    pub tags: String,
    pub image_urls: String,
    pub cta: Option<String>,
}

impl EncodedPostFields {
    pub fn encode(post: &NewPost) -> Result<Self> {
        Ok(Self {
            tags: serde_json::to_string(&post.tags)?,
            image_urls: serde_json::to_string(&post.image_urls)?,
            cta: post.cta.as_ref().map(serde_json::to_string).transpose()?,
        })
    }
}

pub(crate) fn unix_now() -> Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64)
}
