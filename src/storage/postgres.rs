use crate::models::{
    BlogInteractionEvent, BlogPost, EventType, NewBlogEvent, NewPost, NewVisitor, VisitorEvent,
};
use crate::storage::rows::{
    decode_blog_events, decode_posts, unix_now, BlogEventRow, EncodedPostFields, PostRow,
    POST_COLUMNS,
};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitor_events (
                id BIGSERIAL PRIMARY KEY,
                created_at BIGINT NOT NULL,
                country TEXT,
                city TEXT,
                ip_address TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_visitor_events_created_at ON visitor_events(created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blog_events (
                id BIGSERIAL PRIMARY KEY,
                blog_slug TEXT NOT NULL,
                blog_title TEXT NOT NULL,
                event_type TEXT NOT NULL,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_blog_events_created_at ON blog_events(created_at, event_type)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id BIGSERIAL PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                intro TEXT NOT NULL,
                content TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                image_urls TEXT NOT NULL DEFAULT '[]',
                cta TEXT,
                author TEXT NOT NULL,
                published BOOLEAN NOT NULL DEFAULT FALSE,
                reading_time BIGINT NOT NULL DEFAULT 1,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_blog_posts_published ON blog_posts(published, created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn record_visitor(&self, visitor: &NewVisitor) -> Result<VisitorEvent> {
        let row = sqlx::query_as::<_, VisitorEvent>(
            r#"
            INSERT INTO visitor_events (created_at, country, city, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, country, city, ip_address
            "#,
        )
        .bind(visitor.created_at)
        .bind(visitor.country.as_deref())
        .bind(visitor.city.as_deref())
        .bind(&visitor.ip_address)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    async fn record_blog_event(&self, event: &NewBlogEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_events (blog_slug, blog_title, event_type, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&event.blog_slug)
        .bind(&event.blog_title)
        .bind(event.event_type.as_str())
        .bind(event.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn visitor_events_since(&self, since: i64) -> Result<Vec<VisitorEvent>> {
        let visitors = sqlx::query_as::<_, VisitorEvent>(
            r#"
            SELECT id, created_at, country, city, ip_address
            FROM visitor_events
            WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visitors)
    }

    async fn blog_events_since(
        &self,
        since: i64,
        event_type: Option<EventType>,
    ) -> Result<Vec<BlogInteractionEvent>> {
        let rows = sqlx::query_as::<_, BlogEventRow>(
            r#"
            SELECT blog_slug, blog_title, event_type, created_at
            FROM blog_events
            WHERE created_at >= $1 AND ($2::TEXT IS NULL OR event_type = $2)
            ORDER BY id
            "#,
        )
        .bind(since)
        .bind(event_type.map(|kind| kind.as_str()))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(decode_blog_events(rows))
    }

    async fn recent_visitors(&self, limit: i64) -> Result<Vec<VisitorEvent>> {
        let visitors = sqlx::query_as::<_, VisitorEvent>(
            r#"
            SELECT id, created_at, country, city, ip_address
            FROM visitor_events
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visitors)
    }

    async fn prune_events_before(&self, cutoff: i64) -> Result<u64> {
        let visitors = sqlx::query("DELETE FROM visitor_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;

        let events = sqlx::query("DELETE FROM blog_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;

        Ok(visitors.rows_affected() + events.rows_affected())
    }

    async fn create_post(&self, post: &NewPost) -> StorageResult<BlogPost> {
        let now = unix_now().map_err(StorageError::Other)?;
        let encoded = EncodedPostFields::encode(post).map_err(StorageError::Other)?;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO blog_posts
                (slug, title, intro, content, tags, image_urls, cta, author,
                 published, reading_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ON CONFLICT (slug) DO NOTHING
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.intro)
        .bind(&post.content)
        .bind(&encoded.tags)
        .bind(&encoded.image_urls)
        .bind(encoded.cta.as_deref())
        .bind(&post.author)
        .bind(post.published)
        .bind(post.reading_time)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        match row {
            Some(row) => Ok(BlogPost::try_from(row)?),
            None => Err(StorageError::Conflict),
        }
    }

    async fn get_post(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(BlogPost::try_from).transpose()
    }

    async fn update_post(&self, slug: &str, post: &NewPost) -> Result<Option<BlogPost>> {
        let now = unix_now()?;
        let encoded = EncodedPostFields::encode(post)?;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE blog_posts
            SET title = $1, intro = $2, content = $3, tags = $4, image_urls = $5, cta = $6,
                author = $7, published = $8, reading_time = $9, updated_at = $10
            WHERE slug = $11
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.title)
        .bind(&post.intro)
        .bind(&post.content)
        .bind(&encoded.tags)
        .bind(&encoded.image_urls)
        .bind(encoded.cta.as_deref())
        .bind(&post.author)
        .bind(post.published)
        .bind(post.reading_time)
        .bind(now)
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(BlogPost::try_from).transpose()
    }

    async fn delete_post(&self, slug: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE slug = $1")
            .bind(slug)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(
        &self,
        include_drafts: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogPost>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM blog_posts
            WHERE $1 OR published
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(include_drafts)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        decode_posts(rows)
    }

    async fn all_posts(&self) -> Result<Vec<BlogPost>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts ORDER BY id"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        decode_posts(rows)
    }
}
