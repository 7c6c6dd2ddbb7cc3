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
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn fetch_post(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(BlogPost::try_from).transpose()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitor_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
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
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                blog_slug TEXT NOT NULL,
                blog_title TEXT NOT NULL,
                event_type TEXT NOT NULL,
                created_at INTEGER NOT NULL
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
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                intro TEXT NOT NULL,
                content TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                image_urls TEXT NOT NULL DEFAULT '[]',
                cta TEXT,
                author TEXT NOT NULL,
                published BOOLEAN NOT NULL DEFAULT 0,
                reading_time INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
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
        let result = sqlx::query(
            r#"
            INSERT INTO visitor_events (created_at, country, city, ip_address)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(visitor.created_at)
        .bind(visitor.country.as_deref())
        .bind(visitor.city.as_deref())
        .bind(&visitor.ip_address)
        .execute(self.pool.as_ref())
        .await?;

        Ok(VisitorEvent {
            id: result.last_insert_rowid(),
            created_at: visitor.created_at,
            country: visitor.country.clone(),
            city: visitor.city.clone(),
            ip_address: visitor.ip_address.clone(),
        })
    }

    async fn record_blog_event(&self, event: &NewBlogEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_events (blog_slug, blog_title, event_type, created_at)
            VALUES (?, ?, ?, ?)
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
            WHERE created_at >= ?
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
        let rows = if let Some(kind) = event_type {
            sqlx::query_as::<_, BlogEventRow>(
                r#"
                SELECT blog_slug, blog_title, event_type, created_at
                FROM blog_events
                WHERE created_at >= ? AND event_type = ?
                ORDER BY id
                "#,
            )
            .bind(since)
            .bind(kind.as_str())
            .fetch_all(self.pool.as_ref())
            .await?
        } else {
            sqlx::query_as::<_, BlogEventRow>(
                r#"
                SELECT blog_slug, blog_title, event_type, created_at
                FROM blog_events
                WHERE created_at >= ?
                ORDER BY id
                "#,
            )
            .bind(since)
            .fetch_all(self.pool.as_ref())
            .await?
        };

        Ok(decode_blog_events(rows))
    }

    async fn recent_visitors(&self, limit: i64) -> Result<Vec<VisitorEvent>> {
        let visitors = sqlx::query_as::<_, VisitorEvent>(
            r#"
            SELECT id, created_at, country, city, ip_address
            FROM visitor_events
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visitors)
    }

    async fn prune_events_before(&self, cutoff: i64) -> Result<u64> {
        let visitors = sqlx::query("DELETE FROM visitor_events WHERE created_at < ?")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;

        let events = sqlx::query("DELETE FROM blog_events WHERE created_at < ?")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;

        Ok(visitors.rows_affected() + events.rows_affected())
    }

    async fn create_post(&self, post: &NewPost) -> StorageResult<BlogPost> {
        let now = unix_now().map_err(StorageError::Other)?;
        let encoded = EncodedPostFields::encode(post).map_err(StorageError::Other)?;

        let result = sqlx::query(
            r#"
            INSERT INTO blog_posts
                (slug, title, intro, content, tags, image_urls, cta, author,
                 published, reading_time, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(slug) DO NOTHING
            "#,
        )
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
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        self.fetch_post(&post.slug)
            .await?
            .ok_or_else(|| StorageError::Other(anyhow::anyhow!("post vanished after insert")))
    }

    async fn get_post(&self, slug: &str) -> Result<Option<BlogPost>> {
        self.fetch_post(slug).await
    }

    async fn update_post(&self, slug: &str, post: &NewPost) -> Result<Option<BlogPost>> {
        let now = unix_now()?;
        let encoded = EncodedPostFields::encode(post)?;

        let result = sqlx::query(
            r#"
            UPDATE blog_posts
            SET title = ?, intro = ?, content = ?, tags = ?, image_urls = ?, cta = ?,
                author = ?, published = ?, reading_time = ?, updated_at = ?
            WHERE slug = ?
            "#,
        )
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
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.fetch_post(slug).await
    }

    async fn delete_post(&self, slug: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE slug = ?")
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
        let rows = if include_drafts {
            sqlx::query_as::<_, PostRow>(&format!(
                "SELECT {POST_COLUMNS} FROM blog_posts \
                 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?
        } else {
            sqlx::query_as::<_, PostRow>(&format!(
                "SELECT {POST_COLUMNS} FROM blog_posts WHERE published = 1 \
                 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?
        };

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
