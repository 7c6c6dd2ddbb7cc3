use crate::models::{
    BlogInteractionEvent, BlogPost, EventType, NewBlogEvent, NewPost, NewVisitor, VisitorEvent,
};
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Storage wrapper that caches post lookups by slug.
///
/// Every write that touches a slug invalidates its entry; analytics reads and
/// writes pass straight through.
pub struct CachedStorage {
    /// Underlying storage implementation
    inner: Arc<dyn Storage>,
    /// Read cache for post lookups (Moka cache), misses are cached too
    read_cache: Cache<String, Option<BlogPost>>,
    /// Bumped after every post write; a lookup that overlapped a write drops
    /// what it cached
    writes: AtomicU64,
}

impl CachedStorage {
    pub fn new(inner: Arc<dyn Storage>, max_cache_entries: u64, ttl_secs: u64) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            inner,
            read_cache,
            writes: AtomicU64::new(0),
        }
    }

    async fn invalidate_cache(&self, slug: &str) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.read_cache.invalidate(slug).await;
    }
}

#[async_trait]
impl Storage for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn record_visitor(&self, visitor: &NewVisitor) -> Result<VisitorEvent> {
        self.inner.record_visitor(visitor).await
    }

    async fn record_blog_event(&self, event: &NewBlogEvent) -> Result<()> {
        self.inner.record_blog_event(event).await
    }

    async fn visitor_events_since(&self, since: i64) -> Result<Vec<VisitorEvent>> {
        self.inner.visitor_events_since(since).await
    }

    async fn blog_events_since(
        &self,
        since: i64,
        event_type: Option<EventType>,
    ) -> Result<Vec<BlogInteractionEvent>> {
        self.inner.blog_events_since(since, event_type).await
    }

    async fn recent_visitors(&self, limit: i64) -> Result<Vec<VisitorEvent>> {
        self.inner.recent_visitors(limit).await
    }

    async fn prune_events_before(&self, cutoff: i64) -> Result<u64> {
        self.inner.prune_events_before(cutoff).await
    }

    async fn create_post(&self, post: &NewPost) -> StorageResult<BlogPost> {
        let created = self.inner.create_post(post).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        // Replaces a cached miss for this slug
        self.read_cache
            .insert(created.slug.clone(), Some(created.clone()))
            .await;

        Ok(created)
    }

    async fn get_post(&self, slug: &str) -> Result<Option<BlogPost>> {
        if let Some(cached) = self.read_cache.get(slug).await {
            return Ok(cached);
        }

        let seen = self.writes.load(Ordering::SeqCst);
        let result = self.inner.get_post(slug).await?;

        self.read_cache
            .insert(slug.to_string(), result.clone())
            .await;

        // A write that finished while we were reading may have invalidated
        // before our insert landed
        if self.writes.load(Ordering::SeqCst) != seen {
            self.read_cache.invalidate(slug).await;
        }

        Ok(result)
    }

    async fn update_post(&self, slug: &str, post: &NewPost) -> Result<Option<BlogPost>> {
        let result = self.inner.update_post(slug, post).await;
        self.invalidate_cache(slug).await;
        result
    }

    async fn delete_post(&self, slug: &str) -> Result<bool> {
        let result = self.inner.delete_post(slug).await;
        self.invalidate_cache(slug).await;
        result
    }

    async fn list_posts(
        &self,
        include_drafts: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogPost>> {
        self.inner.list_posts(include_drafts, limit, offset).await
    }

    async fn all_posts(&self) -> Result<Vec<BlogPost>> {
        self.inner.all_posts().await
    }
}
