use crate::models::{
    BlogInteractionEvent, BlogPost, EventType, NewBlogEvent, NewPost, NewVisitor, VisitorEvent,
};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slug already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Round-trip a trivial query to confirm the database is reachable
    async fn ping(&self) -> Result<()>;

    /// Record a site visit
    async fn record_visitor(&self, visitor: &NewVisitor) -> Result<VisitorEvent>;

    /// Record a blog interaction
    async fn record_blog_event(&self, event: &NewBlogEvent) -> Result<()>;

    /// Visitor rows created at or after `since` (Unix seconds), unordered
    async fn visitor_events_since(&self, since: i64) -> Result<Vec<VisitorEvent>>;

    /// Blog interaction rows created at or after `since`, optionally of one type.
    /// Rows with an unrecognised stored event type are skipped.
    async fn blog_events_since(
        &self,
        since: i64,
        event_type: Option<EventType>,
    ) -> Result<Vec<BlogInteractionEvent>>;

    /// Most recent visitors, newest first
    async fn recent_visitors(&self, limit: i64) -> Result<Vec<VisitorEvent>>;

    /// Delete visitor and blog interaction rows older than `cutoff`.
    /// Returns the number of rows removed across both tables.
    async fn prune_events_before(&self, cutoff: i64) -> Result<u64>;

    /// Create a post; fails with `Conflict` when the slug is taken
    async fn create_post(&self, post: &NewPost) -> StorageResult<BlogPost>;

    /// Get a post by slug, published or not
    async fn get_post(&self, slug: &str) -> Result<Option<BlogPost>>;

    /// Replace the editable fields of the post with this slug.
    /// Returns `None` when no such post exists.
    async fn update_post(&self, slug: &str, post: &NewPost) -> Result<Option<BlogPost>>;

    /// Delete a post by slug
    async fn delete_post(&self, slug: &str) -> Result<bool>;

    /// List posts newest first (with pagination)
    /// If include_drafts is false, only published posts are returned
    async fn list_posts(
        &self,
        include_drafts: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogPost>>;

    /// Every stored post, for integrity scans
    async fn all_posts(&self) -> Result<Vec<BlogPost>>;
}
