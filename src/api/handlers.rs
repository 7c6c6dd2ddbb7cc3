use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::AuthService;
use crate::blog::{self, HealthReport, ValidationReport};
use crate::config::{AnalyticsConfig, BlogConfig};
use crate::contact::ContactRelay;
use crate::error::AppError;
use crate::models::{BlogPost, NewPost, PostPayload, UpdatePostRequest};
use crate::storage::{Storage, StorageError};

pub struct AppState {
    /// `None` when the database could not be reached at startup
    pub storage: Option<Arc<dyn Storage>>,
    pub auth: Arc<AuthService>,
    pub contact: Option<Arc<ContactRelay>>,
    pub analytics: AnalyticsConfig,
    pub blog: BlogConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct PostWriteResponse {
    pub post: BlogPost,
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl ListQuery {
    fn bounds(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

/// Storage handle that just answered a connectivity check
async fn connected_storage(state: &AppState) -> Result<Arc<dyn Storage>, AppError> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::Connectivity("Database unavailable".to_string()))?;

    if let Err(e) = storage.ping().await {
        warn!("Database connectivity check failed: {:#}", e);
        return Err(AppError::Connectivity("Database unavailable".to_string()));
    }

    Ok(Arc::clone(storage))
}

/// Slugs shadowed by static routes under `/api/blog/`
const RESERVED_SLUGS: &[&str] = &["health", "validate"];

fn query_failed(action: &str, e: anyhow::Error) -> AppError {
    error!("Failed to {}: {:#}", action, e);
    AppError::Query(format!("Failed to {action}"))
}

fn prepare_post(payload: PostPayload, default_author: &str) -> Result<NewPost, AppError> {
    let slug = payload
        .slug
        .as_deref()
        .map(blog::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| blog::slugify(&payload.title));

    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "Could not derive a slug; include letters or digits in the title".to_string(),
        ));
    }
    if RESERVED_SLUGS.contains(&slug.as_str()) {
        return Err(AppError::BadRequest(format!(
            "The slug '{slug}' is reserved; choose a different slug or title"
        )));
    }

    let author = payload
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| default_author.to_string());

    Ok(NewPost {
        slug,
        reading_time: blog::reading_time(&payload.content),
        title: payload.title.trim().to_string(),
        intro: payload.intro.trim().to_string(),
        content: payload.content,
        tags: payload.tags.iter().map(|t| t.trim().to_string()).collect(),
        image_urls: payload.image_urls.iter().map(|u| u.trim().to_string()).collect(),
        cta: payload.cta,
        author,
        published: payload.published,
    })
}

fn checked(payload: &PostPayload) -> Result<ValidationReport, AppError> {
    let report = blog::validate_post(payload);
    if report.is_valid {
        Ok(report)
    } else {
        Err(AppError::Validation(report))
    }
}

/// List published posts, newest first
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BlogPost>>, AppError> {
    let storage = connected_storage(&state).await?;
    let (limit, offset) = query.bounds();

    storage
        .list_posts(false, limit, offset)
        .await
        .map(Json)
        .map_err(|e| query_failed("list posts", e))
}

/// List every post including drafts
pub async fn admin_list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BlogPost>>, AppError> {
    let storage = connected_storage(&state).await?;
    let (limit, offset) = query.bounds();

    storage
        .list_posts(true, limit, offset)
        .await
        .map(Json)
        .map_err(|e| query_failed("list posts", e))
}

/// Get a published post by slug
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    let storage = connected_storage(&state).await?;

    match storage.get_post(&slug).await {
        Ok(Some(post)) if post.published => Ok(Json(post)),
        Ok(_) => Err(AppError::NotFound("Post not found".to_string())),
        Err(e) => Err(query_failed("get post", e)),
    }
}

/// Validate and create a post
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PostPayload>,
) -> Result<(StatusCode, Json<PostWriteResponse>), AppError> {
    let storage = connected_storage(&state).await?;
    let report = checked(&payload)?;
    let new_post = prepare_post(payload, &state.blog.default_author)?;

    match storage.create_post(&new_post).await {
        Ok(post) => {
            info!(slug = %post.slug, "Created blog post");
            Ok((
                StatusCode::CREATED,
                Json(PostWriteResponse {
                    post,
                    warnings: report.warnings,
                }),
            ))
        }
        Err(StorageError::Conflict) => Err(AppError::Conflict(
            "A post with this slug already exists".to_string(),
        )),
        Err(StorageError::Other(e)) => Err(query_failed("create post", e)),
    }
}

/// Apply a partial update, validating the merged result
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(changes): Json<UpdatePostRequest>,
) -> Result<Json<PostWriteResponse>, AppError> {
    let storage = connected_storage(&state).await?;

    let existing = storage
        .get_post(&slug)
        .await
        .map_err(|e| query_failed("get post", e))?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let payload = changes.merge_into(&existing);
    let report = checked(&payload)?;
    let mut new_post = prepare_post(payload, &state.blog.default_author)?;
    // The slug is the post's identity in URLs and is never rewritten
    new_post.slug = existing.slug;

    match storage.update_post(&slug, &new_post).await {
        Ok(Some(post)) => {
            info!(slug = %post.slug, "Updated blog post");
            Ok(Json(PostWriteResponse {
                post,
                warnings: report.warnings,
            }))
        }
        Ok(None) => Err(AppError::NotFound("Post not found".to_string())),
        Err(e) => Err(query_failed("update post", e)),
    }
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let storage = connected_storage(&state).await?;

    match storage.delete_post(&slug).await {
        Ok(true) => {
            info!(slug = %slug, "Deleted blog post");
            Ok(Json(SuccessResponse {
                message: "Post deleted successfully".to_string(),
            }))
        }
        Ok(false) => Err(AppError::NotFound("Post not found".to_string())),
        Err(e) => Err(query_failed("delete post", e)),
    }
}

/// Dry-run validation for the editor; never writes
pub async fn validate_post(Json(payload): Json<PostPayload>) -> Json<ValidationReport> {
    Json(blog::validate_post(&payload))
}

/// Integrity scan over all stored posts; reports failures instead of erroring
pub async fn blog_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let report = match &state.storage {
        Some(storage) => blog::run_health_check(storage.as_ref()).await,
        None => HealthReport::failed("Failed to perform health check"),
    };
    Json(report)
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
