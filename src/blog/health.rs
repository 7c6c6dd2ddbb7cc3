//! Integrity scan over the whole post collection

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::error;

use crate::models::BlogPost;
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total_posts: usize,
    pub published_posts: usize,
    pub draft_posts: usize,
    pub average_reading_time: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub stats: CollectionStats,
}

impl HealthReport {
    /// Report standing in for a scan that could not run
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            issues: vec![reason.into()],
            recommendations: Vec::new(),
            stats: CollectionStats::default(),
        }
    }
}

/// Scan `posts` for duplicates and missing data. Never mutates anything.
pub fn check_posts(posts: &[BlogPost]) -> HealthReport {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    if posts.is_empty() {
        recommendations.push("No blog posts found. Create your first post.".to_string());
    }

    for slug in duplicates(posts.iter().map(|p| p.slug.trim()).filter(|s| !s.is_empty())) {
        issues.push(format!("Duplicate slug found: {slug}"));
    }

    for id in duplicates(posts.iter().map(|p| p.id).filter(|id| *id > 0)) {
        issues.push(format!("Duplicate id found: {id}"));
    }

    for (position, post) in posts.iter().enumerate() {
        let missing = missing_fields(post);
        if !missing.is_empty() {
            let label = if post.slug.trim().is_empty() {
                format!("at position {position}")
            } else {
                format!("'{}'", post.slug)
            };
            issues.push(format!(
                "Post {label} is missing required fields: {}",
                missing.join(", ")
            ));
        }
    }

    let untagged = posts.iter().filter(|p| p.tags.is_empty()).count();
    if untagged > 0 {
        recommendations.push(format!(
            "{untagged} post(s) have no tags; tagging helps readers find related content"
        ));
    }

    let status = if !issues.is_empty() {
        HealthStatus::Error
    } else if !recommendations.is_empty() {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    HealthReport {
        status,
        issues,
        recommendations,
        stats: collection_stats(posts),
    }
}

/// Scan a fresh snapshot from storage. Fetch failures become an `error`
/// report instead of propagating.
pub async fn run_health_check(storage: &dyn Storage) -> HealthReport {
    match storage.all_posts().await {
        Ok(posts) => check_posts(&posts),
        Err(e) => {
            error!("Blog health check failed: {:#}", e);
            HealthReport::failed("Failed to perform health check")
        }
    }
}

fn duplicates<T>(values: impl Iterator<Item = T>) -> BTreeSet<T>
where
    T: Ord + std::hash::Hash + Eq + Clone,
{
    let mut seen = HashSet::new();
    let mut dupes = BTreeSet::new();
    for value in values {
        if !seen.insert(value.clone()) {
            dupes.insert(value);
        }
    }
    dupes
}

fn missing_fields(post: &BlogPost) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if post.id <= 0 {
        missing.push("id");
    }
    if post.slug.trim().is_empty() {
        missing.push("slug");
    }
    if post.title.trim().is_empty() {
        missing.push("title");
    }
    if post.content.trim().is_empty() {
        missing.push("content");
    }
    if post.author.trim().is_empty() {
        missing.push("author");
    }
    missing
}

fn collection_stats(posts: &[BlogPost]) -> CollectionStats {
    let total_posts = posts.len();
    let published_posts = posts.iter().filter(|p| p.published).count();
    let average_reading_time = if total_posts == 0 {
        0
    } else {
        let sum: i64 = posts.iter().map(|p| p.reading_time).sum();
        (sum as f64 / total_posts as f64).round() as i64
    };

    CollectionStats {
        total_posts,
        published_posts,
        draft_posts: total_posts - published_posts,
        average_reading_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, slug: &str) -> BlogPost {
        BlogPost {
            id,
            slug: slug.to_string(),
            title: format!("Title {slug}"),
            content: "Body".to_string(),
            author: "Sam".to_string(),
            tags: vec!["rust".to_string()],
            published: true,
            reading_time: 3,
            ..BlogPost::default()
        }
    }

    #[test]
    fn test_clean_collection_is_healthy() {
        let report = check_posts(&[post(1, "a"), post(2, "b")]);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert!(report.issues.is_empty());
        assert!(report.recommendations.is_empty());
        assert_eq!(report.stats.total_posts, 2);
    }

    #[test]
    fn test_duplicate_slug_is_error() {
        let report = check_posts(&[post(1, "same"), post(2, "same")]);
        assert_eq!(report.status, HealthStatus::Error);
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("Duplicate slug") && i.contains("same")));
    }

    #[test]
    fn test_duplicate_id_is_error() {
        let report = check_posts(&[post(4, "a"), post(4, "b")]);
        assert_eq!(report.status, HealthStatus::Error);
        assert_eq!(report.issues, vec!["Duplicate id found: 4".to_string()]);
    }

    #[test]
    fn test_empty_collection_is_never_healthy() {
        let report = check_posts(&[]);
        assert_ne!(report.status, HealthStatus::Healthy);
        assert_eq!(report.status, HealthStatus::Warning);
        assert_eq!(report.stats.average_reading_time, 0);
    }

    #[test]
    fn test_missing_fields_reported() {
        let broken = BlogPost {
            author: String::new(),
            content: "  ".to_string(),
            ..post(3, "broken")
        };
        let report = check_posts(&[broken, BlogPost::default()]);
        assert_eq!(report.status, HealthStatus::Error);
        assert!(report.issues[0].contains("'broken'"));
        assert!(report.issues[0].contains("content, author"));
        assert!(report.issues[1].contains("position 1"));
        assert!(report.issues[1].contains("id, slug, title, content, author"));
    }

    #[test]
    fn test_untagged_posts_warn() {
        let untagged = BlogPost {
            tags: Vec::new(),
            ..post(1, "a")
        };
        let report = check_posts(&[untagged]);
        assert_eq!(report.status, HealthStatus::Warning);
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_stats_count_drafts_and_round_reading_time() {
        let draft = BlogPost {
            published: false,
            reading_time: 4,
            ..post(2, "b")
        };
        let report = check_posts(&[post(1, "a"), draft]);
        assert_eq!(report.stats.published_posts, 1);
        assert_eq!(report.stats.draft_posts, 1);
        // (3 + 4) / 2 = 3.5
        assert_eq!(report.stats.average_reading_time, 4);
    }
}
