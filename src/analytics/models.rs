//! Data models for the analytics dashboard

use serde::Serialize;

use crate::models::VisitorEvent;

/// Per-day counters, keyed by UTC calendar date (`YYYY-MM-DD`)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: String,
    pub visitors: u64,
    pub page_views: u64,
    pub blog_views: u64,
}

impl DailyBucket {
    pub fn empty(date: String) -> Self {
        Self {
            date,
            visitors: 0,
            page_views: 0,
            blog_views: 0,
        }
    }
}

/// Interaction counters for one blog post
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostStat {
    pub slug: String,
    pub title: String,
    pub views: u64,
    pub reads: u64,
    pub clicks: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CountryStat {
    pub country: String,
    pub count: u64,
}

/// Dashboard payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub total_visitors: u64,
    pub total_page_views: u64,
    pub total_blog_views: u64,
    pub total_blog_reads: u64,
    pub total_link_clicks: u64,
    pub top_blog_posts: Vec<BlogPostStat>,
    pub visitors_by_country: Vec<CountryStat>,
    pub recent_visitors: Vec<VisitorEvent>,
    pub daily_stats: Vec<DailyBucket>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: AnalyticsStats,
}
