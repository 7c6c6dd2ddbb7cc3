//! Fetches the row sets behind the dashboard and hands them to the aggregator

use anyhow::{Context, Result};
use tracing::debug;

use crate::analytics::aggregator::{build_stats, EventSnapshot, StatsWindow};
use crate::analytics::models::AnalyticsStats;
use crate::config::AnalyticsConfig;
use crate::models::EventType;
use crate::storage::Storage;

/// Run one query per metric and aggregate the results.
///
/// The queries are independent, so the payload is not a consistent snapshot
/// when rows are written concurrently.
pub async fn load_stats(
    storage: &dyn Storage,
    window: StatsWindow,
    config: &AnalyticsConfig,
) -> Result<AnalyticsStats> {
    let since = window.since();

    let visitors = storage
        .visitor_events_since(since)
        .await
        .context("failed to fetch visitor events")?;
    let blog_events = storage
        .blog_events_since(since, None)
        .await
        .context("failed to fetch blog events")?;
    let blog_views = storage
        .blog_events_since(since, Some(EventType::View))
        .await
        .context("failed to fetch blog view events")?;
    let recent_visitors = storage
        .recent_visitors(config.recent_visitors)
        .await
        .context("failed to fetch recent visitors")?;

    debug!(
        days = window.days(),
        visitors = visitors.len(),
        blog_events = blog_events.len(),
        "aggregating analytics"
    );

    Ok(build_stats(
        &window,
        EventSnapshot {
            visitors,
            blog_events,
            blog_views,
            recent_visitors,
        },
        config.top_n,
    ))
}

/// Resolve the `days` query parameter: missing or unparsable values use the
/// configured default, parsed values are clamped into `1..=max_days`.
pub fn resolve_days(raw: Option<&str>, config: &AnalyticsConfig) -> u32 {
    let max = config.max_days.max(1);
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(days) => days.clamp(1, i64::from(max)) as u32,
        None => config.default_days.clamp(1, max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_days_defaults_and_clamps() {
        let config = AnalyticsConfig::default();
        assert_eq!(resolve_days(None, &config), 30);
        assert_eq!(resolve_days(Some("7"), &config), 7);
        assert_eq!(resolve_days(Some("abc"), &config), 30);
        assert_eq!(resolve_days(Some("0"), &config), 1);
        assert_eq!(resolve_days(Some("-5"), &config), 1);
        assert_eq!(resolve_days(Some("100000"), &config), 365);
    }
}
