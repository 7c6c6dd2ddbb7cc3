//! Request-scoped aggregation of visitor and blog interaction rows
//!
//! Everything here is a pure function over rows already fetched from
//! storage: each call builds fresh maps, nothing is shared between requests.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::analytics::models::{AnalyticsStats, BlogPostStat, CountryStat, DailyBucket};
use crate::models::{BlogInteractionEvent, EventType, VisitorEvent};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trailing window of whole UTC days ending today.
#[derive(Debug, Clone, Copy)]
pub struct StatsWindow {
    days: u32,
    now: DateTime<Utc>,
}

impl StatsWindow {
    /// `days` is clamped to at least one day.
    pub fn new(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            days: days.max(1),
            now,
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Unix timestamp of `now - days`, the lower bound for row queries
    pub fn since(&self) -> i64 {
        (self.now - Duration::days(i64::from(self.days))).timestamp()
    }

    /// Calendar days covered by the daily series, today first
    pub fn day_keys(&self) -> impl Iterator<Item = NaiveDate> {
        let today = self.now.date_naive();
        (0..i64::from(self.days)).map(move |offset| today - Duration::days(offset))
    }
}

/// Rows fetched for one dashboard request; each set comes from its own query.
#[derive(Debug, Default)]
pub struct EventSnapshot {
    pub visitors: Vec<VisitorEvent>,
    pub blog_events: Vec<BlogInteractionEvent>,
    pub blog_views: Vec<BlogInteractionEvent>,
    pub recent_visitors: Vec<VisitorEvent>,
}

/// Fold blog interactions into one counter set per slug.
///
/// Output keeps first-seen slug order; the title comes from the first row.
pub fn aggregate_post_stats(events: &[BlogInteractionEvent]) -> Vec<BlogPostStat> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut stats: Vec<BlogPostStat> = Vec::new();

    for event in events {
        let slot = *index.entry(event.blog_slug.as_str()).or_insert_with(|| {
            stats.push(BlogPostStat {
                slug: event.blog_slug.clone(),
                title: event.blog_title.clone(),
                views: 0,
                reads: 0,
                clicks: 0,
            });
            stats.len() - 1
        });

        let stat = &mut stats[slot];
        match event.event_type {
            EventType::View => stat.views += 1,
            EventType::Read => stat.reads += 1,
            EventType::Click => stat.clicks += 1,
        }
    }

    stats
}

/// Count visitors per country string, verbatim. Rows without a country are skipped.
pub fn aggregate_countries(visitors: &[VisitorEvent]) -> Vec<CountryStat> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut stats: Vec<CountryStat> = Vec::new();

    let countries = visitors
        .iter()
        .filter_map(|v| v.country.as_deref())
        .filter(|c| !c.trim().is_empty());

    for country in countries {
        match index.get(country) {
            Some(&slot) => stats[slot].count += 1,
            None => {
                index.insert(country, stats.len());
                stats.push(CountryStat {
                    country: country.to_string(),
                    count: 1,
                });
            }
        }
    }

    stats
}

/// Zero-filled per-day counters for the window, oldest day first.
///
/// Rows whose day falls outside the window are ignored; only `view`
/// interactions count towards `blogViews`.
pub fn daily_series(
    window: &StatsWindow,
    visitors: &[VisitorEvent],
    blog_views: &[BlogInteractionEvent],
) -> Vec<DailyBucket> {
    let mut buckets: BTreeMap<NaiveDate, DailyBucket> = window
        .day_keys()
        .map(|day| (day, DailyBucket::empty(day.format(DATE_FORMAT).to_string())))
        .collect();

    for visitor in visitors {
        if let Some(bucket) = day_of(visitor.created_at).and_then(|d| buckets.get_mut(&d)) {
            bucket.visitors += 1;
            bucket.page_views += 1;
        }
    }

    for event in blog_views
        .iter()
        .filter(|e| e.event_type == EventType::View)
    {
        if let Some(bucket) = day_of(event.created_at).and_then(|d| buckets.get_mut(&d)) {
            bucket.blog_views += 1;
        }
    }

    buckets.into_values().collect()
}

/// Highest `views` first, capped at `n`. Ties keep input order.
pub fn top_posts(mut stats: Vec<BlogPostStat>, n: usize) -> Vec<BlogPostStat> {
    stats.sort_by(|a, b| b.views.cmp(&a.views));
    stats.truncate(n);
    stats
}

/// Highest `count` first, capped at `n`. Ties keep input order.
pub fn top_countries(mut stats: Vec<CountryStat>, n: usize) -> Vec<CountryStat> {
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(n);
    stats
}

/// Assemble the dashboard payload from one snapshot of rows.
pub fn build_stats(window: &StatsWindow, snapshot: EventSnapshot, top_n: usize) -> AnalyticsStats {
    let post_stats = aggregate_post_stats(&snapshot.blog_events);
    let countries = aggregate_countries(&snapshot.visitors);
    let daily_stats = daily_series(window, &snapshot.visitors, &snapshot.blog_views);

    let count_of = |kind: EventType| {
        snapshot
            .blog_events
            .iter()
            .filter(|e| e.event_type == kind)
            .count() as u64
    };

    let total_visitors = snapshot.visitors.len() as u64;

    AnalyticsStats {
        total_visitors,
        total_page_views: total_visitors,
        total_blog_views: count_of(EventType::View),
        total_blog_reads: count_of(EventType::Read),
        total_link_clicks: count_of(EventType::Click),
        top_blog_posts: top_posts(post_stats, top_n),
        visitors_by_country: top_countries(countries, top_n),
        recent_visitors: snapshot.recent_visitors,
        daily_stats,
    }
}

fn day_of(timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> i64 {
        (now() - Duration::days(days)).timestamp()
    }

    fn visitor(id: i64, created_at: i64, country: Option<&str>) -> VisitorEvent {
        VisitorEvent {
            id,
            created_at,
            country: country.map(str::to_string),
            city: None,
            ip_address: "198.51.100.0".to_string(),
        }
    }

    fn event(slug: &str, kind: EventType, created_at: i64) -> BlogInteractionEvent {
        BlogInteractionEvent {
            blog_slug: slug.to_string(),
            blog_title: format!("Post {slug}"),
            event_type: kind,
            created_at,
        }
    }

    #[test]
    fn test_window_has_one_bucket_per_day_ascending() {
        let window = StatsWindow::new(7, now());
        let series = daily_series(&window, &[], &[]);

        assert_eq!(series.len(), 7);
        assert_eq!(series.first().unwrap().date, "2024-03-04");
        assert_eq!(series.last().unwrap().date, "2024-03-10");
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert!(series
            .iter()
            .all(|b| b.visitors == 0 && b.page_views == 0 && b.blog_views == 0));
    }

    #[test]
    fn test_window_spans_month_boundary() {
        let window = StatsWindow::new(30, now());
        let series = daily_series(&window, &[], &[]);
        assert_eq!(series.len(), 30);
        assert_eq!(series[0].date, "2024-02-10");
        assert!(series.iter().any(|b| b.date == "2024-02-29"));
    }

    #[test]
    fn test_zero_days_is_clamped_to_one() {
        let window = StatsWindow::new(0, now());
        assert_eq!(window.days(), 1);
        assert_eq!(daily_series(&window, &[], &[]).len(), 1);
    }

    #[test]
    fn test_since_is_days_before_now() {
        let window = StatsWindow::new(7, now());
        assert_eq!(window.since(), days_ago(7));
    }

    #[test]
    fn test_concrete_scenario() {
        let window = StatsWindow::new(7, now());
        let visitors = vec![
            visitor(1, days_ago(1), Some("India")),
            visitor(2, days_ago(1), Some("India")),
            visitor(3, days_ago(1), Some("USA")),
        ];
        let views = vec![
            event("a", EventType::View, days_ago(2)),
            event("a", EventType::View, days_ago(2)),
        ];

        let stats = build_stats(
            &window,
            EventSnapshot {
                visitors,
                blog_events: views.clone(),
                blog_views: views,
                recent_visitors: Vec::new(),
            },
            10,
        );

        assert_eq!(
            stats.visitors_by_country,
            vec![
                CountryStat {
                    country: "India".to_string(),
                    count: 2
                },
                CountryStat {
                    country: "USA".to_string(),
                    count: 1
                },
            ]
        );

        let day = |date: &str| stats.daily_stats.iter().find(|b| b.date == date).unwrap();
        assert_eq!(day("2024-03-09").visitors, 3);
        assert_eq!(day("2024-03-09").page_views, 3);
        assert_eq!(day("2024-03-08").blog_views, 2);

        let other_activity: u64 = stats
            .daily_stats
            .iter()
            .filter(|b| b.date != "2024-03-09" && b.date != "2024-03-08")
            .map(|b| b.visitors + b.page_views + b.blog_views)
            .sum();
        assert_eq!(other_activity, 0);

        assert_eq!(stats.total_visitors, 3);
        assert_eq!(stats.total_page_views, 3);
        assert_eq!(stats.total_blog_views, 2);
        assert_eq!(stats.top_blog_posts[0].slug, "a");
        assert_eq!(stats.top_blog_posts[0].views, 2);
    }

    #[test]
    fn test_rows_outside_window_are_skipped_in_daily_series() {
        let window = StatsWindow::new(3, now());
        let visitors = vec![visitor(1, days_ago(5), Some("France"))];
        let series = daily_series(&window, &visitors, &[]);
        assert!(series.iter().all(|b| b.visitors == 0));
    }

    #[test]
    fn test_post_stats_increment_matching_counter() {
        let events = vec![
            event("a", EventType::View, 0),
            event("b", EventType::Read, 0),
            event("a", EventType::Click, 0),
            event("a", EventType::Read, 0),
            event("a", EventType::View, 0),
        ];
        let stats = aggregate_post_stats(&events);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].slug, "a");
        assert_eq!((stats[0].views, stats[0].reads, stats[0].clicks), (2, 1, 1));
        assert_eq!((stats[1].views, stats[1].reads, stats[1].clicks), (0, 1, 0));
    }

    #[test]
    fn test_countries_are_case_sensitive_and_skip_missing() {
        let visitors = vec![
            visitor(1, 0, Some("USA")),
            visitor(2, 0, Some("usa")),
            visitor(3, 0, None),
            visitor(4, 0, Some("")),
            visitor(5, 0, Some("USA")),
        ];
        let stats = aggregate_countries(&visitors);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[1].country, "usa");
        assert!(stats.iter().all(|s| !s.country.is_empty()));
    }

    #[test]
    fn test_top_posts_capped_and_stable() {
        let events: Vec<_> = (0..12)
            .map(|i| event(&format!("post-{i}"), EventType::View, 0))
            .chain(std::iter::once(event("post-5", EventType::View, 0)))
            .collect();
        let total_views = events.len() as u64;

        let top = top_posts(aggregate_post_stats(&events), 10);

        assert_eq!(top.len(), 10);
        assert_eq!(top[0].slug, "post-5");
        // Equal counts keep first-seen order
        assert_eq!(top[1].slug, "post-0");
        assert_eq!(top[2].slug, "post-1");
        assert!(top.iter().map(|p| p.views).sum::<u64>() <= total_views);
    }

    #[test]
    fn test_top_countries_sorted_descending() {
        let visitors = vec![
            visitor(1, 0, Some("Chile")),
            visitor(2, 0, Some("Japan")),
            visitor(3, 0, Some("Japan")),
        ];
        let top = top_countries(aggregate_countries(&visitors), 10);
        assert_eq!(top[0].country, "Japan");
        assert_eq!(top[1].country, "Chile");
    }

    #[test]
    fn test_daily_series_ignores_non_view_events() {
        let window = StatsWindow::new(2, now());
        let events = vec![
            event("a", EventType::Read, days_ago(0)),
            event("a", EventType::View, days_ago(0)),
        ];
        let series = daily_series(&window, &[], &events);
        assert_eq!(series.last().unwrap().blog_views, 1);
    }
}
