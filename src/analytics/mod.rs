//! Visitor and blog interaction analytics
//!
//! Rows are recorded by the tracking endpoints and aggregated on demand for
//! the dashboard; nothing is pre-aggregated or kept in memory between
//! requests.

pub mod aggregator;
pub mod ip_extractor;
pub mod models;
pub mod report;

pub use aggregator::{EventSnapshot, StatsWindow};
pub use ip_extractor::{anonymize_ip, extract_client_ip};
pub use models::{AnalyticsStats, BlogPostStat, CountryStat, DailyBucket, StatsResponse};
pub use report::{load_stats, resolve_days};
