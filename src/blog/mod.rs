//! Blog content rules: validation of submitted posts, integrity scans over
//! the stored collection, and derived fields

pub mod content;
pub mod health;
pub mod validator;

pub use content::{reading_time, slugify};
pub use health::{check_posts, run_health_check, CollectionStats, HealthReport, HealthStatus};
pub use validator::{validate_post, ValidationReport};
