use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio::blog::{self, HealthReport, HealthStatus};
use folio::config::Config;
use folio::models::{BlogPost, PostPayload};
use folio::storage;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio-admin")]
#[command(about = "Folio blog and analytics maintenance CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the blog integrity check against the configured database
    Health,
    /// Validate a post payload stored as JSON
    Validate {
        /// Path to a JSON post payload
        file: PathBuf,
    },
    /// Run the integrity check over an exported list of posts
    CheckFile {
        /// Path to a JSON array of posts
        file: PathBuf,
    },
    /// Delete analytics rows older than the given age
    Prune {
        #[arg(long)]
        older_than_days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Health => {
            let config = Config::from_env()?;
            let storage = storage::connect(&config.database).await?;
            let report = blog::run_health_check(storage.as_ref()).await;
            print_health(&report)?;
            Ok(health_exit(&report))
        }
        Commands::Validate { file } => {
            let payload: PostPayload = read_json(&file)?;
            let report = blog::validate_post(&payload);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_valid {
                println!("✓ {} is valid", file.display());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("✗ {} has {} field(s) with errors", file.display(), report.errors.len());
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::CheckFile { file } => {
            let posts: Vec<BlogPost> = read_json(&file)?;
            let report = blog::check_posts(&posts);
            print_health(&report)?;
            Ok(health_exit(&report))
        }
        Commands::Prune { older_than_days } => {
            let config = Config::from_env()?;
            let storage = storage::connect(&config.database).await?;
            let cutoff =
                chrono::Utc::now().timestamp() - i64::from(older_than_days) * 24 * 60 * 60;
            let removed = storage.prune_events_before(cutoff).await?;
            println!(
                "✓ Removed {} analytics row(s) older than {} day(s)",
                removed, older_than_days
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_health(report: &HealthReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn health_exit(report: &HealthReport) -> ExitCode {
    match report.status {
        HealthStatus::Error => ExitCode::FAILURE,
        HealthStatus::Healthy | HealthStatus::Warning => ExitCode::SUCCESS,
    }
}
