use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod db;
mod magic_link;
mod models;
mod percentile;
mod report;

use models::{DistributionSnapshot, PercentileSummary};

const DEV_MAGIC_LINK_SECRET: &str = "selfcheck-dev-secret";

#[derive(Parser)]
#[command(name = "selfcheck-results")]
#[command(about = "Percentile lookups and magic-link access for SelfCheck survey results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic distribution snapshot and sample results
    Seed,
    /// Import an externally aggregated score histogram from a CSV file
    ImportDistribution {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compare a score against the population distribution
    Percentile {
        #[arg(long)]
        score: i32,
        #[arg(long, default_value = "1.0")]
        version: String,
        #[arg(long)]
        json: bool,
    },
    /// Mint a magic-link token for a stored result set
    IssueLink {
        #[arg(long)]
        email: String,
        #[arg(long)]
        results_token: Uuid,
        #[arg(long, default_value_t = magic_link::DEFAULT_TTL_DAYS)]
        ttl_days: i64,
    },
    /// Verify a magic-link token and show the results it grants
    VerifyLink {
        #[arg(long)]
        token: String,
    },
    /// Generate a markdown report of the population distribution
    Report {
        #[arg(long, default_value = "1.0")]
        version: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;
    let secret = std::env::var("MAGIC_LINK_SECRET")
        .unwrap_or_else(|_| DEV_MAGIC_LINK_SECRET.to_string());
    let link_service = magic_link::MagicLinkService::new(&secret);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportDistribution { csv } => {
            let upserted = db::import_distribution(&pool, &csv).await?;
            println!("Upserted {upserted} buckets from {}.", csv.display());
        }
        Commands::Percentile {
            score,
            version,
            json,
        } => {
            let snapshot = db::fetch_distribution(&pool, &version).await?;
            let summary = summarize(&snapshot, score);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::IssueLink {
            email,
            results_token,
            ttl_days,
        } => {
            let result = db::fetch_result(&pool, results_token)
                .await?
                .with_context(|| format!("no stored results for handle {results_token}"))?;

            if result.email != email {
                anyhow::bail!("stored results for {results_token} belong to a different email");
            }

            let token = link_service
                .create(&email, &results_token.to_string(), Duration::days(ttl_days))
                .context("could not mint magic-link token")?;

            println!("Magic-link token for {email} (valid {ttl_days} days):");
            println!("{token}");
        }
        Commands::VerifyLink { token } => {
            if !magic_link::looks_like_token(&token) {
                anyhow::bail!("value is not shaped like a magic-link token");
            }

            let payload = match link_service.verify(&token) {
                Ok(payload) => payload,
                Err(_) => anyhow::bail!("magic link is invalid or expired"),
            };

            let results_token = Uuid::parse_str(&payload.results_token)
                .context("token carries an unusable results handle")?;
            let result = db::fetch_result(&pool, results_token)
                .await?
                .context("the linked results are no longer available")?;

            println!(
                "Results for {} (version {}, completed {}):",
                result.email, result.version, result.completed_at
            );
            println!("- total score {}", result.score);

            let snapshot = db::fetch_distribution(&pool, &result.version).await?;
            print_summary(&summarize(&snapshot, result.score));
        }
        Commands::Report { version, out } => {
            let snapshot = db::fetch_distribution(&pool, &version).await?;
            let report = report::build_report(&snapshot);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn summarize(snapshot: &DistributionSnapshot, score: i32) -> PercentileSummary {
    let total = snapshot.total_responses();
    let computed = percentile::calculate_percentile(score, &snapshot.buckets);

    let (percentile, note) = if total == 0 {
        (
            None,
            Some("no responses recorded yet for this version".to_string()),
        )
    } else if total < percentile::MIN_RESPONSES_FOR_COMPARISON {
        (
            None,
            Some(format!(
                "comparison withheld until at least {} responses exist (currently {})",
                percentile::MIN_RESPONSES_FOR_COMPARISON,
                total
            )),
        )
    } else {
        (computed, None)
    };

    PercentileSummary {
        version: snapshot.version.clone(),
        score,
        percentile,
        total_responses: total,
        refreshed_at: snapshot.refreshed_at,
        note,
    }
}

fn print_summary(summary: &PercentileSummary) {
    match (summary.percentile, summary.note.as_deref()) {
        (Some(value), _) => println!(
            "- score {} is higher than {}% of {} respondents (version {})",
            summary.score, value, summary.total_responses, summary.version
        ),
        (None, Some(note)) => println!("- score {}: {note}", summary.score),
        (None, None) => println!("- score {}: no percentile available", summary.score),
    }

    if let Some(refreshed_at) = summary.refreshed_at {
        println!(
            "- population snapshot as of {}",
            refreshed_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
}
