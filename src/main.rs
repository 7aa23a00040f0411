use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use open_house_engagement::events::{EventKind, RawEvent, SignalKind, POINT_TABLE};
use open_house_engagement::leaderboard::{build_leaderboard_with, TierScheme};
use open_house_engagement::models::{Leaderboard, Signal, VisitorSummary};
use open_house_engagement::{demo, report, score, signals, watch};

mod db;

#[derive(Parser)]
#[command(name = "open-house")]
#[command(about = "Open house visitor engagement tracker", long_about = None)]
struct Cli {
    /// Maximum Postgres connections
    #[arg(long, global = true, default_value_t = 5)]
    max_connections: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scheme {
    /// 75 high-priority / 50 engaged / evaluating
    Readiness,
    /// 80 hot lead / 60 high intent / 40 interested / browsing
    Intent,
}

impl From<Scheme> for TierScheme {
    fn from(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Readiness => TierScheme::readiness(),
            Scheme::Intent => TierScheme::intent(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List valid event types with their point values
    EventTypes {
        #[arg(long)]
        json: bool,
    },
    /// Print the sample leaderboard without a database
    Demo {
        #[arg(long, value_enum, default_value_t = Scheme::Readiness)]
        scheme: Scheme,
        #[arg(long)]
        json: bool,
    },
    #[command(flatten)]
    Db(DbCommand),
}

/// Commands that need a Postgres connection.
#[derive(Subcommand)]
enum DbCommand {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the sample cohort into a property
    Seed {
        #[arg(long, default_value = "demo-property")]
        property: String,
    },
    /// Record an interaction and print the updated engagement score
    Record {
        #[arg(long)]
        visitor: String,
        #[arg(long)]
        property: String,
        #[arg(long)]
        event_type: String,
        #[arg(long)]
        detail: Option<String>,
        /// JSON object stored alongside the event
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Print the engagement score for a visitor at a property
    Score {
        #[arg(long)]
        visitor: String,
        #[arg(long)]
        property: String,
    },
    /// Rank a property's visitors
    Leaderboard {
        #[arg(long)]
        property: String,
        #[arg(long, value_enum, default_value_t = Scheme::Readiness)]
        scheme: Scheme,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Record a live feed signal
    Signal {
        #[arg(long)]
        property: String,
        /// check-in, feature-discovered or referral
        #[arg(long)]
        signal_type: String,
        #[arg(long)]
        actor: String,
        #[arg(long, default_value = "")]
        detail: String,
    },
    /// Show the live signal feed, newest first
    Feed {
        #[arg(long)]
        property: String,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        property: String,
        #[arg(long, value_enum, default_value_t = Scheme::Readiness)]
        scheme: Scheme,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Import interaction events from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Poll a property's leaderboard on an interval
    Watch {
        #[arg(long)]
        property: String,
        #[arg(long, value_enum, default_value_t = Scheme::Readiness)]
        scheme: Scheme,
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
        /// Stop after this many fetches
        #[arg(long)]
        fetches: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::EventTypes { json } => {
            if json {
                let table: serde_json::Map<String, serde_json::Value> = POINT_TABLE
                    .iter()
                    .map(|(kind, points)| (kind.as_str().to_string(), (*points).into()))
                    .collect();
                let body = serde_json::json!({
                    "event_types": table,
                    "signal_types": SignalKind::names(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                for kind in EventKind::ALL {
                    println!("{:<18} {:>3} pts", kind.as_str(), kind.points());
                }
                println!("signals: {}", SignalKind::names().join(", "));
            }
        }
        Commands::Demo { scheme, json } => {
            let board = build_leaderboard_with(&demo::sample_visitors(Utc::now()), &scheme.into());
            print_leaderboard(&board, usize::MAX, json, true)?;
        }
        Commands::Db(command) => run_with_database(command, cli.max_connections).await?,
    }

    Ok(())
}

async fn connect(max_connections: u32) -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn run_with_database(command: DbCommand, max_connections: u32) -> anyhow::Result<()> {
    let pool = connect(max_connections).await?;

    match command {
        DbCommand::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        DbCommand::Seed { property } => {
            db::seed(&pool, &property, Utc::now()).await?;
            println!("Sample cohort inserted for {property}.");
        }
        DbCommand::Record {
            visitor,
            property,
            event_type,
            detail,
            metadata,
        } => {
            let mut raw = RawEvent {
                visitor_id: Some(visitor),
                property_id: Some(property),
                event_type: Some(event_type),
                detail,
                ..RawEvent::default()
            };
            if let Some(metadata) = metadata.as_deref() {
                raw = raw.with_metadata_str(metadata)?;
            }
            // validation happens before anything is written
            let event = raw.validate(Utc::now())?;
            let id = db::insert_interaction(&pool, &event).await?;
            info!(%id, visitor = %event.visitor_id, kind = %event.kind, "recorded interaction");

            let events = db::fetch_interactions(&pool, &event.visitor_id, &event.property_id).await?;
            let engagement = score::compute_score(&event.visitor_id, &event.property_id, &events);
            let body = serde_json::json!({
                "success": true,
                "interaction": { "id": id, "event": event },
                "engagement_score": engagement,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        DbCommand::Score { visitor, property } => {
            let events = db::fetch_interactions(&pool, &visitor, &property).await?;
            let engagement = score::compute_score(&visitor, &property, &events);
            let body = serde_json::json!({ "engagement_score": engagement });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        DbCommand::Leaderboard {
            property,
            scheme,
            limit,
            json,
        } => {
            let (visitors, sample) = visitors_or_sample(&pool, &property, Utc::now()).await;
            let board = build_leaderboard_with(&visitors, &scheme.into());
            print_leaderboard(&board, limit, json, sample)?;
        }
        DbCommand::Signal {
            property,
            signal_type,
            actor,
            detail,
        } => {
            let kind: SignalKind = signal_type.parse()?;
            let signal = Signal {
                id: uuid::Uuid::new_v4().to_string(),
                kind,
                actor_name: actor,
                detail,
                timestamp: Utc::now(),
            };
            db::insert_signal(&pool, &property, &signal).await?;
            info!(property = %property, kind = %signal.kind, "recorded signal");
            println!("{} signal recorded.", signal.kind);
        }
        DbCommand::Feed {
            property,
            limit,
            json,
        } => {
            let now = Utc::now();
            let feed = report::newest_first(&db::fetch_signals(&pool, &property, limit).await?);
            if json {
                let described: Vec<_> = feed
                    .iter()
                    .map(|signal| {
                        serde_json::json!({
                            "signal": signal,
                            "description": signals::describe(signal, now),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&described)?);
            } else if feed.is_empty() {
                println!("No signals yet.");
            } else {
                for signal in &feed {
                    let description = signals::describe(signal, now);
                    println!(
                        "{:>9}  {} {}",
                        description.freshness, signal.actor_name, description.message
                    );
                }
            }
        }
        DbCommand::Report {
            property,
            scheme,
            out,
        } => {
            let now = Utc::now();
            let (visitors, sample_visitors) = visitors_or_sample(&pool, &property, now).await;
            let board = build_leaderboard_with(&visitors, &scheme.into());
            // a sample cohort is always paired with the sample feed
            let (feed, sample_feed) = match db::fetch_signals(&pool, &property, 50).await {
                Ok(feed) if !sample_visitors => (feed, false),
                Ok(_) => (demo::sample_signals(now), true),
                Err(err) => {
                    warn!(error = %err, "signal read failed; report will use sample feed");
                    (demo::sample_signals(now), true)
                }
            };
            let sample = report::SampleData {
                visitors: sample_visitors,
                feed: sample_feed,
            };
            let report = report::build_report(&property, now, &board, &feed, sample);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        DbCommand::Import { csv } => {
            let summary = db::import_csv(&pool, &csv, Utc::now()).await?;
            println!(
                "Inserted {} events from {} ({} rejected).",
                summary.inserted,
                csv.display(),
                summary.rejected
            );
        }
        DbCommand::Watch {
            property,
            scheme,
            interval_secs,
            fetches,
        } => {
            let scheme: TierScheme = scheme.into();
            info!(property = %property, interval_secs, "watching leaderboard");
            watch::poll(
                Duration::from_secs(interval_secs.max(1)),
                fetches,
                |seq| {
                    let pool = pool.clone();
                    let property = property.clone();
                    async move {
                        tracing::debug!(seq, "fetching visitors");
                        db::fetch_visitors(&pool, &property, Utc::now()).await
                    }
                },
                |visitors: Vec<VisitorSummary>| build_leaderboard_with(&visitors, &scheme),
                |seq, board: &Leaderboard| {
                    println!(
                        "[{}] #{} {} visitors, avg score {}, {} high-priority",
                        Utc::now().format("%H:%M:%S"),
                        seq,
                        board.stats.visitor_count,
                        board.stats.average_score,
                        board.stats.high_priority_count
                    );
                    for row in board.ranked.iter().take(5) {
                        println!(
                            "  {}. {} {} [{}]",
                            row.rank, row.visitor.name, row.visitor.engagement_score, row.tier
                        );
                    }
                },
            )
            .await;
        }
    }

    Ok(())
}

/// Visitors for `property`, or the labelled sample cohort when the read fails
/// or returns nothing.
async fn visitors_or_sample(
    pool: &PgPool,
    property: &str,
    now: DateTime<Utc>,
) -> (Vec<VisitorSummary>, bool) {
    match db::fetch_visitors(pool, property, now).await {
        Ok(visitors) if !visitors.is_empty() => (visitors, false),
        Ok(_) => {
            info!(property, "no visitors yet; showing sample data");
            (demo::sample_visitors(now), true)
        }
        Err(err) => {
            warn!(property, error = %err, "visitor read failed; showing sample data");
            (demo::sample_visitors(now), true)
        }
    }
}

fn print_leaderboard(
    board: &Leaderboard,
    limit: usize,
    json: bool,
    sample: bool,
) -> anyhow::Result<()> {
    if json {
        let body = serde_json::json!({ "sample": sample, "leaderboard": board });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if sample {
        println!("({})", demo::SAMPLE_LABEL);
    }
    if board.is_empty() {
        println!("No visitors yet.");
        return Ok(());
    }

    let stats = &board.stats;
    println!(
        "{} visitors, avg score {}, {} high-priority, avg time {}, {} referrals",
        stats.visitor_count,
        stats.average_score,
        stats.high_priority_count,
        stats.average_time_in_home,
        stats.total_referrals
    );
    for row in board.ranked.iter().take(limit) {
        println!(
            "{:>3}. {:<20} {:>3} {:<14} {:>7} in home",
            row.rank, row.visitor.name, row.visitor.engagement_score, row.tier, row.time_in_home
        );
    }

    Ok(())
}
