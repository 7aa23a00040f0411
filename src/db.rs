use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use open_house_engagement::demo;
use open_house_engagement::events::{EventKind, SignalKind};
use open_house_engagement::import;
use open_house_engagement::leaderboard::minutes_between;
use open_house_engagement::models::{InteractionEvent, Signal, VisitorSummary};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool, property_id: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
    let visitors = demo::sample_visitors(now);

    for visitor in &visitors {
        sqlx::query(
            r#"
            INSERT INTO open_house.visitors
            (id, property_id, full_name, email, checked_in_at, engagement_score,
             features_found, referrals_sent, time_in_home_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (property_id, id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                engagement_score = EXCLUDED.engagement_score,
                features_found = EXCLUDED.features_found,
                referrals_sent = EXCLUDED.referrals_sent,
                time_in_home_minutes = EXCLUDED.time_in_home_minutes
            "#,
        )
        .bind(&visitor.id)
        .bind(property_id)
        .bind(&visitor.name)
        .bind(&visitor.email)
        .bind(visitor.checked_in_at)
        .bind(visitor.engagement_score as i32)
        .bind(visitor.features_found as i32)
        .bind(visitor.referrals_sent as i32)
        .bind(visitor.time_in_home_minutes as i32)
        .execute(pool)
        .await?;
    }

    let interactions = [
        ("demo-1", EventKind::CheckIn, 47),
        ("demo-1", EventKind::Favorite, 30),
        ("demo-1", EventKind::TourRequest, 12),
        ("demo-2", EventKind::CheckIn, 32),
        ("demo-2", EventKind::Inquiry, 10),
        ("demo-3", EventKind::CheckIn, 24),
        ("demo-3", EventKind::View, 20),
    ];

    for (visitor_id, kind, minutes_ago) in interactions {
        let event = InteractionEvent {
            visitor_id: visitor_id.to_string(),
            property_id: property_id.to_string(),
            kind,
            detail: None,
            metadata: None,
            occurred_at: now - Duration::minutes(minutes_ago),
        };
        insert_interaction(pool, &event).await?;
    }

    for (index, signal) in demo::sample_signals(now).iter().enumerate() {
        let source_key = format!("seed-{property_id}-{:03}", index + 1);
        sqlx::query(
            r#"
            INSERT INTO open_house.signals
            (id, property_id, signal_type, actor_name, detail, occurred_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(property_id)
        .bind(signal.kind.as_str())
        .bind(&signal.actor_name)
        .bind(&signal.detail)
        .bind(signal.timestamp)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    info!(property_id, visitors = visitors.len(), "seeded demo property");
    Ok(())
}

/// Stores a validated interaction with its point value.
pub async fn insert_interaction(pool: &PgPool, event: &InteractionEvent) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO open_house.interactions
        (id, visitor_id, property_id, event_type, points, detail, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(&event.visitor_id)
    .bind(&event.property_id)
    .bind(event.kind.as_str())
    .bind(event.points() as i32)
    .bind(event.detail.as_deref())
    .bind(event.metadata.clone())
    .bind(event.occurred_at)
    .execute(pool)
    .await
    .context("failed to record interaction")?;

    Ok(id)
}

pub async fn fetch_interactions(
    pool: &PgPool,
    visitor_id: &str,
    property_id: &str,
) -> anyhow::Result<Vec<InteractionEvent>> {
    let rows = sqlx::query(
        "SELECT visitor_id, property_id, event_type, detail, metadata, created_at \
         FROM open_house.interactions \
         WHERE visitor_id = $1 AND property_id = $2 \
         ORDER BY created_at DESC",
    )
    .bind(visitor_id)
    .bind(property_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch interactions")?;

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        let event_type: String = row.try_get("event_type")?;
        events.push(InteractionEvent {
            visitor_id: row.try_get("visitor_id")?,
            property_id: row.try_get("property_id")?,
            kind: event_type.parse()?,
            detail: row.try_get("detail")?,
            metadata: row.try_get("metadata")?,
            occurred_at: row.try_get("created_at")?,
        });
    }

    Ok(events)
}

/// Visitors for a property in check-in order. A visitor with no reported time
/// in home is credited with the minutes since check-in.
pub async fn fetch_visitors(
    pool: &PgPool,
    property_id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<VisitorSummary>> {
    let rows = sqlx::query(
        "SELECT id, full_name, email, checked_in_at, engagement_score, \
         features_found, referrals_sent, time_in_home_minutes \
         FROM open_house.visitors \
         WHERE property_id = $1 \
         ORDER BY checked_in_at ASC, id ASC",
    )
    .bind(property_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch visitors")?;

    let mut visitors = Vec::with_capacity(rows.len());
    for row in rows {
        let checked_in_at: DateTime<Utc> = row.try_get("checked_in_at")?;
        visitors.push(VisitorSummary {
            id: row.try_get("id")?,
            name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            checked_in_at,
            engagement_score: non_negative(row.try_get("engagement_score")?),
            features_found: non_negative(row.try_get("features_found")?),
            referrals_sent: non_negative(row.try_get("referrals_sent")?),
            time_in_home_minutes: time_in_home(
                row.try_get("time_in_home_minutes")?,
                checked_in_at,
                now,
            ),
        });
    }

    Ok(visitors)
}

pub async fn insert_signal(pool: &PgPool, property_id: &str, signal: &Signal) -> anyhow::Result<()> {
    let id = signal_uuid(&signal.id)?;
    sqlx::query(
        r#"
        INSERT INTO open_house.signals
        (id, property_id, signal_type, actor_name, detail, occurred_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(property_id)
    .bind(signal.kind.as_str())
    .bind(&signal.actor_name)
    .bind(&signal.detail)
    .bind(signal.timestamp)
    .execute(pool)
    .await
    .context("failed to record signal")?;
    Ok(())
}

pub async fn fetch_signals(
    pool: &PgPool,
    property_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Signal>> {
    let rows = sqlx::query(
        "SELECT id, signal_type, actor_name, detail, occurred_at \
         FROM open_house.signals \
         WHERE property_id = $1 \
         ORDER BY occurred_at DESC \
         LIMIT $2",
    )
    .bind(property_id)
    .bind(limit.max(1))
    .fetch_all(pool)
    .await
    .context("failed to fetch signals")?;

    let mut signals = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.try_get("id")?;
        let signal_type: String = row.try_get("signal_type")?;
        signals.push(Signal {
            id: id.to_string(),
            kind: signal_type.parse::<SignalKind>()?,
            actor_name: row.try_get("actor_name")?,
            detail: row.try_get("detail")?,
            timestamp: row.try_get("occurred_at")?,
        });
    }

    Ok(signals)
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: usize,
}

/// Imports interaction events from CSV. Rows that fail to parse or validate
/// are logged and skipped.
pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    now: DateTime<Utc>,
) -> anyhow::Result<ImportSummary> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let batch = import::read_events(file, now);

    for rejected in &batch.rejected {
        warn!(line = rejected.line, reason = %rejected.reason, "skipping invalid row");
    }
    for event in &batch.events {
        insert_interaction(pool, event).await?;
    }

    Ok(ImportSummary {
        inserted: batch.events.len(),
        rejected: batch.rejected.len(),
    })
}

fn non_negative(value: i32) -> u32 {
    value.max(0) as u32
}

fn signal_uuid(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("signal id '{id}' is not a UUID"))
}

fn time_in_home(reported: Option<i32>, checked_in_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    match reported {
        Some(minutes) => non_negative(minutes),
        None => minutes_between(checked_in_at, now),
    }
}
